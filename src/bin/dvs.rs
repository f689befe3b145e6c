//! dvs CLI - Command-line interface for Session DVs
//!
//! Commands:
//! - compute: Aggregate one session context into a persisted DV payload
//! - validate: Report missing preconditions and data-quality issues
//! - doctor: Diagnose engine configuration and state files

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use session_dvs::schema::{parse_context, validate_context, ContextIssue};
use session_dvs::{
    AggregationOutcome, ComputeError, DvProcessor, EngineConfig, MemorySink, NdjsonFileSink,
    PersistenceSink, ENGINE_VERSION, PRODUCER_NAME,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// dvs - Session dependent-variable aggregation for decision-making studies
#[derive(Parser)]
#[command(name = "dvs")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Aggregate session telemetry into dependent variables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a session context into a DV payload
    Compute {
        /// Session context JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Engine configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// One-shot state file; loaded before and saved after the run
        #[arg(long)]
        state: Option<PathBuf>,

        /// Append the payload to this NDJSON file
        #[arg(long)]
        sink: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a session context
    Validate {
        /// Session context JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose engine configuration and state files
    Doctor {
        /// Check a one-shot state file
        #[arg(long)]
        state: Option<PathBuf>,

        /// Check an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(atty::is(atty::Stream::Stderr)),
        )
        .init();
}

fn run(cli: Cli) -> Result<(), DvsCliError> {
    match cli.command {
        Commands::Compute {
            input,
            output,
            config,
            state,
            sink,
            pretty,
        } => cmd_compute(
            &input,
            &output,
            config.as_deref(),
            state.as_deref(),
            sink.as_deref(),
            pretty,
        ),
        Commands::Validate { input, json } => cmd_validate(&input, json),
        Commands::Doctor {
            state,
            config,
            json,
        } => cmd_doctor(state.as_deref(), config.as_deref(), json),
    }
}

fn read_input(input: &Path) -> Result<String, DvsCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), DvsCliError> {
    if output.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn cmd_compute(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    state: Option<&Path>,
    sink: Option<&Path>,
    pretty: bool,
) -> Result<(), DvsCliError> {
    let ctx = parse_context(&read_input(input)?)?;

    let config = match config {
        Some(path) => EngineConfig::from_json(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };

    let sink: Box<dyn PersistenceSink> = match sink {
        Some(path) => Box::new(NdjsonFileSink::new(path)),
        None => Box::new(MemorySink::new()),
    };
    let mut processor = DvProcessor::with_config(sink, config);

    // A missing state file just means nothing was computed yet
    if let Some(state_path) = state {
        if state_path.exists() {
            processor.load_state(&fs::read_to_string(state_path)?)?;
        }
    }

    let outcome = processor.process(&ctx);

    if let Some(state_path) = state {
        fs::write(state_path, processor.save_state()?)?;
    }

    // Aborted and skipped runs still succeed so the calling flow can proceed
    let data = match &outcome {
        AggregationOutcome::Computed { payload, .. } => {
            if pretty {
                serde_json::to_string_pretty(payload)?
            } else {
                serde_json::to_string(payload)?
            }
        }
        AggregationOutcome::AlreadyComputed => serde_json::to_string(&StatusReport {
            session_id: ctx.session_id.clone(),
            status: "already_computed".to_string(),
            reason: None,
        })?,
        AggregationOutcome::Aborted { reason } => serde_json::to_string(&StatusReport {
            session_id: ctx.session_id.clone(),
            status: "aborted".to_string(),
            reason: Some(reason.clone()),
        })?,
    };

    write_output(output, &data)
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), DvsCliError> {
    let ctx = parse_context(&read_input(input)?)?;
    let issues = validate_context(&ctx);

    let report = ValidationReport {
        session_id: ctx.session_id.clone(),
        total_events: ctx.events.len(),
        scenarios: ctx.simulation_outcomes.len(),
        fatal: issues.iter().filter(|i| i.is_fatal()).count(),
        issues: issues.iter().map(ContextIssue::to_string).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Session:      {}", report.session_id);
        println!("Total events: {}", report.total_events);
        println!("Scenarios:    {}", report.scenarios);
        println!("Issues:       {}", report.issues.len());

        if !report.issues.is_empty() {
            println!("\nIssues:");
            for issue in &report.issues {
                println!("  - {}", issue);
            }
        }
    }

    if report.fatal > 0 {
        Err(DvsCliError::ValidationFailed(report.fatal))
    } else {
        Ok(())
    }
}

fn cmd_doctor(state: Option<&Path>, config: Option<&Path>, json: bool) -> Result<(), DvsCliError> {
    let mut checks: Vec<DoctorCheck> = vec![DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} version {}", PRODUCER_NAME, ENGINE_VERSION),
    }];

    if let Some(state_path) = state {
        let check = if !state_path.exists() {
            DoctorCheck {
                name: "state".to_string(),
                status: CheckStatus::Warning,
                message: "State file does not exist (no sessions computed yet)".to_string(),
            }
        } else {
            match fs::read_to_string(state_path) {
                Ok(content) => match session_dvs::ComputedSessions::from_json(&content) {
                    Ok(sessions) => DoctorCheck {
                        name: "state".to_string(),
                        status: CheckStatus::Ok,
                        message: format!("State file valid ({} sessions computed)", sessions.len()),
                    },
                    Err(e) => DoctorCheck {
                        name: "state".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid state JSON: {}", e),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "state".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read state file: {}", e),
                },
            }
        };
        checks.push(check);
    }

    if let Some(config_path) = config {
        let check = match fs::read_to_string(config_path) {
            Ok(content) => match EngineConfig::from_json(&content) {
                Ok(config) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config valid (fallback {}s, lives cap {}, casualties cap {})",
                        config.fallback_decision_time_sec,
                        config.lives_saved_cap,
                        config.human_casualties_cap
                    ),
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read config file: {}", e),
            },
        };
        checks.push(check);
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (ready for `compute -i -`)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("dvs Doctor Report");
        println!("=================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(DvsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum DvsCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for DvsCliError {
    fn from(e: io::Error) -> Self {
        DvsCliError::Io(e)
    }
}

impl From<ComputeError> for DvsCliError {
    fn from(e: ComputeError) -> Self {
        DvsCliError::Compute(e)
    }
}

impl From<serde_json::Error> for DvsCliError {
    fn from(e: serde_json::Error) -> Self {
        DvsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<DvsCliError> for CliError {
    fn from(e: DvsCliError) -> Self {
        match e {
            DvsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            DvsCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'dvs validate' on the session context".to_string()),
            },
            DvsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            DvsCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} fatal issues found", count),
                hint: Some("Metrics cannot be computed until these are fixed".to_string()),
            },
            DvsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct StatusReport {
    session_id: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(serde::Serialize)]
struct ValidationReport {
    session_id: String,
    total_events: usize,
    scenarios: usize,
    fatal: usize,
    issues: Vec<String>,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
