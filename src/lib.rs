//! Session DVs - Dependent-variable aggregation for decision-making simulation studies
//!
//! The engine turns a closed session event log plus a handful of state
//! snapshots into one `SessionDVs` record through a deterministic pipeline:
//! value list resolution → event classification → decision timing →
//! tracking reconciliation + alignment → tallies + composite indices →
//! persistence payload.
//!
//! ## Modules
//!
//! - **Schema**: Session context and telemetry event wire format
//! - **Stages**: `values`, `classifier`, `tracking`, `timing`, `alignment`,
//!   `composite`, `counters`
//! - **Orchestration**: `pipeline` with its `sink`, `payload` and one-shot `guard`

pub mod alignment;
pub mod classifier;
pub mod composite;
pub mod config;
pub mod counters;
pub mod error;
pub mod guard;
pub mod payload;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod timing;
pub mod tracking;
pub mod types;
pub mod values;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use error::ComputeError;
pub use guard::ComputedSessions;
pub use payload::{PayloadEncoder, PersistencePayload};
pub use pipeline::{aggregate, session_to_dvs_json, AggregationOutcome, DvProcessor};
pub use schema::{parse_context, validate_context, SessionContext, TelemetryEvent};
pub use sink::{MemorySink, NdjsonFileSink, PersistenceSink};
pub use types::SessionDVs;

/// Engine version embedded in all persisted payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for persisted payloads
pub const PRODUCER_NAME: &str = "session-dvs";
