//! Session context: every externally sourced input for one aggregation run
//!
//! The context is a closed, in-memory snapshot taken when the session ends.
//! Nothing inside the engine reads ambient state; the caller builds this
//! object and passes it in.

use crate::error::ComputeError;
use crate::schema::event::{EventPayload, TelemetryEvent};
use crate::types::{ScenarioId, ScenarioOutcome, ScenarioTrackingRecord, SimulationMetricsSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Raw per-session lists copied verbatim into the persisted payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassthroughContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_labels: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_checklist: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_values: Option<Value>,
    /// Scenario-specific reordered value lists, keyed by list name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scenario_reordered_values: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infeasible_options: Option<Value>,
}

/// Explicit input for one session's aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    /// Identifier assigned by the session-management service
    pub session_id: String,
    /// Event log, in append order
    #[serde(default)]
    pub events: Vec<TelemetryEvent>,
    /// Incrementally maintained per-scenario counters
    #[serde(default)]
    pub scenario_tracking: Vec<ScenarioTrackingRecord>,
    #[serde(default)]
    pub simulation_outcomes: Vec<ScenarioOutcome>,
    #[serde(default)]
    pub simulation_metrics: Option<SimulationMetricsSnapshot>,
    /// Baseline value entries: bare identifiers or `{ "name": ... }` objects
    #[serde(default)]
    pub matched_stable_values: Vec<Value>,
    /// Moral value reorder list, usually a string-encoded JSON array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moral_values_reorder_list: Option<Value>,
    #[serde(flatten)]
    pub passthrough: PassthroughContext,
}

impl SessionContext {
    /// Create an empty context for a session
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            events: Vec::new(),
            scenario_tracking: Vec::new(),
            simulation_outcomes: Vec::new(),
            simulation_metrics: None,
            matched_stable_values: Vec::new(),
            moral_values_reorder_list: None,
            passthrough: PassthroughContext::default(),
        }
    }
}

/// Parse a session context JSON document
pub fn parse_context(json: &str) -> Result<SessionContext, ComputeError> {
    serde_json::from_str(json)
        .map_err(|e| ComputeError::ParseError(e.to_string()))
}

/// Problems found in a context that do not stop parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextIssue {
    #[error("Simulation outcome list is empty")]
    NoOutcomes,

    #[error("Simulation metrics snapshot is missing")]
    MissingMetrics,

    #[error("Scenario {0} appears more than once in simulation outcomes")]
    DuplicateOutcome(ScenarioId),

    #[error("Scenario {0} has more than one tracking record")]
    DuplicateTracking(ScenarioId),

    #[error("Event {index} ({kind}) has no scenario id")]
    EventWithoutScenario { index: usize, kind: &'static str },
}

impl ContextIssue {
    /// Whether the issue prevents metrics from being produced
    pub fn is_fatal(&self) -> bool {
        matches!(self, ContextIssue::NoOutcomes | ContextIssue::MissingMetrics)
    }
}

/// Check a context for missing preconditions and data-quality problems
pub fn validate_context(ctx: &SessionContext) -> Vec<ContextIssue> {
    let mut issues = Vec::new();

    if ctx.simulation_outcomes.is_empty() {
        issues.push(ContextIssue::NoOutcomes);
    }
    if ctx.simulation_metrics.is_none() {
        issues.push(ContextIssue::MissingMetrics);
    }

    let mut seen = HashSet::new();
    for outcome in &ctx.simulation_outcomes {
        if !seen.insert(outcome.scenario_id) {
            issues.push(ContextIssue::DuplicateOutcome(outcome.scenario_id));
        }
    }

    let mut seen = HashSet::new();
    for record in &ctx.scenario_tracking {
        if !seen.insert(record.scenario_id) {
            issues.push(ContextIssue::DuplicateTracking(record.scenario_id));
        }
    }

    for (index, event) in ctx.events.iter().enumerate() {
        if event.scenario_id.is_none() && event.payload != EventPayload::Other {
            issues.push(ContextIssue::EventWithoutScenario {
                index,
                kind: event.kind(),
            });
        }
    }

    issues
}
