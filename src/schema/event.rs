//! Telemetry event log entries
//!
//! Events are appended by the study UI and only read here. The `kind` tag
//! selects the payload shape; unknown kinds are kept as `Other` so a newer
//! producer never breaks aggregation.

use crate::types::ScenarioId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reordering flags captured at the moment a decision was confirmed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_metrics_reordering_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moral_values_reordering_flag: Option<bool>,
}

impl ConfirmationFlags {
    /// Whether either reordering flag was raised
    pub fn any_reordering(&self) -> bool {
        self.simulation_metrics_reordering_flag == Some(true)
            || self.moral_values_reordering_flag == Some(true)
    }
}

/// Kind-specific event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    CvrOpened,
    CvrAnswered {
        #[serde(rename = "cvrAnswer", default)]
        cvr_answer: Option<bool>,
    },
    ApaReordered {
        #[serde(rename = "valuesAfter", default)]
        values_after: Vec<String>,
        #[serde(rename = "preferenceType", default)]
        preference_type: String,
    },
    OptionSelected,
    OptionConfirmed {
        #[serde(rename = "flagsAtConfirmation", default)]
        flags_at_confirmation: ConfirmationFlags,
    },
    #[serde(other)]
    Other,
}

/// One entry of the session event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    #[serde(rename = "scenarioId", default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<ScenarioId>,
    /// Event time (epoch milliseconds or RFC 3339 on the wire)
    #[serde(
        default,
        with = "crate::schema::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl TelemetryEvent {
    /// Create an event for a scenario without a timestamp
    pub fn new(scenario_id: ScenarioId, payload: EventPayload) -> Self {
        Self {
            scenario_id: Some(scenario_id),
            timestamp: None,
            payload,
        }
    }

    /// Whether the event belongs to the given scenario
    pub fn is_for(&self, scenario_id: ScenarioId) -> bool {
        self.scenario_id == Some(scenario_id)
    }

    /// Wire name of the event kind
    pub fn kind(&self) -> &'static str {
        match self.payload {
            EventPayload::CvrOpened => "cvr_opened",
            EventPayload::CvrAnswered { .. } => "cvr_answered",
            EventPayload::ApaReordered { .. } => "apa_reordered",
            EventPayload::OptionSelected => "option_selected",
            EventPayload::OptionConfirmed { .. } => "option_confirmed",
            EventPayload::Other => "other",
        }
    }
}
