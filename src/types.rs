//! Core data types for session DV aggregation
//!
//! Inputs the engine reads (tracking snapshots, scenario outcomes, simulation
//! metrics) and the `SessionDVs` record it produces. Telemetry events and the
//! session context wrapper live in `schema`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scenario identifier as assigned by the simulation
pub type ScenarioId = u32;

/// Per-scenario counters maintained incrementally while the participant plays.
///
/// Absent timestamps mean timing is unavailable for the scenario. Zero/false
/// counters are treated as "not tracked" and recomputed from the event log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioTrackingRecord {
    pub scenario_id: ScenarioId,
    /// Scenario start (epoch milliseconds on the wire)
    #[serde(
        default,
        with = "crate::schema::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<DateTime<Utc>>,
    /// Decision confirmation (epoch milliseconds on the wire)
    #[serde(
        default,
        with = "crate::schema::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub switch_count: u32,
    #[serde(default)]
    pub cvr_visited: bool,
    #[serde(default)]
    pub cvr_visit_count: u32,
    #[serde(default)]
    pub cvr_yes_answers: u32,
    #[serde(default)]
    pub apa_reordered: bool,
    #[serde(default)]
    pub apa_reorder_count: u32,
}

/// Final decision taken in a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Outcome of a single scenario as reported by the simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOutcome {
    pub scenario_id: ScenarioId,
    pub decision: Decision,
}

/// Physical outcome metrics at the end of the simulation.
///
/// `lives_saved` and `human_casualties` are unbounded counts; the other five
/// are conventionally on a 0-100 scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationMetricsSnapshot {
    pub lives_saved: f64,
    pub human_casualties: f64,
    pub firefighting_resource: f64,
    pub infrastructure_condition: f64,
    pub biodiversity_condition: f64,
    pub properties_condition: f64,
    pub nuclear_power_station: f64,
}

/// Value order recorded by one APA reorder interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueOrderTrajectory {
    pub scenario_id: Option<ScenarioId>,
    pub values: Vec<String>,
    pub preference_type: String,
}

/// Reconciled per-scenario record, one per scenario outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDetail {
    pub scenario_id: ScenarioId,
    pub decision_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_title: Option<String>,
    /// Elapsed decision time in seconds; `None` when this scenario was untimed
    /// and other scenarios in the session were timed
    pub decision_time: Option<f64>,
    pub switches: u32,
    pub cvr_visited: bool,
    pub cvr_visit_count: u32,
    pub cvr_yes_answers: u32,
    pub apa_reordered: bool,
    pub apa_reorder_count: u32,
    pub aligned: bool,
}

/// Session dependent variables, produced once per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDVs {
    // Counters
    pub cvr_arrivals: u32,
    pub cvr_yes_count: u32,
    pub cvr_no_count: u32,
    pub apa_reorderings: u32,
    pub misalign_after_cvr_apa_count: u32,
    pub realign_after_cvr_apa_count: u32,
    pub switch_count_total: u32,

    // Statistics
    pub avg_decision_time: f64,
    pub value_consistency_index: f64,
    pub performance_composite: f64,
    pub balance_index: f64,

    // Collections
    pub decision_times: Vec<f64>,
    pub final_alignment_by_scenario: Vec<bool>,
    pub value_order_trajectories: Vec<ValueOrderTrajectory>,
    pub scenario_details: Vec<ScenarioDetail>,
}
