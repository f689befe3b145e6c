//! Event log classification
//!
//! Partitions the flat event log into typed views by kind. Each view keeps the
//! original log order and can be narrowed to a single scenario.

use crate::schema::{ConfirmationFlags, EventPayload, TelemetryEvent};
use crate::types::{ScenarioId, ValueOrderTrajectory};

/// Typed views over a session's event log
#[derive(Debug, Default)]
pub struct ClassifiedEvents<'a> {
    pub cvr_opened: Vec<&'a TelemetryEvent>,
    pub cvr_answered_yes: Vec<&'a TelemetryEvent>,
    pub cvr_answered_no: Vec<&'a TelemetryEvent>,
    pub apa_reordered: Vec<&'a TelemetryEvent>,
    pub option_selected: Vec<&'a TelemetryEvent>,
    pub option_confirmed: Vec<&'a TelemetryEvent>,
}

/// Event counts for one scenario, recomputed from the log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioEventCounts {
    pub cvr_opened: u32,
    pub cvr_yes: u32,
    pub cvr_no: u32,
    pub apa_reordered: u32,
    pub option_selected: u32,
    pub option_confirmed: u32,
}

impl<'a> ClassifiedEvents<'a> {
    /// Partition the log by event kind
    pub fn classify(events: &'a [TelemetryEvent]) -> Self {
        let mut classified = Self::default();

        for event in events {
            match &event.payload {
                EventPayload::CvrOpened => classified.cvr_opened.push(event),
                EventPayload::CvrAnswered {
                    cvr_answer: Some(true),
                } => classified.cvr_answered_yes.push(event),
                EventPayload::CvrAnswered {
                    cvr_answer: Some(false),
                } => classified.cvr_answered_no.push(event),
                // An answer event without an answer counts toward neither side
                EventPayload::CvrAnswered { cvr_answer: None } => {}
                EventPayload::ApaReordered { .. } => classified.apa_reordered.push(event),
                EventPayload::OptionSelected => classified.option_selected.push(event),
                EventPayload::OptionConfirmed { .. } => classified.option_confirmed.push(event),
                EventPayload::Other => {}
            }
        }

        classified
    }

    /// Recompute the per-scenario event counts
    pub fn counts_for(&self, scenario_id: ScenarioId) -> ScenarioEventCounts {
        ScenarioEventCounts {
            cvr_opened: count_for(&self.cvr_opened, scenario_id),
            cvr_yes: count_for(&self.cvr_answered_yes, scenario_id),
            cvr_no: count_for(&self.cvr_answered_no, scenario_id),
            apa_reordered: count_for(&self.apa_reordered, scenario_id),
            option_selected: count_for(&self.option_selected, scenario_id),
            option_confirmed: count_for(&self.option_confirmed, scenario_id),
        }
    }

    /// Flags of the first confirmation logged for a scenario
    pub fn first_confirmation(&self, scenario_id: ScenarioId) -> Option<ConfirmationFlags> {
        self.option_confirmed
            .iter()
            .find(|e| e.is_for(scenario_id))
            .and_then(|e| match &e.payload {
                EventPayload::OptionConfirmed {
                    flags_at_confirmation,
                } => Some(*flags_at_confirmation),
                _ => None,
            })
    }

    /// One trajectory per APA reorder event, in log order
    pub fn value_order_trajectories(&self) -> Vec<ValueOrderTrajectory> {
        self.apa_reordered
            .iter()
            .filter_map(|e| match &e.payload {
                EventPayload::ApaReordered {
                    values_after,
                    preference_type,
                } => Some(ValueOrderTrajectory {
                    scenario_id: e.scenario_id,
                    values: values_after.clone(),
                    preference_type: preference_type.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Total CVR arrivals across the session
    pub fn cvr_arrivals(&self) -> u32 {
        self.cvr_opened.len() as u32
    }

    pub fn cvr_yes_total(&self) -> u32 {
        self.cvr_answered_yes.len() as u32
    }

    pub fn cvr_no_total(&self) -> u32 {
        self.cvr_answered_no.len() as u32
    }

    pub fn apa_reorder_total(&self) -> u32 {
        self.apa_reordered.len() as u32
    }
}

fn count_for(view: &[&TelemetryEvent], scenario_id: ScenarioId) -> u32 {
    view.iter().filter(|e| e.is_for(scenario_id)).count() as u32
}
