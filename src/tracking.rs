//! Scenario tracking reconciliation
//!
//! Merges the incrementally maintained tracking record with counts recomputed
//! from the event log. A tracked value wins when it is non-zero (or `true`);
//! otherwise the recomputed value is used.

use crate::classifier::ScenarioEventCounts;
use crate::types::{ScenarioId, ScenarioTrackingRecord};
use std::collections::HashMap;

/// Tracking records indexed by scenario id
#[derive(Debug, Default)]
pub struct TrackingIndex<'a> {
    by_scenario: HashMap<ScenarioId, &'a ScenarioTrackingRecord>,
}

impl<'a> TrackingIndex<'a> {
    /// Index records by scenario id; the first record for an id is kept
    pub fn new(records: &'a [ScenarioTrackingRecord]) -> Self {
        let mut by_scenario = HashMap::with_capacity(records.len());
        for record in records {
            by_scenario.entry(record.scenario_id).or_insert(record);
        }
        Self { by_scenario }
    }

    pub fn get(&self, scenario_id: ScenarioId) -> Option<&'a ScenarioTrackingRecord> {
        self.by_scenario.get(&scenario_id).copied()
    }
}

/// Counter and flag fields after reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciledCounters {
    pub switches: u32,
    pub cvr_visited: bool,
    pub cvr_visit_count: u32,
    pub cvr_yes_answers: u32,
    pub apa_reordered: bool,
    pub apa_reorder_count: u32,
}

/// Reconcile one scenario's tracked counters with the event log
pub fn reconcile(
    tracked: Option<&ScenarioTrackingRecord>,
    observed: &ScenarioEventCounts,
) -> ReconciledCounters {
    let recomputed = recompute(observed);

    let Some(tracked) = tracked else {
        return recomputed;
    };

    ReconciledCounters {
        switches: prefer_count(tracked.switch_count, recomputed.switches),
        cvr_visited: tracked.cvr_visited || recomputed.cvr_visited,
        cvr_visit_count: prefer_count(tracked.cvr_visit_count, recomputed.cvr_visit_count),
        cvr_yes_answers: prefer_count(tracked.cvr_yes_answers, recomputed.cvr_yes_answers),
        apa_reordered: tracked.apa_reordered || recomputed.apa_reordered,
        apa_reorder_count: prefer_count(tracked.apa_reorder_count, recomputed.apa_reorder_count),
    }
}

/// Counters derived purely from the event log
fn recompute(observed: &ScenarioEventCounts) -> ReconciledCounters {
    ReconciledCounters {
        switches: recomputed_switches(observed.option_selected),
        cvr_visited: observed.cvr_opened > 0,
        cvr_visit_count: observed.cvr_opened,
        cvr_yes_answers: observed.cvr_yes,
        apa_reordered: observed.apa_reordered > 0,
        apa_reorder_count: observed.apa_reordered,
    }
}

/// The first selection sets the initial choice; every later one is a switch
pub fn recomputed_switches(selections: u32) -> u32 {
    selections.saturating_sub(1)
}

fn prefer_count(tracked: u32, recomputed: u32) -> u32 {
    if tracked > 0 {
        tracked
    } else {
        recomputed
    }
}
