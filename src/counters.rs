//! Misalignment and realignment tallies
//!
//! The two counters are independent: a scenario can add to both, to neither,
//! or to one only. They do not partition the scenario set.

use crate::classifier::ClassifiedEvents;
use crate::types::ScenarioDetail;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentTallies {
    /// Scenarios whose final decision was not aligned
    pub misalign_after_cvr_apa: u32,
    /// Scenarios whose first confirmation carried a reordering flag
    pub realign_after_cvr_apa: u32,
}

impl AlignmentTallies {
    /// Tally scenario details in outcome order
    pub fn count(details: &[ScenarioDetail], events: &ClassifiedEvents<'_>) -> Self {
        let mut tallies = Self::default();

        for detail in details {
            let flagged = events
                .first_confirmation(detail.scenario_id)
                .map(|flags| flags.any_reordering())
                .unwrap_or(false);

            if flagged {
                tallies.realign_after_cvr_apa += 1;
            }
            if !detail.aligned {
                tallies.misalign_after_cvr_apa += 1;
            }
        }

        tallies
    }
}
