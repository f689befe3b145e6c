//! Value alignment of final decisions
//!
//! A scenario's decision is aligned when its label belongs to the reference
//! value set for that scenario and the participant never answered "yes" to a
//! CVR prompt in it.

use crate::types::ScenarioId;
use crate::values::{ResolvedValues, ValueSet};

/// Which value set a scenario is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceList {
    MatchedStable,
    MoralReorder,
}

impl ReferenceList {
    /// Scenario 1 uses the baseline set; scenarios 2 and 3 the reorder set
    pub fn for_scenario(scenario_id: ScenarioId) -> Option<Self> {
        match scenario_id {
            1 => Some(ReferenceList::MatchedStable),
            2 | 3 => Some(ReferenceList::MoralReorder),
            _ => None,
        }
    }

    fn select(self, values: &ResolvedValues) -> &ValueSet {
        match self {
            ReferenceList::MatchedStable => &values.matched_stable,
            ReferenceList::MoralReorder => &values.moral_reorder,
        }
    }
}

/// Whether the decision label is in the scenario's reference set
pub fn label_in_reference(scenario_id: ScenarioId, label: &str, values: &ResolvedValues) -> bool {
    ReferenceList::for_scenario(scenario_id)
        .map(|list| list.select(values).contains(label))
        .unwrap_or(false)
}

/// Alignment for one scenario outcome
pub fn is_aligned(
    scenario_id: ScenarioId,
    label: &str,
    values: &ResolvedValues,
    cvr_yes_events: u32,
) -> bool {
    label_in_reference(scenario_id, label, values) && cvr_yes_events == 0
}

/// Share of aligned scenarios, 0 when there are none
pub fn value_consistency_index(alignment: &[bool]) -> f64 {
    if alignment.is_empty() {
        return 0.0;
    }
    alignment.iter().filter(|&&a| a).count() as f64 / alignment.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::ValueListResolver;
    use serde_json::json;

    fn values() -> ResolvedValues {
        let baseline = vec![json!("Safety"), json!({ "name": "Fairness" })];
        let reorder = json!(r#"["Care", "Loyalty"]"#);
        ValueListResolver::resolve(&baseline, Some(&reorder))
    }

    #[test]
    fn test_reference_list_by_scenario() {
        assert_eq!(ReferenceList::for_scenario(1), Some(ReferenceList::MatchedStable));
        assert_eq!(ReferenceList::for_scenario(2), Some(ReferenceList::MoralReorder));
        assert_eq!(ReferenceList::for_scenario(3), Some(ReferenceList::MoralReorder));
        assert_eq!(ReferenceList::for_scenario(0), None);
        assert_eq!(ReferenceList::for_scenario(4), None);
    }

    #[test]
    fn test_scenario_one_uses_baseline() {
        let values = values();
        assert!(is_aligned(1, "SAFETY", &values, 0));
        assert!(!is_aligned(1, "Care", &values, 0));
    }

    #[test]
    fn test_scenarios_two_and_three_use_reorder_list() {
        let values = values();
        assert!(is_aligned(2, "care", &values, 0));
        assert!(is_aligned(3, "Loyalty", &values, 0));
        assert!(!is_aligned(2, "Safety", &values, 0));
    }

    #[test]
    fn test_cvr_yes_breaks_alignment() {
        let values = values();
        assert!(label_in_reference(1, "Safety", &values));
        assert!(!is_aligned(1, "Safety", &values, 1));
    }

    #[test]
    fn test_unknown_scenario_never_aligned() {
        let values = values();
        assert!(!is_aligned(7, "Safety", &values, 0));
    }

    #[test]
    fn test_value_consistency_index() {
        assert_eq!(value_consistency_index(&[]), 0.0);
        assert_eq!(value_consistency_index(&[true, true, true]), 1.0);
        assert!((value_consistency_index(&[true, false, false]) - 1.0 / 3.0).abs() < 1e-12);
    }
}
