//! Decision timing
//!
//! Elapsed decision time per scenario, with a session-wide fallback when no
//! scenario carries usable start/end timestamps.

use crate::types::ScenarioTrackingRecord;
use tracing::debug;

/// Per-session decision timing
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTiming {
    /// Decision time for each outcome, in outcome order
    pub per_scenario: Vec<Option<f64>>,
    /// Recorded decision times in outcome order (untimed scenarios omitted)
    pub decision_times: Vec<f64>,
    /// Mean of `decision_times`, 0 when empty
    pub average: f64,
    /// Whether the session-wide fallback was applied
    pub fallback_applied: bool,
}

/// Elapsed seconds between a record's start and end, when both are present
pub fn elapsed_seconds(record: &ScenarioTrackingRecord) -> Option<f64> {
    match (record.start_time, record.end_time) {
        (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
        _ => None,
    }
}

/// Calculator for per-scenario decision times
pub struct DecisionTimingCalculator;

impl DecisionTimingCalculator {
    /// Compute timing from per-outcome elapsed times.
    ///
    /// Partial timing is used as-is. Only when no outcome has a usable timing
    /// does every outcome receive `fallback_sec`.
    pub fn compute(elapsed: &[Option<f64>], fallback_sec: f64) -> DecisionTiming {
        let timed = elapsed.iter().filter(|t| t.is_some()).count();

        if timed == 0 && !elapsed.is_empty() {
            debug!(
                scenarios = elapsed.len(),
                fallback_sec, "no scenario timing recorded, using fallback decision time"
            );
            let decision_times = vec![fallback_sec; elapsed.len()];
            return DecisionTiming {
                per_scenario: vec![Some(fallback_sec); elapsed.len()],
                average: mean(&decision_times),
                decision_times,
                fallback_applied: true,
            };
        }

        let decision_times: Vec<f64> = elapsed.iter().flatten().copied().collect();
        DecisionTiming {
            per_scenario: elapsed.to_vec(),
            average: mean(&decision_times),
            decision_times,
            fallback_applied: false,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_elapsed_seconds_from_record() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap();
        let record = ScenarioTrackingRecord {
            scenario_id: 1,
            start_time: Some(start),
            end_time: Some(start + Duration::milliseconds(42_500)),
            ..Default::default()
        };
        assert_eq!(elapsed_seconds(&record), Some(42.5));
    }

    #[test]
    fn test_elapsed_requires_both_timestamps() {
        let record = ScenarioTrackingRecord {
            scenario_id: 1,
            start_time: Some(Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()),
            ..Default::default()
        };
        assert_eq!(elapsed_seconds(&record), None);
    }

    #[test]
    fn test_fallback_when_nothing_timed() {
        let timing = DecisionTimingCalculator::compute(&[None, None, None], 75.0);

        assert!(timing.fallback_applied);
        assert_eq!(timing.decision_times, vec![75.0, 75.0, 75.0]);
        assert_eq!(timing.per_scenario, vec![Some(75.0); 3]);
        assert_eq!(timing.average, 75.0);
    }

    #[test]
    fn test_partial_timing_does_not_fall_back() {
        let timing = DecisionTimingCalculator::compute(&[Some(30.0), None], 75.0);

        assert!(!timing.fallback_applied);
        assert_eq!(timing.decision_times, vec![30.0]);
        assert_eq!(timing.per_scenario, vec![Some(30.0), None]);
        assert_eq!(timing.average, 30.0);
    }

    #[test]
    fn test_average_over_all_timed() {
        let timing = DecisionTimingCalculator::compute(&[Some(10.0), Some(20.0), Some(60.0)], 75.0);
        assert_eq!(timing.average, 30.0);
    }

    #[test]
    fn test_empty_outcomes_average_zero() {
        let timing = DecisionTimingCalculator::compute(&[], 75.0);
        assert!(!timing.fallback_applied);
        assert!(timing.decision_times.is_empty());
        assert_eq!(timing.average, 0.0);
    }
}
