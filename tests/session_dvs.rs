use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use session_dvs::{
    aggregate, parse_context, AggregationOutcome, DvProcessor, EngineConfig, MemorySink,
    SessionContext,
};

const PERFECT_METRICS: &str = r#"{
    "livesSaved": 20000, "humanCasualties": 0, "firefightingResource": 100,
    "infrastructureCondition": 100, "biodiversityCondition": 100,
    "propertiesCondition": 100, "nuclearPowerStation": 100
}"#;

fn context(value: Value) -> SessionContext {
    parse_context(&value.to_string()).unwrap()
}

fn perfect_metrics() -> Value {
    serde_json::from_str(PERFECT_METRICS).unwrap()
}

fn three_scenario_session() -> Value {
    json!({
        "sessionId": "quiet-session",
        "events": [
            { "kind": "option_selected", "scenarioId": 1 },
            { "kind": "option_confirmed", "scenarioId": 1 },
            { "kind": "option_selected", "scenarioId": 2 },
            { "kind": "option_confirmed", "scenarioId": 2 },
            { "kind": "option_selected", "scenarioId": 3 },
            { "kind": "option_confirmed", "scenarioId": 3 }
        ],
        "simulationOutcomes": [
            { "scenarioId": 1, "decision": { "label": "Safety" } },
            { "scenarioId": 2, "decision": { "label": "Care" } },
            { "scenarioId": 3, "decision": { "label": "Fairness" } }
        ],
        "simulationMetrics": perfect_metrics(),
        "matchedStableValues": [{ "name": "Safety" }],
        "moralValuesReorderList": ["Care", { "id": "Fairness" }]
    })
}

#[test]
fn quiet_session_is_fully_consistent() {
    let ctx = context(three_scenario_session());
    let mut processor = DvProcessor::new(MemorySink::new());

    let outcome = processor.process(&ctx);
    let dvs = outcome.dvs().unwrap();

    assert_eq!(dvs.cvr_arrivals, 0);
    assert_eq!(dvs.apa_reorderings, 0);
    assert_eq!(dvs.value_consistency_index, 1.0);
    assert_eq!(dvs.misalign_after_cvr_apa_count, 0);
    assert_eq!(dvs.realign_after_cvr_apa_count, 0);
    assert_eq!(dvs.final_alignment_by_scenario, vec![true, true, true]);

    // No tracking at all: every scenario takes the fallback
    assert_eq!(dvs.decision_times, vec![75.0, 75.0, 75.0]);
    assert_eq!(dvs.avg_decision_time, 75.0);

    assert_eq!(processor.sink().payloads().len(), 1);
}

#[test]
fn missing_snapshot_produces_no_record_but_sets_flag() {
    let mut session = three_scenario_session();
    session["simulationMetrics"] = Value::Null;
    let ctx = context(session);
    let mut processor = DvProcessor::new(MemorySink::new());

    let outcome = processor.process(&ctx);

    assert!(matches!(outcome, AggregationOutcome::Aborted { .. }));
    assert!(processor.is_computed("quiet-session"));
    assert!(processor.sink().payloads().is_empty());

    // A later attempt with the snapshot present is still skipped
    let retry = context(three_scenario_session());
    assert_eq!(processor.process(&retry), AggregationOutcome::AlreadyComputed);
    assert!(processor.sink().payloads().is_empty());
}

#[test]
fn partial_timing_does_not_trigger_fallback() {
    let ctx = context(json!({
        "sessionId": "partial",
        "scenarioTracking": [
            { "scenarioId": 1, "startTime": 1705327200000_i64, "endTime": 1705327212500_i64 },
            { "scenarioId": 2, "startTime": 1705327300000_i64 }
        ],
        "simulationOutcomes": [
            { "scenarioId": 1, "decision": { "label": "Safety" } },
            { "scenarioId": 2, "decision": { "label": "Care" } }
        ],
        "simulationMetrics": perfect_metrics()
    }));

    let dvs = aggregate(&ctx, &EngineConfig::default()).unwrap();

    assert_eq!(dvs.decision_times, vec![12.5]);
    assert_eq!(dvs.avg_decision_time, 12.5);
    assert_eq!(dvs.scenario_details[0].decision_time, Some(12.5));
    assert_eq!(dvs.scenario_details[1].decision_time, None);
}

#[test]
fn perfect_snapshot_scores_one() {
    let dvs = aggregate(&context(three_scenario_session()), &EngineConfig::default()).unwrap();

    assert_eq!(dvs.performance_composite, 1.0);
    assert_eq!(dvs.balance_index, 1.0);
}

#[test]
fn composite_stays_in_range_for_extreme_snapshots() {
    let snapshots = [
        json!({ "livesSaved": 0, "humanCasualties": 5000, "firefightingResource": 0,
                "infrastructureCondition": 0, "biodiversityCondition": 0,
                "propertiesCondition": 0, "nuclearPowerStation": 0 }),
        json!({ "livesSaved": 90000, "humanCasualties": 0, "firefightingResource": 0,
                "infrastructureCondition": 100, "biodiversityCondition": 0,
                "propertiesCondition": 100, "nuclearPowerStation": 0 }),
        json!({ "livesSaved": 20000, "humanCasualties": 1000, "firefightingResource": 50,
                "infrastructureCondition": 50, "biodiversityCondition": 50,
                "propertiesCondition": 50, "nuclearPowerStation": 50 }),
    ];

    for snapshot in snapshots {
        let mut session = three_scenario_session();
        session["simulationMetrics"] = snapshot;
        let dvs = aggregate(&context(session), &EngineConfig::default()).unwrap();

        assert!((0.0..=1.0).contains(&dvs.performance_composite));
        assert!(dvs.balance_index <= 1.0);
    }
}

#[test]
fn untracked_switches_are_selections_minus_one() {
    for selections in 0..6_u32 {
        let events: Vec<Value> = (0..selections)
            .map(|_| json!({ "kind": "option_selected", "scenarioId": 1 }))
            .collect();
        let ctx = context(json!({
            "sessionId": format!("switches-{}", selections),
            "events": events,
            "simulationOutcomes": [{ "scenarioId": 1, "decision": { "label": "Safety" } }],
            "simulationMetrics": perfect_metrics()
        }));

        let dvs = aggregate(&ctx, &EngineConfig::default()).unwrap();
        assert_eq!(dvs.switch_count_total, selections.saturating_sub(1));
    }
}

#[test]
fn alignment_conjuncts_falsify_independently() {
    let ctx = context(json!({
        "sessionId": "conjuncts",
        "events": [
            { "kind": "cvr_opened", "scenarioId": 1 },
            { "kind": "cvr_answered", "scenarioId": 1, "cvrAnswer": true }
        ],
        "simulationOutcomes": [
            // In the baseline set but answered yes on the CVR
            { "scenarioId": 1, "decision": { "label": "Safety" } },
            // Baseline value, but scenario 2 checks the reorder set
            { "scenarioId": 2, "decision": { "label": "Safety" } },
            { "scenarioId": 3, "decision": { "label": "Care" } },
            // Outside the three tracked scenarios
            { "scenarioId": 4, "decision": { "label": "Care" } }
        ],
        "simulationMetrics": perfect_metrics(),
        "matchedStableValues": ["Safety"],
        "moralValuesReorderList": "[\"Care\"]"
    }));

    let dvs = aggregate(&ctx, &EngineConfig::default()).unwrap();

    assert_eq!(
        dvs.final_alignment_by_scenario,
        vec![false, false, true, false]
    );
    assert_eq!(dvs.value_consistency_index, 0.25);
    assert_eq!(dvs.misalign_after_cvr_apa_count, 3);
    assert_eq!(dvs.cvr_yes_count, 1);
}

#[test]
fn payload_carries_passthrough_context() {
    let mut session = three_scenario_session();
    session["alignmentChecklist"] = json!({ "1": true });
    session["scenarioReorderedValues"] = json!({ "scenario2": ["Care", "Safety"] });

    let mut processor = DvProcessor::new(MemorySink::new());
    processor.process(&context(session));

    let payloads = processor.into_sink().into_payloads();
    let record = serde_json::to_value(&payloads[0]).unwrap();

    assert_eq!(record["sessionId"], "quiet-session");
    assert_eq!(record["alignmentChecklist"], json!({ "1": true }));
    assert_eq!(
        record["scenarioReorderedValues"]["scenario2"],
        json!(["Care", "Safety"])
    );
    assert_eq!(record["decisionLabels"], json!(["Safety", "Care", "Fairness"]));
    assert_eq!(record["valueConsistencyIndex"], 1.0);
}

#[test]
fn rfc3339_timestamps_still_produce_metrics() {
    let ctx = context(json!({
        "sessionId": "iso-times",
        "events": [
            { "kind": "cvr_opened", "scenarioId": 1, "timestamp": "2024-01-15T14:00:00Z" },
            { "kind": "option_selected", "scenarioId": 1, "timestamp": 1705327200000.5 }
        ],
        "scenarioTracking": [
            { "scenarioId": 1, "startTime": "2024-01-15T14:00:00Z",
              "endTime": "2024-01-15T14:00:42Z" }
        ],
        "simulationOutcomes": [{ "scenarioId": 1, "decision": { "label": "Safety" } }],
        "simulationMetrics": perfect_metrics(),
        "matchedStableValues": ["Safety"]
    }));

    let dvs = aggregate(&ctx, &EngineConfig::default()).unwrap();

    assert_eq!(dvs.cvr_arrivals, 1);
    assert_eq!(dvs.decision_times, vec![42.0]);
    assert_eq!(dvs.final_alignment_by_scenario, vec![true]);
}

#[test]
fn tracked_yes_answers_do_not_break_alignment() {
    let ctx = context(json!({
        "sessionId": "tracked-yes",
        "scenarioTracking": [{ "scenarioId": 1, "cvrYesAnswers": 2 }],
        "simulationOutcomes": [{ "scenarioId": 1, "decision": { "label": "Safety" } }],
        "simulationMetrics": perfect_metrics(),
        "matchedStableValues": ["Safety"]
    }));

    let dvs = aggregate(&ctx, &EngineConfig::default()).unwrap();

    // The detail reports the tracked count, alignment reads the event log
    assert_eq!(dvs.scenario_details[0].cvr_yes_answers, 2);
    assert!(dvs.scenario_details[0].aligned);
    assert_eq!(dvs.cvr_yes_count, 0);
}
