//! Session aggregation orchestration
//!
//! This module provides the public API for computing session dependent
//! variables. It sequences the stages from session context to persisted
//! payload:
//!
//! Context → Value lists → Event classification → Timing → Reconciliation +
//! Alignment → Tallies + Composites → Payload → Sink

use crate::alignment::{is_aligned, value_consistency_index};
use crate::classifier::ClassifiedEvents;
use crate::composite::CompositeScores;
use crate::config::EngineConfig;
use crate::counters::AlignmentTallies;
use crate::error::ComputeError;
use crate::guard::ComputedSessions;
use crate::payload::{PayloadEncoder, PersistencePayload};
use crate::schema::{parse_context, SessionContext};
use crate::sink::PersistenceSink;
use crate::timing::{elapsed_seconds, DecisionTimingCalculator};
use crate::tracking::{reconcile, TrackingIndex};
use crate::types::{ScenarioDetail, SessionDVs};
use crate::values::ValueListResolver;
use tracing::{debug, info, warn};

/// Compute the session DVs for a context (pure, no side effects).
///
/// Fails with `MissingPrecondition` when the outcome list is empty or the
/// simulation metrics snapshot is absent.
pub fn aggregate(ctx: &SessionContext, config: &EngineConfig) -> Result<SessionDVs, ComputeError> {
    let outcomes = &ctx.simulation_outcomes;
    if outcomes.is_empty() {
        return Err(ComputeError::MissingPrecondition(
            "simulation outcome list is empty".to_string(),
        ));
    }
    let snapshot = ctx.simulation_metrics.as_ref().ok_or_else(|| {
        ComputeError::MissingPrecondition("simulation metrics snapshot is absent".to_string())
    })?;

    // Stage 1: Resolve value-preference lists
    let values =
        ValueListResolver::resolve(&ctx.matched_stable_values, ctx.moral_values_reorder_list.as_ref());

    // Stage 2: Classify the event log
    let events = ClassifiedEvents::classify(&ctx.events);

    // Stage 3: Decision timing
    let tracking = TrackingIndex::new(&ctx.scenario_tracking);
    let elapsed: Vec<Option<f64>> = outcomes
        .iter()
        .map(|o| tracking.get(o.scenario_id).and_then(elapsed_seconds))
        .collect();
    let timing = DecisionTimingCalculator::compute(&elapsed, config.fallback_decision_time_sec);
    debug!(
        session_id = %ctx.session_id,
        reorder_source = ?values.reorder_source,
        timing_fallback = timing.fallback_applied,
        "inputs resolved"
    );

    // Stage 4: Reconcile counters and evaluate alignment per scenario
    let scenario_details: Vec<ScenarioDetail> = outcomes
        .iter()
        .zip(timing.per_scenario.iter())
        .map(|(outcome, decision_time)| {
            let observed = events.counts_for(outcome.scenario_id);
            let counters = reconcile(tracking.get(outcome.scenario_id), &observed);
            let aligned = is_aligned(
                outcome.scenario_id,
                &outcome.decision.label,
                &values,
                observed.cvr_yes,
            );

            ScenarioDetail {
                scenario_id: outcome.scenario_id,
                decision_label: outcome.decision.label.clone(),
                decision_title: outcome.decision.title.clone(),
                decision_time: *decision_time,
                switches: counters.switches,
                cvr_visited: counters.cvr_visited,
                cvr_visit_count: counters.cvr_visit_count,
                cvr_yes_answers: counters.cvr_yes_answers,
                apa_reordered: counters.apa_reordered,
                apa_reorder_count: counters.apa_reorder_count,
                aligned,
            }
        })
        .collect();

    let final_alignment_by_scenario: Vec<bool> =
        scenario_details.iter().map(|d| d.aligned).collect();

    // Stage 5: Tallies and composite indices
    let tallies = AlignmentTallies::count(&scenario_details, &events);
    let composite = CompositeScores::from_snapshot(snapshot, config);

    Ok(SessionDVs {
        cvr_arrivals: events.cvr_arrivals(),
        cvr_yes_count: events.cvr_yes_total(),
        cvr_no_count: events.cvr_no_total(),
        apa_reorderings: events.apa_reorder_total(),
        misalign_after_cvr_apa_count: tallies.misalign_after_cvr_apa,
        realign_after_cvr_apa_count: tallies.realign_after_cvr_apa,
        switch_count_total: scenario_details.iter().map(|d| d.switches).sum(),
        avg_decision_time: timing.average,
        value_consistency_index: value_consistency_index(&final_alignment_by_scenario),
        performance_composite: composite.performance_composite,
        balance_index: composite.balance_index,
        decision_times: timing.decision_times,
        final_alignment_by_scenario,
        value_order_trajectories: events.value_order_trajectories(),
        scenario_details,
    })
}

/// Convert a session context JSON document to the persistence payload JSON
/// (stateless, one-shot, no sink).
///
/// # Example
/// ```ignore
/// let payload_json = session_to_dvs_json(context_json)?;
/// ```
pub fn session_to_dvs_json(context_json: String) -> Result<String, ComputeError> {
    let ctx = parse_context(&context_json)?;
    let dvs = aggregate(&ctx, &EngineConfig::default())?;
    PayloadEncoder::new().encode_to_json(&ctx, dvs)
}

/// Result of one `DvProcessor::process` call
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationOutcome {
    /// Metrics were already computed for this session; nothing was done
    AlreadyComputed,
    /// A precondition was missing; no record was produced
    Aborted { reason: String },
    /// Metrics were produced; `persisted` reports whether the sink accepted them
    Computed {
        payload: Box<PersistencePayload>,
        persisted: bool,
    },
}

impl AggregationOutcome {
    /// Computed metrics, if any
    pub fn dvs(&self) -> Option<&SessionDVs> {
        match self {
            AggregationOutcome::Computed { payload, .. } => Some(&payload.dvs),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&PersistencePayload> {
        match self {
            AggregationOutcome::Computed { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

/// Stateful orchestrator owning the sink and the one-shot guard.
///
/// The guard is checked before and set after every attempt, whether the
/// computation or the persistence write succeeded or not.
pub struct DvProcessor<S: PersistenceSink> {
    config: EngineConfig,
    encoder: PayloadEncoder,
    sink: S,
    computed: ComputedSessions,
}

impl<S: PersistenceSink> DvProcessor<S> {
    /// Create a processor with the default configuration
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, EngineConfig::default())
    }

    /// Create a processor with a specific configuration
    pub fn with_config(sink: S, config: EngineConfig) -> Self {
        Self {
            config,
            encoder: PayloadEncoder::new(),
            sink,
            computed: ComputedSessions::new(),
        }
    }

    /// Run aggregation for a session at most once
    pub fn process(&mut self, ctx: &SessionContext) -> AggregationOutcome {
        if self.computed.is_computed(&ctx.session_id) {
            debug!(session_id = %ctx.session_id, "metrics already computed, skipping");
            return AggregationOutcome::AlreadyComputed;
        }

        let outcome = self.run(ctx);
        self.computed.mark_computed(&ctx.session_id);
        outcome
    }

    fn run(&mut self, ctx: &SessionContext) -> AggregationOutcome {
        let dvs = match aggregate(ctx, &self.config) {
            Ok(dvs) => dvs,
            Err(e) => {
                warn!(session_id = %ctx.session_id, error = %e, "session metrics not computed");
                return AggregationOutcome::Aborted {
                    reason: e.to_string(),
                };
            }
        };

        let payload = self.encoder.encode(ctx, dvs);
        let persisted = match self.sink.write(&payload) {
            Ok(()) => true,
            Err(e) => {
                warn!(session_id = %ctx.session_id, error = %e, "failed to persist session metrics");
                false
            }
        };

        info!(
            session_id = %ctx.session_id,
            scenarios = payload.dvs.scenario_details.len(),
            value_consistency_index = payload.dvs.value_consistency_index,
            persisted,
            "session metrics computed"
        );

        AggregationOutcome::Computed {
            payload: Box::new(payload),
            persisted,
        }
    }

    /// Whether the one-shot flag is set for a session
    pub fn is_computed(&self, session_id: &str) -> bool {
        self.computed.is_computed(session_id)
    }

    /// Save one-shot state to JSON for persistence
    pub fn save_state(&self) -> Result<String, ComputeError> {
        self.computed
            .to_json()
            .map_err(|e| ComputeError::StateError(e.to_string()))
    }

    /// Load one-shot state from JSON
    pub fn load_state(&mut self, json: &str) -> Result<(), ComputeError> {
        self.computed =
            ComputedSessions::from_json(json).map_err(|e| ComputeError::StateError(e.to_string()))?;
        Ok(())
    }

    /// Number of sessions with the one-shot flag set
    pub fn computed_session_count(&self) -> usize {
        self.computed.len()
    }

    /// Clear all one-shot flags
    pub fn clear_state(&mut self) {
        self.computed.clear();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
