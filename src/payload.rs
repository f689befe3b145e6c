//! Persistence payload encoder
//!
//! Merges the computed `SessionDVs` with the session identifier and the raw
//! passthrough lists from the context into the record written to the sink.

use crate::error::ComputeError;
use crate::schema::SessionContext;
use crate::types::SessionDVs;
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Producer metadata stamped on every payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Record handed to the persistence sink, one per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistencePayload {
    pub record_id: String,
    pub session_id: String,
    pub computed_at_utc: String,
    pub producer: PayloadProducer,
    #[serde(flatten)]
    pub dvs: SessionDVs,
    /// Decision labels from the context, or the outcome labels in outcome order
    pub decision_labels: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_checklist: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_values: Option<Value>,
    pub matched_stable_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moral_values_reorder_list: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scenario_reordered_values: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infeasible_options: Option<Value>,
}

/// Payload encoder
pub struct PayloadEncoder {
    instance_id: String,
}

impl Default for PayloadEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build the persistence payload for a computed session
    pub fn encode(&self, ctx: &SessionContext, dvs: SessionDVs) -> PersistencePayload {
        let passthrough = &ctx.passthrough;

        let decision_labels = passthrough.decision_labels.clone().unwrap_or_else(|| {
            Value::Array(
                ctx.simulation_outcomes
                    .iter()
                    .map(|o| Value::String(o.decision.label.clone()))
                    .collect(),
            )
        });

        PersistencePayload {
            record_id: Uuid::new_v4().to_string(),
            session_id: ctx.session_id.clone(),
            computed_at_utc: Utc::now().to_rfc3339(),
            producer: PayloadProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            dvs,
            decision_labels,
            alignment_checklist: passthrough.alignment_checklist.clone(),
            final_values: passthrough.final_values.clone(),
            matched_stable_values: ctx.matched_stable_values.clone(),
            moral_values_reorder_list: ctx.moral_values_reorder_list.clone(),
            scenario_reordered_values: passthrough.scenario_reordered_values.clone(),
            infeasible_options: passthrough.infeasible_options.clone(),
        }
    }

    /// Encode to a pretty JSON string
    pub fn encode_to_json(
        &self,
        ctx: &SessionContext,
        dvs: SessionDVs,
    ) -> Result<String, ComputeError> {
        let payload = self.encode(ctx, dvs);
        serde_json::to_string_pretty(&payload).map_err(ComputeError::JsonError)
    }
}
