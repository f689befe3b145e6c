//! Composite simulation indices
//!
//! Both indices are computed over the same 7-dimensional normalized vector:
//!
//! ```text
//! [ min(lives_saved / 20000, 1),
//!   1 - min(human_casualties / 1000, 1),
//!   firefighting_resource / 100,
//!   infrastructure_condition / 100,
//!   biodiversity_condition / 100,
//!   properties_condition / 100,
//!   nuclear_power_station / 100 ]
//! ```

use crate::config::EngineConfig;
use crate::types::SimulationMetricsSnapshot;

/// Number of normalized dimensions
pub const METRIC_DIMENSIONS: usize = 7;

/// Scale of the five condition-style metrics
const PERCENT_SCALE: f64 = 100.0;

/// Normalized simulation metrics vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedMetrics(pub [f64; METRIC_DIMENSIONS]);

/// Scalar indices derived from the snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeScores {
    /// Mean of the normalized vector, 2 decimals
    pub performance_composite: f64,
    /// `1 - population variance` of the normalized vector, 2 decimals
    pub balance_index: f64,
}

impl NormalizedMetrics {
    /// Normalize a snapshot. Counts above their cap saturate rather than error.
    pub fn from_snapshot(snapshot: &SimulationMetricsSnapshot, config: &EngineConfig) -> Self {
        Self([
            (snapshot.lives_saved / config.lives_saved_cap).min(1.0),
            1.0 - (snapshot.human_casualties / config.human_casualties_cap).min(1.0),
            snapshot.firefighting_resource / PERCENT_SCALE,
            snapshot.infrastructure_condition / PERCENT_SCALE,
            snapshot.biodiversity_condition / PERCENT_SCALE,
            snapshot.properties_condition / PERCENT_SCALE,
            snapshot.nuclear_power_station / PERCENT_SCALE,
        ])
    }

    pub fn mean(&self) -> f64 {
        self.0.iter().sum::<f64>() / METRIC_DIMENSIONS as f64
    }

    /// Population variance (divides by the dimension count)
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.0.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / METRIC_DIMENSIONS as f64
    }
}

impl CompositeScores {
    pub fn from_snapshot(snapshot: &SimulationMetricsSnapshot, config: &EngineConfig) -> Self {
        let normalized = NormalizedMetrics::from_snapshot(snapshot, config);
        Self {
            performance_composite: round2(normalized.mean()),
            balance_index: round2(1.0 - normalized.variance()),
        }
    }
}

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
