//! Core data models for the capacity advisor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the input roster: a provisioned instance to evaluate.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    pub instance: String,
    pub region: String,
}

/// A roster entry joined with its live instance class and catalog sizing.
/// Immutable once resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedInstance {
    pub identifier: String,
    pub region: String,
    pub instance_class: String,
    pub memory_gb: u32,
    pub vcpu: u32,
}

/// A single utilization sample as returned by the monitoring API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Sizing attributes looked up from the bulk price list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSizing {
    pub instance_class: String,
    pub memory_gb: u32,
    pub vcpu: u32,
}

/// One sample joined with the owning instance's identity and sizing.
///
/// Identity and timestamp columns never reach the model; the numeric
/// features are exactly [`FeatureRow::features`].
#[derive(Debug, Clone, Serialize)]
pub struct FeatureRow {
    pub timestamp: DateTime<Utc>,
    pub identifier: String,
    pub region: String,
    pub utilization: f64,
    pub vcpu: u32,
    pub memory_gb: u32,
}

impl FeatureRow {
    /// Numeric feature columns in model input order.
    pub fn features(&self) -> [f32; 3] {
        [
            self.utilization as f32,
            self.vcpu as f32,
            self.memory_gb as f32,
        ]
    }
}

/// Hourly rates for one instance under both billing models.
#[derive(Debug, Clone, Serialize)]
pub struct PriceQuote {
    pub identifier: String,
    pub provisioned_hourly: f64,
    pub serverless_hourly: f64,
}

/// A feature row with its inferred capacity-unit value attached.
#[derive(Debug, Clone)]
pub struct InferredRow {
    pub row: FeatureRow,
    pub acu: f64,
}

/// Per-instance aggregate written to the cost report.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceCostSummary {
    pub identifier: String,
    pub avg_utilization: f64,
    pub vcpu: u32,
    pub memory_gb: u32,
    pub avg_acu: f64,
    pub provisioned_monthly_cost: f64,
    pub serverless_monthly_cost: f64,
    pub savings_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn feature_order_is_utilization_vcpu_memory() {
        let row = FeatureRow {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            identifier: "db-one".to_string(),
            region: "us-east-1".to_string(),
            utilization: 42.5,
            vcpu: 4,
            memory_gb: 32,
        };
        assert_eq!(row.features(), [42.5, 4.0, 32.0]);
    }
}
