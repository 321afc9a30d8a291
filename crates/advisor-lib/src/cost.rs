//! Monthly cost aggregation and rounding contracts

use crate::models::{InferredRow, InstanceCostSummary, PriceQuote};
use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;
use std::collections::HashMap;
use tracing::warn;

/// Billing hours per month used by both cost models.
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Round to `dp` decimal places, midpoint away from zero.
///
/// Rounding happens on the decimal representation of the value, so a
/// midpoint like 2.0005 rounds up to 2.001 at three places even though
/// its binary form sits just below the midpoint.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Monthly cost of a fixed-size instance at a constant hourly rate.
pub fn provisioned_monthly(hourly_rate: f64) -> f64 {
    hourly_rate * HOURS_PER_MONTH
}

/// Monthly cost of the serverless model at the average capacity-unit
/// demand.
pub fn serverless_monthly(avg_acu: f64, serverless_hourly: f64) -> f64 {
    avg_acu * HOURS_PER_MONTH * serverless_hourly
}

/// Savings of the serverless model relative to provisioned, in percent.
pub fn savings_percent(serverless_monthly_cost: f64, provisioned_monthly_cost: f64) -> f64 {
    if provisioned_monthly_cost <= 0.0 {
        warn!(
            provisioned_monthly_cost,
            "provisioned monthly cost is not positive, reporting zero savings"
        );
        return 0.0;
    }
    ((serverless_monthly_cost / provisioned_monthly_cost) - 1.0).abs() * 100.0
}

/// Collapse per-sample rows into one summary per instance.
///
/// Instances appear in first-occurrence order. Numeric columns are
/// averaged over the window; each instance's costs use its own rates.
/// Rounding: capacity-unit average to 3dp, serverless monthly cost to
/// 1dp, savings percent to 0dp. Savings are computed from the unrounded
/// monthly costs.
pub fn summarize(rows: &[InferredRow], quotes: &[PriceQuote]) -> Vec<InstanceCostSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&InferredRow>> = HashMap::new();
    for row in rows {
        let identifier = row.row.identifier.as_str();
        groups
            .entry(identifier)
            .or_insert_with(|| {
                order.push(identifier);
                Vec::new()
            })
            .push(row);
    }

    let mut summaries = Vec::with_capacity(order.len());
    for identifier in order {
        let Some(group) = groups.get(identifier) else {
            continue;
        };
        let Some(first) = group.first() else {
            continue;
        };
        let Some(quote) = quotes.iter().find(|quote| quote.identifier == identifier) else {
            warn!(identifier, "no price quote for instance, skipping summary row");
            continue;
        };

        let count = group.len() as f64;
        let avg_utilization = group.iter().map(|r| r.row.utilization).sum::<f64>() / count;
        let avg_acu = group.iter().map(|r| r.acu).sum::<f64>() / count;

        let provisioned = provisioned_monthly(quote.provisioned_hourly);
        let serverless = serverless_monthly(avg_acu, quote.serverless_hourly);

        summaries.push(InstanceCostSummary {
            identifier: identifier.to_string(),
            avg_utilization,
            vcpu: first.row.vcpu,
            memory_gb: first.row.memory_gb,
            avg_acu: round_dp(avg_acu, 3),
            provisioned_monthly_cost: provisioned,
            serverless_monthly_cost: round_dp(serverless, 1),
            savings_percent: round_dp(savings_percent(serverless, provisioned), 0),
        });
    }
    summaries
}
