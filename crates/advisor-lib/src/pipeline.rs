//! Pipeline orchestration
//!
//! Drives the full run: roster resolution, per-instance metric pulls and
//! price quotes, one batched inference over the combined table, then cost
//! aggregation. Per-instance failures are logged and excluded; model
//! failures abort the run. Instances are processed strictly one at a
//! time, in input order, but the per-instance unit of work
//! ([`Pipeline::process_instance`]) is self-contained and could be
//! scheduled independently.

use crate::cost;
use crate::error::{ModelError, Result};
use crate::inference::CapacityModel;
use crate::metrics::{MetricQuery, MetricsClient, TimeWindow};
use crate::models::{
    FeatureRow, InferredRow, InstanceCostSummary, PriceQuote, RosterEntry, TrackedInstance,
};
use crate::pricing::{PriceLookup, PriceTable, PricingCatalog};
use crate::resolver::{InstanceConfigResolver, InventoryClient};
use std::collections::HashMap;
use tracing::{error, info, warn};

/// Region whose bulk table provides instance sizing attributes.
pub const SIZING_REGION: &str = "us-east-1";

/// Metric pulled for every tracked instance.
pub const METRIC_NAME: &str = "CPUUtilization";
pub const METRIC_NAMESPACE: &str = "AWS/RDS";
pub const METRIC_DIMENSION: &str = "DBInstanceIdentifier";
pub const METRIC_STATISTIC: &str = "Average";
pub const METRIC_PERIOD_SECONDS: u32 = 300;

/// Pricing dimensions shared by every price lookup in a run.
#[derive(Debug, Clone)]
pub struct PricingDimensions {
    pub engine: String,
    pub term_type: String,
    pub purchase_option: String,
    pub deployment_option: String,
}

/// Everything a run needs beyond the roster.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub window: TimeWindow,
    pub pricing: PricingDimensions,
}

/// Result of a run in which at least one instance survived.
pub struct PipelineOutput {
    pub inferred: Vec<InferredRow>,
    pub summaries: Vec<InstanceCostSummary>,
}

/// Work product of one instance: its feature rows and price quote.
struct InstanceBatch {
    rows: Vec<FeatureRow>,
    quote: PriceQuote,
}

pub struct Pipeline<'a> {
    metrics: &'a MetricsClient,
    inventory: &'a InventoryClient,
    catalog: &'a PricingCatalog,
    model: &'a dyn CapacityModel,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        metrics: &'a MetricsClient,
        inventory: &'a InventoryClient,
        catalog: &'a PricingCatalog,
        model: &'a dyn CapacityModel,
    ) -> Self {
        Self {
            metrics,
            inventory,
            catalog,
            model,
        }
    }

    /// Run the pipeline over the roster.
    ///
    /// Returns `Ok(None)` when no instance produced samples; the caller
    /// writes no reports in that case.
    pub async fn run(
        &self,
        roster: &[RosterEntry],
        config: &PipelineConfig,
    ) -> Result<Option<PipelineOutput>> {
        let sizing_table = self.catalog.load_bulk(SIZING_REGION).await?;

        let tracked = self.resolve_roster(roster, &sizing_table).await;

        let mut price_tables: HashMap<String, PriceTable> = HashMap::new();
        price_tables.insert(SIZING_REGION.to_string(), sizing_table);

        let mut rows = Vec::new();
        let mut quotes = Vec::new();
        for instance in &tracked {
            info!(identifier = %instance.identifier, "processing instance");
            match self
                .process_instance(instance, config, &mut price_tables)
                .await
            {
                Ok(batch) => {
                    rows.extend(batch.rows);
                    quotes.push(batch.quote);
                }
                Err(err) => {
                    error!(
                        identifier = %instance.identifier,
                        error = %err,
                        "instance excluded from run"
                    );
                }
            }
        }

        if rows.is_empty() {
            warn!("no instance produced samples, skipping inference and reports");
            return Ok(None);
        }

        let predictions = self.model.predict(&rows)?;
        if predictions.len() != rows.len() {
            return Err(ModelError::OutputShape {
                expected: rows.len(),
                got: predictions.len(),
            }
            .into());
        }
        let mean = predictions.iter().sum::<f64>() / predictions.len() as f64;
        info!(
            rows = predictions.len(),
            mean = %format!("{mean:.2}"),
            "inferred capacity-unit demand"
        );

        let inferred: Vec<InferredRow> = rows
            .into_iter()
            .zip(predictions)
            .map(|(row, acu)| InferredRow { row, acu })
            .collect();
        let summaries = cost::summarize(&inferred, &quotes);

        Ok(Some(PipelineOutput {
            inferred,
            summaries,
        }))
    }

    /// Join the roster against live configuration and catalog sizing,
    /// excluding entries that fail to resolve.
    async fn resolve_roster(
        &self,
        roster: &[RosterEntry],
        sizing_table: &PriceTable,
    ) -> Vec<TrackedInstance> {
        let resolver = InstanceConfigResolver::new(self.inventory, sizing_table);
        let mut tracked = Vec::with_capacity(roster.len());
        for entry in roster {
            match resolver.resolve(entry).await {
                Ok(instance) => tracked.push(instance),
                Err(err) => {
                    error!(
                        identifier = %entry.instance,
                        error = %err,
                        "failed to resolve instance configuration, excluding instance"
                    );
                }
            }
        }
        tracked
    }

    /// The per-instance unit of work: fetch the utilization series,
    /// attach sizing and identity, and collect the price quote.
    async fn process_instance(
        &self,
        instance: &TrackedInstance,
        config: &PipelineConfig,
        price_tables: &mut HashMap<String, PriceTable>,
    ) -> Result<InstanceBatch> {
        let query = MetricQuery {
            identifier: instance.identifier.clone(),
            metric_name: METRIC_NAME.to_string(),
            namespace: METRIC_NAMESPACE.to_string(),
            dimension_name: METRIC_DIMENSION.to_string(),
            statistic: METRIC_STATISTIC.to_string(),
            period_seconds: METRIC_PERIOD_SECONDS,
        };
        let samples = self.metrics.fetch_series(&query, &config.window).await?;
        info!(
            identifier = %instance.identifier,
            samples = samples.len(),
            "fetched utilization series"
        );

        let rows: Vec<FeatureRow> = samples
            .into_iter()
            .map(|sample| FeatureRow {
                timestamp: sample.timestamp,
                identifier: instance.identifier.clone(),
                region: instance.region.clone(),
                utilization: sample.value,
                vcpu: instance.vcpu,
                memory_gb: instance.memory_gb,
            })
            .collect();

        if !price_tables.contains_key(&instance.region) {
            let table = self.catalog.load_bulk(&instance.region).await?;
            price_tables.insert(instance.region.clone(), table);
        }
        let table = &price_tables[&instance.region];

        let lookup = PriceLookup {
            engine: config.pricing.engine.clone(),
            instance_class: instance.instance_class.clone(),
            term_type: config.pricing.term_type.clone(),
            purchase_option: config.pricing.purchase_option.clone(),
            deployment_option: config.pricing.deployment_option.clone(),
        };
        let (provisioned_hourly, serverless_hourly) = table.lookup_price(&lookup)?;

        Ok(InstanceBatch {
            rows,
            quote: PriceQuote {
                identifier: instance.identifier.clone(),
                provisioned_hourly,
                serverless_hourly,
            },
        })
    }
}
