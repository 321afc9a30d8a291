//! CSV report writers
//!
//! Two outputs per run: the per-sample inferred series and the
//! per-instance cost report. Parent directories are created on demand.

use crate::cost::round_dp;
use crate::error::{AdvisorError, Result};
use crate::models::{InferredRow, InstanceCostSummary};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// Timestamp format used in the inferred-series report.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One output row of the inferred-series report. Field order defines the
/// column order.
#[derive(Debug, Serialize)]
struct SeriesRecord<'a> {
    timestamp: String,
    provisioned_instance: &'a str,
    provisioned_region: &'a str,
    provisioned_util: f64,
    provisioned_vcpu: u32,
    provisioned_mem: u32,
    serverless_acu: f64,
}

/// One output row of the cost report.
#[derive(Debug, Serialize)]
struct CostRecord<'a> {
    provisioned_instance: &'a str,
    provisioned_util: f64,
    provisioned_vcpu: u32,
    provisioned_mem: u32,
    serverless_acu: f64,
    provisioned_monthly_cost: f64,
    serverless_monthly_cost: f64,
    serverless_savings: f64,
}

/// Write the per-sample inferred series, capacity units rounded to 2dp.
pub fn write_inferred_series(path: &Path, rows: &[InferredRow]) -> Result<()> {
    let mut writer = open_writer(path)?;
    for row in rows {
        let record = SeriesRecord {
            timestamp: row.row.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            provisioned_instance: &row.row.identifier,
            provisioned_region: &row.row.region,
            provisioned_util: row.row.utilization,
            provisioned_vcpu: row.row.vcpu,
            provisioned_mem: row.row.memory_gb,
            serverless_acu: round_dp(row.acu, 2),
        };
        writer
            .serialize(record)
            .map_err(|source| report_error(path, source))?;
    }
    writer
        .flush()
        .map_err(|source| report_error(path, csv::Error::from(source)))?;
    Ok(())
}

/// Write the per-instance cost report.
pub fn write_cost_report(path: &Path, summaries: &[InstanceCostSummary]) -> Result<()> {
    let mut writer = open_writer(path)?;
    for summary in summaries {
        let record = CostRecord {
            provisioned_instance: &summary.identifier,
            provisioned_util: summary.avg_utilization,
            provisioned_vcpu: summary.vcpu,
            provisioned_mem: summary.memory_gb,
            serverless_acu: summary.avg_acu,
            provisioned_monthly_cost: summary.provisioned_monthly_cost,
            serverless_monthly_cost: summary.serverless_monthly_cost,
            serverless_savings: summary.savings_percent,
        };
        writer
            .serialize(record)
            .map_err(|source| report_error(path, source))?;
    }
    writer
        .flush()
        .map_err(|source| report_error(path, csv::Error::from(source)))?;
    Ok(())
}

fn open_writer(path: &Path) -> Result<csv::Writer<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|source| report_error(path, csv::Error::from(source)))?;
        }
    }
    csv::Writer::from_path(path).map_err(|source| report_error(path, source))
}

fn report_error(path: &Path, source: csv::Error) -> AdvisorError {
    AdvisorError::Report {
        path: path.to_path_buf(),
        source,
    }
}
