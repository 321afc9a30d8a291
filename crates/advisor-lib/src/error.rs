//! Error taxonomy for the advisor pipeline
//!
//! Per-instance failures (metric fetch, reference lookups, inventory
//! queries) are surfaced as typed variants so the orchestrator can decide
//! fail-soft exclusion explicitly. Model and roster failures are fatal to
//! the whole run.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AdvisorError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("metric query for {identifier} was rejected: {status}")]
    MetricRejected {
        identifier: String,
        status: reqwest::StatusCode,
    },

    #[error("metric fetch for {identifier} failed after {attempts} attempts: {reason}")]
    MetricRetriesExhausted {
        identifier: String,
        attempts: u32,
        reason: String,
    },

    #[error("metric query for {identifier} returned status {status}")]
    MetricStatus { identifier: String, status: String },

    #[error("metric query for {identifier} returned {timestamps} timestamps but {values} values")]
    MetricShape {
        identifier: String,
        timestamps: usize,
        values: usize,
    },

    #[error("price list download for {region} failed")]
    CatalogDownload {
        region: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("price list download for {region} returned {status}")]
    CatalogStatus {
        region: String,
        status: reqwest::StatusCode,
    },

    #[error("price list for {region} is malformed: {reason}")]
    CatalogShape { region: String, reason: String },

    #[error("price list field {field} is not numeric: {value:?}")]
    CatalogValue { field: String, value: String },

    #[error("no catalog entry for instance class {instance_class}")]
    MissingCatalogEntry { instance_class: String },

    #[error("no {offering} price entry for {instance_class} ({engine}) in {region}")]
    MissingPriceEntry {
        offering: String,
        region: String,
        engine: String,
        instance_class: String,
    },

    #[error("inventory lookup for {identifier} returned {status}")]
    InventoryStatus {
        identifier: String,
        status: reqwest::StatusCode,
    },

    #[error("input roster {path:?} could not be read")]
    RosterRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("input roster {path:?} is missing required column {column:?}")]
    RosterColumn { path: PathBuf, column: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("failed to write report {path:?}")]
    Report {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Failures of the pre-trained regression artifact. Always fatal: the
/// inference step is a precondition for any cost output.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to load model artifact {path:?}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("prediction failed on row {row}: {message}")]
    Predict { row: usize, message: String },

    #[error("model returned {got} predictions for {expected} rows")]
    OutputShape { expected: usize, got: usize },
}
