//! HTTP transport for the monitoring API

use super::window::TimeWindow;
use crate::error::{AdvisorError, Result};
use crate::models::UtilizationSample;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Query id used for the single metric data query per request.
const QUERY_ID: &str = "util0";

/// Status the monitoring API reports for a fully materialized result.
/// Anything else, including partial results, is a fetch failure.
const STATUS_COMPLETE: &str = "Complete";

/// Bounded retry for transport-level failures. Application-level failures
/// (4xx, non-success result status) are never retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

/// One bounded metric query: a single resource and a single metric
/// dimension.
#[derive(Debug, Clone)]
pub struct MetricQuery {
    pub identifier: String,
    pub metric_name: String,
    pub namespace: String,
    pub dimension_name: String,
    pub statistic: String,
    pub period_seconds: u32,
}

#[derive(Debug, Serialize)]
struct MetricDataRequest<'a> {
    queries: Vec<MetricDataQuery<'a>>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    scan_by: &'a str,
}

#[derive(Debug, Serialize)]
struct MetricDataQuery<'a> {
    id: &'a str,
    namespace: &'a str,
    metric_name: &'a str,
    dimension: DimensionFilter<'a>,
    period: u32,
    stat: &'a str,
}

#[derive(Debug, Serialize)]
struct DimensionFilter<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct MetricDataResponse {
    results: Vec<MetricDataResult>,
}

#[derive(Debug, Deserialize)]
struct MetricDataResult {
    id: String,
    status_code: String,
    #[serde(default)]
    timestamps: Vec<DateTime<Utc>>,
    #[serde(default)]
    values: Vec<f64>,
}

/// Client for the monitoring API's metric data endpoint.
pub struct MetricsClient {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl MetricsClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_retry_policy(base_url, RetryPolicy::default())
    }

    pub fn with_retry_policy(base_url: &str, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let base_url = Url::parse(base_url)?;
        Ok(Self {
            client,
            base_url,
            retry,
        })
    }

    /// Fetch the utilization series for one resource over the window,
    /// most recent first as scanned by the API. A successful query with
    /// zero samples is a valid empty result.
    pub async fn fetch_series(
        &self,
        query: &MetricQuery,
        window: &TimeWindow,
    ) -> Result<Vec<UtilizationSample>> {
        let url = self.base_url.join("v1/metrics/query")?;
        let request = MetricDataRequest {
            queries: vec![MetricDataQuery {
                id: QUERY_ID,
                namespace: &query.namespace,
                metric_name: &query.metric_name,
                dimension: DimensionFilter {
                    name: &query.dimension_name,
                    value: &query.identifier,
                },
                period: query.period_seconds,
                stat: &query.statistic,
            }],
            start_time: window.start,
            end_time: window.end,
            scan_by: "TimestampDescending",
        };
        debug!(
            identifier = %query.identifier,
            start = %window.start,
            end = %window.end,
            "querying utilization series"
        );

        let response = self
            .post_with_retry(&url, &request, &query.identifier)
            .await?;
        let result = response
            .results
            .into_iter()
            .find(|result| result.id == QUERY_ID)
            .ok_or_else(|| AdvisorError::MetricStatus {
                identifier: query.identifier.clone(),
                status: "MissingResult".to_string(),
            })?;

        if result.status_code != STATUS_COMPLETE {
            return Err(AdvisorError::MetricStatus {
                identifier: query.identifier.clone(),
                status: result.status_code,
            });
        }
        if result.timestamps.len() != result.values.len() {
            return Err(AdvisorError::MetricShape {
                identifier: query.identifier.clone(),
                timestamps: result.timestamps.len(),
                values: result.values.len(),
            });
        }

        Ok(result
            .timestamps
            .into_iter()
            .zip(result.values)
            .map(|(timestamp, value)| UtilizationSample { timestamp, value })
            .collect())
    }

    async fn post_with_retry(
        &self,
        url: &Url,
        request: &MetricDataRequest<'_>,
        identifier: &str,
    ) -> Result<MetricDataResponse> {
        let mut backoff = self.retry.initial_backoff;
        let mut last_failure = String::new();

        for attempt in 1..=self.retry.max_attempts {
            match self.client.post(url.clone()).json(request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.json().await?);
                    }
                    if !status.is_server_error() {
                        return Err(AdvisorError::MetricRejected {
                            identifier: identifier.to_string(),
                            status,
                        });
                    }
                    last_failure = format!("server returned {status}");
                }
                Err(err) => last_failure = err.to_string(),
            }

            if attempt < self.retry.max_attempts {
                warn!(
                    identifier,
                    attempt,
                    error = %last_failure,
                    "metric query failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(self.retry.max_backoff);
            }
        }

        Err(AdvisorError::MetricRetriesExhausted {
            identifier: identifier.to_string(),
            attempts: self.retry.max_attempts,
            reason: last_failure,
        })
    }
}
