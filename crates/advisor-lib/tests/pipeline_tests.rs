//! End-to-end pipeline tests against stubbed HTTP endpoints
//!
//! The regression model is replaced with a constant-output stub so the
//! scenarios pin down orchestration behavior: partial-failure isolation,
//! empty-run handling, and the cost contracts.

use advisor_lib::error::ModelError;
use advisor_lib::inference::CapacityModel;
use advisor_lib::metrics::{MetricsClient, RetryPolicy, TimeWindow};
use advisor_lib::models::{FeatureRow, RosterEntry};
use advisor_lib::pipeline::{Pipeline, PipelineConfig, PricingDimensions};
use advisor_lib::pricing::PricingCatalog;
use advisor_lib::resolver::InventoryClient;
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use std::time::Duration as StdDuration;

const PRICE_CSV: &str = "\
FormatVersion,v1.0\n\
Disclaimer,...\n\
Publication Date,2024-01-01\n\
Version,20240101000000\n\
OfferCode,AmazonRDS\n\
SKU,Instance Type,vCPU,Memory,TermType,PurchaseOption,Database Engine,Deployment Option,Product Family,PricePerUnit\n\
A1,db.r6g.large,2,16 GiB,Reserved,No Upfront,Aurora PostgreSQL,Single-AZ,Database Instance,0.50\n\
A2,db.r6g.xlarge,4,32 GiB,Reserved,No Upfront,Aurora PostgreSQL,Single-AZ,Database Instance,1.00\n\
A3,,,,OnDemand,,Aurora PostgreSQL,,ServerlessV2,0.12\n";

/// Stub regressor that always predicts the same capacity-unit demand.
struct ConstantModel(f64);

impl CapacityModel for ConstantModel {
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, ModelError> {
        Ok(vec![self.0; rows.len()])
    }
}

fn pipeline_config() -> PipelineConfig {
    PipelineConfig {
        window: TimeWindow::from_bounds(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        ),
        pricing: PricingDimensions {
            engine: "Aurora PostgreSQL".to_string(),
            term_type: "Reserved".to_string(),
            purchase_option: "No Upfront".to_string(),
            deployment_option: "Single-AZ".to_string(),
        },
    }
}

fn roster(entries: &[(&str, &str)]) -> Vec<RosterEntry> {
    entries
        .iter()
        .map(|(instance, region)| RosterEntry {
            instance: instance.to_string(),
            region: region.to_string(),
        })
        .collect()
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: StdDuration::from_millis(1),
        max_backoff: StdDuration::from_millis(2),
    }
}

/// One day of five-minute samples, most recent first.
fn day_of_samples(count: usize) -> serde_json::Value {
    let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let timestamps: Vec<String> = (0..count)
        .map(|i| (end - Duration::minutes(5 * i as i64)).to_rfc3339())
        .collect();
    let values: Vec<f64> = (0..count).map(|i| 40.0 + (i % 10) as f64).collect();
    json!({
        "results": [{
            "id": "util0",
            "status_code": "Complete",
            "timestamps": timestamps,
            "values": values
        }]
    })
}

async fn mock_inventory(server: &mut mockito::Server, identifier: &str, class: &str) {
    server
        .mock(
            "GET",
            format!("/v1/instances/us-east-1/{identifier}").as_str(),
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"identifier": identifier, "instance_class": class}).to_string())
        .create_async()
        .await;
}

async fn mock_pricing(server: &mut mockito::Server) {
    server
        .mock("GET", "/offers/v1.0/aws/AmazonRDS/current/us-east-1/index.csv")
        .with_status(200)
        .with_body(PRICE_CSV)
        .create_async()
        .await;
}

#[tokio::test]
async fn partial_failure_isolates_the_failing_instance() {
    let mut server = mockito::Server::new_async().await;
    mock_pricing(&mut server).await;
    mock_inventory(&mut server, "db-one", "db.r6g.large").await;
    mock_inventory(&mut server, "db-two", "db.r6g.xlarge").await;

    // db-one returns a full day of five-minute samples; db-two's fetch
    // fails hard and exhausts its retries.
    server
        .mock("POST", "/v1/metrics/query")
        .match_body(mockito::Matcher::PartialJsonString(
            json!({"queries": [{"dimension": {"value": "db-one"}}]}).to_string(),
        ))
        .with_status(200)
        .with_body(day_of_samples(288).to_string())
        .create_async()
        .await;
    server
        .mock("POST", "/v1/metrics/query")
        .match_body(mockito::Matcher::PartialJsonString(
            json!({"queries": [{"dimension": {"value": "db-two"}}]}).to_string(),
        ))
        .with_status(500)
        .expect(3)
        .create_async()
        .await;

    let metrics = MetricsClient::with_retry_policy(&server.url(), fast_retry()).unwrap();
    let inventory = InventoryClient::new(&server.url()).unwrap();
    let catalog = PricingCatalog::new(&server.url()).unwrap();
    let model = ConstantModel(2.0);
    let pipeline = Pipeline::new(&metrics, &inventory, &catalog, &model);

    let output = pipeline
        .run(
            &roster(&[("db-one", "us-east-1"), ("db-two", "us-east-1")]),
            &pipeline_config(),
        )
        .await
        .unwrap()
        .expect("one instance should survive");

    assert_eq!(output.inferred.len(), 288);
    assert!(output
        .inferred
        .iter()
        .all(|row| row.row.identifier == "db-one"));
    assert_eq!(output.summaries.len(), 1);

    let summary = &output.summaries[0];
    assert_eq!(summary.identifier, "db-one");
    assert_eq!(summary.vcpu, 2);
    assert_eq!(summary.memory_gb, 16);
    assert_eq!(summary.avg_acu, 2.0);
    assert_eq!(summary.provisioned_monthly_cost, 365.0);
    assert_eq!(summary.serverless_monthly_cost, 175.2);
    assert_eq!(summary.savings_percent, 52.0);
}

#[tokio::test]
async fn all_instances_failing_produces_no_output() {
    let mut server = mockito::Server::new_async().await;
    mock_pricing(&mut server).await;
    mock_inventory(&mut server, "db-one", "db.r6g.large").await;

    server
        .mock("POST", "/v1/metrics/query")
        .with_status(500)
        .expect(3)
        .create_async()
        .await;

    let metrics = MetricsClient::with_retry_policy(&server.url(), fast_retry()).unwrap();
    let inventory = InventoryClient::new(&server.url()).unwrap();
    let catalog = PricingCatalog::new(&server.url()).unwrap();
    let model = ConstantModel(2.0);
    let pipeline = Pipeline::new(&metrics, &inventory, &catalog, &model);

    let output = pipeline
        .run(&roster(&[("db-one", "us-east-1")]), &pipeline_config())
        .await
        .unwrap();

    assert!(output.is_none());
}

#[tokio::test]
async fn unresolvable_instance_is_excluded_before_any_fetch() {
    let mut server = mockito::Server::new_async().await;
    mock_pricing(&mut server).await;
    mock_inventory(&mut server, "db-one", "db.r6g.large").await;
    // db-ghost's inventory lookup 404s; no metric query may be issued
    // for it.
    server
        .mock("GET", "/v1/instances/us-east-1/db-ghost")
        .with_status(404)
        .create_async()
        .await;
    let metric_mock = server
        .mock("POST", "/v1/metrics/query")
        .match_body(mockito::Matcher::PartialJsonString(
            json!({"queries": [{"dimension": {"value": "db-one"}}]}).to_string(),
        ))
        .with_status(200)
        .with_body(day_of_samples(12).to_string())
        .expect(1)
        .create_async()
        .await;

    let metrics = MetricsClient::with_retry_policy(&server.url(), fast_retry()).unwrap();
    let inventory = InventoryClient::new(&server.url()).unwrap();
    let catalog = PricingCatalog::new(&server.url()).unwrap();
    let model = ConstantModel(1.5);
    let pipeline = Pipeline::new(&metrics, &inventory, &catalog, &model);

    let output = pipeline
        .run(
            &roster(&[("db-ghost", "us-east-1"), ("db-one", "us-east-1")]),
            &pipeline_config(),
        )
        .await
        .unwrap()
        .expect("db-one should survive");

    metric_mock.assert_async().await;
    assert_eq!(output.inferred.len(), 12);
    assert_eq!(output.summaries.len(), 1);
    assert_eq!(output.summaries[0].identifier, "db-one");
}

#[tokio::test]
async fn zero_sample_instance_contributes_no_rows_without_failing_the_run() {
    let mut server = mockito::Server::new_async().await;
    mock_pricing(&mut server).await;
    mock_inventory(&mut server, "db-one", "db.r6g.large").await;
    mock_inventory(&mut server, "db-idle", "db.r6g.xlarge").await;

    server
        .mock("POST", "/v1/metrics/query")
        .match_body(mockito::Matcher::PartialJsonString(
            json!({"queries": [{"dimension": {"value": "db-one"}}]}).to_string(),
        ))
        .with_status(200)
        .with_body(day_of_samples(6).to_string())
        .create_async()
        .await;
    server
        .mock("POST", "/v1/metrics/query")
        .match_body(mockito::Matcher::PartialJsonString(
            json!({"queries": [{"dimension": {"value": "db-idle"}}]}).to_string(),
        ))
        .with_status(200)
        .with_body(
            json!({"results": [{"id": "util0", "status_code": "Complete"}]}).to_string(),
        )
        .create_async()
        .await;

    let metrics = MetricsClient::with_retry_policy(&server.url(), fast_retry()).unwrap();
    let inventory = InventoryClient::new(&server.url()).unwrap();
    let catalog = PricingCatalog::new(&server.url()).unwrap();
    let model = ConstantModel(1.0);
    let pipeline = Pipeline::new(&metrics, &inventory, &catalog, &model);

    let output = pipeline
        .run(
            &roster(&[("db-one", "us-east-1"), ("db-idle", "us-east-1")]),
            &pipeline_config(),
        )
        .await
        .unwrap()
        .expect("db-one should survive");

    assert_eq!(output.inferred.len(), 6);
    assert_eq!(output.summaries.len(), 1);
    assert_eq!(output.summaries[0].identifier, "db-one");
}
