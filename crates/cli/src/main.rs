//! Serverless Capacity Advisor CLI
//!
//! Pulls utilization history for provisioned database instances, infers
//! serverless capacity-unit demand with a pre-trained regression model,
//! and reports the monthly cost of both billing models.

mod output;

use advisor_lib::inference::OnnxCapacityModel;
use advisor_lib::metrics::{MetricsClient, TimeWindow};
use advisor_lib::pipeline::{Pipeline, PipelineConfig, PricingDimensions};
use advisor_lib::pricing::PricingCatalog;
use advisor_lib::resolver::InventoryClient;
use advisor_lib::{report, roster};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Accepted format for explicit window bounds, interpreted as UTC.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serverless Capacity Advisor CLI
#[derive(Parser)]
#[command(name = "sca")]
#[command(
    author,
    version,
    about = "Serverless capacity and cost advisor for provisioned database instances",
    long_about = None
)]
struct Cli {
    /// Input roster CSV with `instance,region` columns
    #[arg(short, long, default_value = "data/provisioned_instances.csv")]
    input_file: PathBuf,

    /// Inferred-series report path
    #[arg(short, long, default_value = "data/inference_output.csv")]
    output_file: PathBuf,

    /// Cost report path
    #[arg(short, long, default_value = "data/cost_output.csv")]
    cost_file: PathBuf,

    /// Days of history to pull when no explicit window is given
    #[arg(short, long, default_value_t = 4)]
    days_back: u32,

    /// Window start, `YYYY-MM-DD HH:MM:SS` UTC
    #[arg(short, long, requires = "end_time")]
    start_time: Option<String>,

    /// Window end, `YYYY-MM-DD HH:MM:SS` UTC
    #[arg(short, long, requires = "start_time")]
    end_time: Option<String>,

    /// Database engine used for both price lookups
    #[arg(short = 'g', long, default_value = "Aurora PostgreSQL")]
    db_engine: String,

    /// Reserved-instance term type (price list TermType column)
    #[arg(short, long, default_value = "Reserved")]
    term_type: String,

    /// Reserved-instance purchase option (price list PurchaseOption column)
    #[arg(short, long, default_value = "No Upfront")]
    purchase_option: String,

    /// Deployment option (price list DeploymentOption column)
    #[arg(short = 'r', long, default_value = "Single-AZ")]
    deployment_option: String,

    /// Monitoring + inventory API base URL
    #[arg(long, env = "SCA_MONITORING_URL", default_value = "http://localhost:9090")]
    monitoring_url: String,

    /// Price list host
    #[arg(
        long,
        env = "SCA_PRICING_URL",
        default_value = "https://pricing.us-east-1.amazonaws.com"
    )]
    pricing_url: String,

    /// Pre-trained capacity-unit regression artifact
    #[arg(long, default_value = "model.onnx")]
    model_path: PathBuf,
}

impl Cli {
    fn window(&self) -> Result<TimeWindow> {
        match (&self.start_time, &self.end_time) {
            (Some(start), Some(end)) => {
                let start = parse_utc(start)?;
                let end = parse_utc(end)?;
                if end < start {
                    bail!("--end-time precedes --start-time");
                }
                Ok(TimeWindow::from_bounds(start, end))
            }
            _ => Ok(TimeWindow::lookback(self.days_back)),
        }
    }
}

fn parse_utc(text: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(text, TIME_FORMAT)
        .with_context(|| format!("invalid timestamp {text:?}, expected {TIME_FORMAT}"))?;
    Ok(Utc.from_utc_datetime(&naive))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let model = OnnxCapacityModel::load(&cli.model_path)
        .context("failed to load the capacity-unit model artifact")?;
    info!(path = %cli.model_path.display(), "model artifact loaded");

    let entries = roster::load_roster(&cli.input_file)?;
    info!(instances = entries.len(), "loaded input roster");

    let metrics = MetricsClient::new(&cli.monitoring_url)?;
    let inventory = InventoryClient::new(&cli.monitoring_url)?;
    let catalog = PricingCatalog::new(&cli.pricing_url)?;

    let config = PipelineConfig {
        window: cli.window()?,
        pricing: PricingDimensions {
            engine: cli.db_engine.clone(),
            term_type: cli.term_type.clone(),
            purchase_option: cli.purchase_option.clone(),
            deployment_option: cli.deployment_option.clone(),
        },
    };

    let pipeline = Pipeline::new(&metrics, &inventory, &catalog, &model);
    match pipeline.run(&entries, &config).await? {
        Some(result) => {
            report::write_inferred_series(&cli.output_file, &result.inferred)?;
            info!(
                path = %cli.output_file.display(),
                rows = result.inferred.len(),
                "inferred-series report written"
            );
            report::write_cost_report(&cli.cost_file, &result.summaries)?;
            info!(
                path = %cli.cost_file.display(),
                rows = result.summaries.len(),
                "cost report written"
            );
            output::print_cost_summary(&result.summaries);
        }
        None => {
            output::print_warning("no instance produced usable samples; no reports written");
        }
    }

    Ok(())
}
