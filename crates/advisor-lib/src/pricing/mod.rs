//! Bulk price list download and reference lookups
//!
//! The price list is a large delimited table, one row per product
//! configuration, published per region behind a fixed URL layout. All
//! lookups are point queries against the parsed table; see
//! [`PriceTable`] for the tie-break rules.

mod table;

pub use table::{PriceLookup, PriceTable};

use crate::error::{AdvisorError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Downloads per-region bulk price lists.
pub struct PricingCatalog {
    client: Client,
    base_url: Url,
}

impl PricingCatalog {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        let base_url = Url::parse(base_url)?;
        Ok(Self { client, base_url })
    }

    /// Fetch and normalize the bulk price list for one region.
    pub async fn load_bulk(&self, region: &str) -> Result<PriceTable> {
        let url = self.base_url.join(&format!(
            "offers/v1.0/aws/AmazonRDS/current/{region}/index.csv"
        ))?;
        info!(region, %url, "downloading bulk price list");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| AdvisorError::CatalogDownload {
                region: region.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdvisorError::CatalogStatus {
                region: region.to_string(),
                status,
            });
        }
        let body = response
            .text()
            .await
            .map_err(|source| AdvisorError::CatalogDownload {
                region: region.to_string(),
                source,
            })?;

        let table = PriceTable::parse(region, &body)?;
        info!(region, rows = table.len(), "price list loaded");
        Ok(table)
    }
}
