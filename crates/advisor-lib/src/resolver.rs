//! Live instance configuration resolution
//!
//! Joins roster entries with the inventory API's view of each instance
//! and the bulk price list's sizing attributes. Any failure excludes the
//! one instance; it never aborts the rest of the roster.

use crate::error::{AdvisorError, Result};
use crate::models::{RosterEntry, TrackedInstance};
use crate::pricing::PriceTable;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Runtime description of one database instance.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceDescription {
    pub identifier: String,
    pub instance_class: String,
}

/// Client for the inventory API's instance description endpoint.
pub struct InventoryClient {
    client: Client,
    base_url: Url,
}

impl InventoryClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let base_url = Url::parse(base_url)?;
        Ok(Self { client, base_url })
    }

    /// Query the live configuration of one instance.
    pub async fn describe_instance(
        &self,
        region: &str,
        identifier: &str,
    ) -> Result<InstanceDescription> {
        let url = self
            .base_url
            .join(&format!("v1/instances/{region}/{identifier}"))?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdvisorError::InventoryStatus {
                identifier: identifier.to_string(),
                status,
            });
        }
        Ok(response.json().await?)
    }
}

/// Joins roster entries with live configuration and catalog sizing.
pub struct InstanceConfigResolver<'a> {
    inventory: &'a InventoryClient,
    sizing_table: &'a PriceTable,
}

impl<'a> InstanceConfigResolver<'a> {
    pub fn new(inventory: &'a InventoryClient, sizing_table: &'a PriceTable) -> Self {
        Self {
            inventory,
            sizing_table,
        }
    }

    /// Resolve one roster entry into a fully sized tracked instance.
    pub async fn resolve(&self, entry: &RosterEntry) -> Result<TrackedInstance> {
        let description = self
            .inventory
            .describe_instance(&entry.region, &entry.instance)
            .await?;
        let sizing = self.sizing_table.lookup_config(&description.instance_class)?;
        debug!(
            identifier = %entry.instance,
            instance_class = %sizing.instance_class,
            "resolved instance configuration"
        );
        Ok(TrackedInstance {
            identifier: entry.instance.clone(),
            region: entry.region.clone(),
            instance_class: sizing.instance_class,
            memory_gb: sizing.memory_gb,
            vcpu: sizing.vcpu,
        })
    }
}
