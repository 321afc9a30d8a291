//! In-memory price table with first-match reference lookups

use crate::error::{AdvisorError, Result};
use crate::models::InstanceSizing;
use std::collections::HashMap;
use tracing::warn;

/// Lines of file metadata preceding the header row in the bulk download.
const PREAMBLE_LINES: usize = 5;

// Column names after whitespace normalization.
const COL_INSTANCE_TYPE: &str = "InstanceType";
const COL_VCPU: &str = "vCPU";
const COL_MEMORY: &str = "Memory";
const COL_TERM_TYPE: &str = "TermType";
const COL_PURCHASE_OPTION: &str = "PurchaseOption";
const COL_ENGINE: &str = "DatabaseEngine";
const COL_DEPLOYMENT_OPTION: &str = "DeploymentOption";
const COL_PRODUCT_FAMILY: &str = "ProductFamily";
const COL_PRICE_PER_UNIT: &str = "PricePerUnit";

/// Product family of the elastic-capacity offering.
const SERVERLESS_PRODUCT_FAMILY: &str = "ServerlessV2";

/// Pricing dimensions for one provisioned-rate lookup.
#[derive(Debug, Clone)]
pub struct PriceLookup {
    pub engine: String,
    pub instance_class: String,
    pub term_type: String,
    pub purchase_option: String,
    pub deployment_option: String,
}

/// A parsed per-region price list.
///
/// When a lookup matches more than one row, the first row in table order
/// wins and the skipped count is logged.
#[derive(Debug)]
pub struct PriceTable {
    region: String,
    columns: HashMap<String, usize>,
    rows: Vec<csv::StringRecord>,
}

impl PriceTable {
    /// Parse a downloaded price list: skip the metadata preamble, strip
    /// whitespace from column names, keep rows as-is.
    pub fn parse(region: &str, body: &str) -> Result<Self> {
        let data = skip_preamble(body, PREAMBLE_LINES);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data.as_bytes());

        let columns: HashMap<String, usize> = reader
            .headers()
            .map_err(|err| AdvisorError::CatalogShape {
                region: region.to_string(),
                reason: err.to_string(),
            })?
            .iter()
            .enumerate()
            .map(|(index, name)| (name.split_whitespace().collect::<String>(), index))
            .collect();
        if columns.is_empty() {
            return Err(AdvisorError::CatalogShape {
                region: region.to_string(),
                reason: "no header row after preamble".to_string(),
            });
        }

        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| AdvisorError::CatalogShape {
                region: region.to_string(),
                reason: err.to_string(),
            })?;

        Ok(Self {
            region: region.to_string(),
            columns,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn field<'a>(&self, row: &'a csv::StringRecord, column: &str) -> Option<&'a str> {
        self.columns.get(column).and_then(|&index| row.get(index))
    }

    fn first_match(
        &self,
        label: &str,
        predicate: impl Fn(&csv::StringRecord) -> bool,
    ) -> Option<&csv::StringRecord> {
        let mut matches = self.rows.iter().filter(|row| predicate(row));
        let first = matches.next()?;
        let skipped = matches.count();
        if skipped > 0 {
            warn!(
                lookup = label,
                region = %self.region,
                skipped,
                "multiple price list rows matched, using the first in table order"
            );
        }
        Some(first)
    }

    fn numeric_field(&self, row: &csv::StringRecord, column: &str) -> Result<f64> {
        let raw = self.field(row, column).unwrap_or_default().trim();
        raw.parse::<f64>().map_err(|_| AdvisorError::CatalogValue {
            field: column.to_string(),
            value: raw.to_string(),
        })
    }

    /// Sizing attributes for an instance class: first matching row, with
    /// the leading integer extracted from the free-text memory field and
    /// the vCPU count coerced to an integer.
    pub fn lookup_config(&self, instance_class: &str) -> Result<InstanceSizing> {
        let row = self
            .first_match(instance_class, |row| {
                self.field(row, COL_INSTANCE_TYPE) == Some(instance_class)
            })
            .ok_or_else(|| AdvisorError::MissingCatalogEntry {
                instance_class: instance_class.to_string(),
            })?;

        let memory_raw = self.field(row, COL_MEMORY).unwrap_or_default();
        let memory_gb = leading_integer(memory_raw).ok_or_else(|| AdvisorError::CatalogValue {
            field: COL_MEMORY.to_string(),
            value: memory_raw.to_string(),
        })?;

        let vcpu_raw = self.field(row, COL_VCPU).unwrap_or_default().trim();
        let vcpu = vcpu_raw
            .parse::<u32>()
            .map_err(|_| AdvisorError::CatalogValue {
                field: COL_VCPU.to_string(),
                value: vcpu_raw.to_string(),
            })?;

        Ok(InstanceSizing {
            instance_class: instance_class.to_string(),
            memory_gb,
            vcpu,
        })
    }

    /// Hourly provisioned and serverless rates as two independent
    /// first-match lookups. Zero matches on either is a missing price
    /// entry.
    pub fn lookup_price(&self, lookup: &PriceLookup) -> Result<(f64, f64)> {
        let provisioned_row = self
            .first_match("provisioned", |row| {
                self.field(row, COL_INSTANCE_TYPE) == Some(lookup.instance_class.as_str())
                    && self.field(row, COL_TERM_TYPE) == Some(lookup.term_type.as_str())
                    && self.field(row, COL_PURCHASE_OPTION) == Some(lookup.purchase_option.as_str())
                    && self.field(row, COL_ENGINE) == Some(lookup.engine.as_str())
                    && self.field(row, COL_DEPLOYMENT_OPTION)
                        == Some(lookup.deployment_option.as_str())
            })
            .ok_or_else(|| self.missing_price(lookup, "provisioned"))?;
        let provisioned_hourly = self.numeric_field(provisioned_row, COL_PRICE_PER_UNIT)?;

        let serverless_row = self
            .first_match("serverless", |row| {
                self.field(row, COL_PRODUCT_FAMILY) == Some(SERVERLESS_PRODUCT_FAMILY)
                    && self.field(row, COL_ENGINE) == Some(lookup.engine.as_str())
            })
            .ok_or_else(|| self.missing_price(lookup, "serverless"))?;
        let serverless_hourly = self.numeric_field(serverless_row, COL_PRICE_PER_UNIT)?;

        Ok((provisioned_hourly, serverless_hourly))
    }

    fn missing_price(&self, lookup: &PriceLookup, offering: &str) -> AdvisorError {
        AdvisorError::MissingPriceEntry {
            offering: offering.to_string(),
            region: self.region.clone(),
            engine: lookup.engine.clone(),
            instance_class: lookup.instance_class.clone(),
        }
    }
}

fn skip_preamble(body: &str, lines: usize) -> &str {
    let mut remainder = body;
    for _ in 0..lines {
        match remainder.split_once('\n') {
            Some((_, rest)) => remainder = rest,
            None => return "",
        }
    }
    remainder
}

/// First contiguous run of digits in a free-text field, e.g. "32 GiB" -> 32.
fn leading_integer(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
