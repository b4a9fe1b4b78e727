//! Remote Enrichment
//!
//! Maps a batch of tracked identifiers to data fetched from a remote source.
//!
//! ## Clients
//!
//! - **CoinGeckoClient**: market data for coin ids (price, market cap, 24h change)
//! - **EtherscanClient**: native balance for wallet addresses
//! - **DemoMarketClient**: canned figures for offline/demo use
//!
//! ## Failure model
//!
//! - Identifiers the remote does not know are absent from the returned batch
//! - Anything else (transport error, non-2xx, rate limit, bad body) fails the
//!   whole call; no partial or stale data is returned
//! - One attempt per call, no retry or backoff

mod balance;
mod demo;
mod market;

pub use balance::{EtherscanClient, EtherscanConfig, MAX_DECIMALS};
pub use demo::DemoMarketClient;
pub use market::{CoinGeckoClient, CoinGeckoConfig};

use crate::storage::Identifier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Field names shared by the market-data clients
pub mod fields {
    pub const CURRENT_PRICE: &str = "current_price";
    pub const MARKET_CAP: &str = "market_cap";
    pub const PRICE_CHANGE_24H: &str = "price_change_percentage_24h";
    pub const TOTAL_VOLUME: &str = "total_volume";
    pub const SYMBOL: &str = "symbol";
    pub const NAME: &str = "name";
    pub const BALANCE: &str = "balance";
    pub const RAW_BALANCE: &str = "raw_balance";
}

/// Common trait for all enrichment sources
///
/// Market-data and balance clients expose the same batch shape so the
/// synchronizer does not care which one backs a namespace.
#[async_trait]
pub trait EnrichmentClient: Send + Sync {
    /// Short name used in logs and error messages
    fn name(&self) -> &str;

    /// Fetch records for `ids`
    ///
    /// An empty slice returns an empty batch without touching the network.
    async fn fetch_batch(&self, ids: &[Identifier]) -> Result<EnrichmentBatch, EnrichmentError>;
}

/// Records keyed by the identifier they belong to
pub type EnrichmentBatch = HashMap<Identifier, EnrichmentRecord>;

/// A single enrichment value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

/// Remote-sourced data attached to one identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrichmentRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl EnrichmentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add a numeric field
    pub fn number(mut self, name: impl Into<String>, value: f64) -> Self {
        self.fields.insert(name.into(), FieldValue::Number(value));
        self
    }

    /// Builder method: add a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), FieldValue::Text(value.into()));
        self
    }

    /// Builder method: add a numeric field only if present
    pub fn maybe_number(self, name: &str, value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => self.number(name, v),
            _ => self,
        }
    }

    /// Builder method: add a text field only if present
    pub fn maybe_text(self, name: &str, value: Option<String>) -> Self {
        match value {
            Some(v) => self.text(name, v),
            None => self,
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Numeric value of `name`, if present and numeric
    pub fn get_number(&self, name: &str) -> Option<f64> {
        match self.fields.get(name) {
            Some(FieldValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    /// Text value of `name`, if present and textual
    pub fn get_text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Errors that make a whole batch unavailable
#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("{0} unavailable")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited by {0}")]
    RateLimited(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl EnrichmentError {
    /// Classify a transport-level failure
    pub(crate) fn from_transport(client: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EnrichmentError::Timeout
        } else if err.is_connect() {
            EnrichmentError::Unavailable(client.to_string())
        } else {
            EnrichmentError::Request(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builders() {
        let record = EnrichmentRecord::new()
            .number(fields::CURRENT_PRICE, 67123.0)
            .text(fields::SYMBOL, "btc")
            .maybe_number(fields::MARKET_CAP, None)
            .maybe_number(fields::TOTAL_VOLUME, Some(f64::NAN))
            .maybe_text(fields::NAME, Some("Bitcoin".to_string()));

        assert_eq!(record.len(), 3);
        assert_eq!(record.get_number(fields::CURRENT_PRICE), Some(67123.0));
        assert_eq!(record.get_text(fields::SYMBOL), Some("btc"));
        assert_eq!(record.get_number(fields::SYMBOL), None);
        assert!(record.get(fields::MARKET_CAP).is_none());
    }

    #[test]
    fn test_record_serializes_as_flat_map() {
        let record = EnrichmentRecord::new()
            .number(fields::CURRENT_PRICE, 1.5)
            .text(fields::NAME, "Solana");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"current_price": 1.5, "name": "Solana"})
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            EnrichmentError::RateLimited("coingecko".to_string()).to_string(),
            "Rate limited by coingecko"
        );
        assert_eq!(
            EnrichmentError::ApiError {
                status: 503,
                message: "down".to_string()
            }
            .to_string(),
            "API error 503: down"
        );
    }
}
