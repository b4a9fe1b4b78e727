//! Etherscan Balance Client
//!
//! Native balance lookup for wallet addresses. Etherscan answers one
//! address per request, so a batch issues its requests concurrently and
//! fails as a whole if any of them fails at the transport level.

use super::{fields, EnrichmentBatch, EnrichmentClient, EnrichmentError, EnrichmentRecord};
use crate::storage::Identifier;
use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Etherscan REST API client
pub struct EtherscanClient {
    client: Client,
    config: EtherscanConfig,
}

/// Largest supported number of decimal places of a native unit
pub const MAX_DECIMALS: u32 = 36;

/// Configuration for the Etherscan client
#[derive(Debug, Clone)]
pub struct EtherscanConfig {
    /// Base URL (e.g., "https://api.etherscan.io/api")
    pub base_url: String,
    /// API key (may be empty; Etherscan then applies its anonymous rate limit)
    pub api_key: String,
    /// Decimal places of the chain's native unit (18 for ETH)
    pub decimals: u32,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for EtherscanConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.etherscan.io/api".to_string(),
            api_key: String::new(),
            decimals: 18,
            request_timeout_ms: 10_000,
        }
    }
}

impl EtherscanClient {
    /// Create a new client with the given configuration
    pub fn new(config: EtherscanConfig) -> Result<Self, EnrichmentError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("singularity/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &EtherscanConfig {
        &self.config
    }

    fn balance_url(&self, address: &Identifier) -> String {
        format!(
            "{}?module=account&action=balance&address={}&tag=latest&apikey={}",
            self.config.base_url,
            urlencoding::encode(address.as_str()),
            urlencoding::encode(&self.config.api_key)
        )
    }

    /// Fetch the balance of one address
    ///
    /// `Ok(None)` means Etherscan rejected this address alone.
    async fn fetch_balance(
        &self,
        address: &Identifier,
    ) -> Result<Option<EnrichmentRecord>, EnrichmentError> {
        let response = self
            .client
            .get(self.balance_url(address))
            .send()
            .await
            .map_err(|e| EnrichmentError::from_transport(self.name(), e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(EnrichmentError::RateLimited(self.name().to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let body: BalanceResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::InvalidResponse(e.to_string()))?;

        self.interpret(address, body)
    }

    fn interpret(
        &self,
        address: &Identifier,
        body: BalanceResponse,
    ) -> Result<Option<EnrichmentRecord>, EnrichmentError> {
        let result = body.result.as_str().unwrap_or_default().to_string();

        if body.status == "1" {
            let balance = scale_raw_balance(&result, self.config.decimals).ok_or_else(|| {
                EnrichmentError::InvalidResponse(format!("balance is not an integer: {}", result))
            })?;
            return Ok(Some(
                EnrichmentRecord::new()
                    .number(fields::BALANCE, balance)
                    .text(fields::RAW_BALANCE, result),
            ));
        }

        let lowered = result.to_lowercase();
        if lowered.contains("rate limit") {
            Err(EnrichmentError::RateLimited(self.name().to_string()))
        } else if lowered.contains("invalid address") {
            tracing::debug!(address = %address, "Etherscan rejected address");
            Ok(None)
        } else {
            Err(EnrichmentError::ApiError {
                status: StatusCode::OK.as_u16(),
                message: format!("{}: {}", body.message, result),
            })
        }
    }
}

#[async_trait]
impl EnrichmentClient for EtherscanClient {
    fn name(&self) -> &str {
        "etherscan"
    }

    async fn fetch_batch(&self, ids: &[Identifier]) -> Result<EnrichmentBatch, EnrichmentError> {
        let mut batch = EnrichmentBatch::new();
        if ids.is_empty() {
            return Ok(batch);
        }

        let results = join_all(ids.iter().map(|id| self.fetch_balance(id))).await;

        for (id, result) in ids.iter().zip(results) {
            if let Some(record) = result? {
                batch.insert(id.clone(), record);
            }
        }

        tracing::debug!(
            requested = ids.len(),
            returned = batch.len(),
            "Fetched Etherscan balances"
        );
        Ok(batch)
    }
}

/// Convert an integer amount in the smallest unit to whole units
///
/// `"1500000000000000000"` with 18 decimals is `1.5`. More than
/// [`MAX_DECIMALS`] places is not a unit this client can scale.
pub fn scale_raw_balance(raw: &str, decimals: u32) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) || decimals > MAX_DECIMALS {
        return None;
    }
    let value: f64 = raw.parse().ok()?;
    Some(value / 10f64.powi(decimals as i32))
}

// ============================================
// Response DTOs
// ============================================

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}
