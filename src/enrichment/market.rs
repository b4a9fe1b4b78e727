//! CoinGecko Market Data Client
//!
//! Batch lookup of price, market cap and 24h change for coin ids via
//! `GET /coins/markets`.

use super::{fields, EnrichmentBatch, EnrichmentClient, EnrichmentError, EnrichmentRecord};
use crate::storage::Identifier;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;

/// Page size limit of `/coins/markets`
const MAX_IDS_PER_REQUEST: usize = 250;

/// CoinGecko REST API client
pub struct CoinGeckoClient {
    client: Client,
    config: CoinGeckoConfig,
}

/// Configuration for the CoinGecko client
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    /// Base URL (e.g., "https://api.coingecko.com/api/v3")
    pub base_url: String,
    /// Quote currency code ("usd")
    pub vs_currency: String,
    /// Optional demo API key, sent as `x-cg-demo-api-key`
    pub api_key: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            vs_currency: "usd".to_string(),
            api_key: None,
            request_timeout_ms: 10_000,
        }
    }
}

impl CoinGeckoClient {
    /// Create a new client with the given configuration
    pub fn new(config: CoinGeckoConfig) -> Result<Self, EnrichmentError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("singularity/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &CoinGeckoConfig {
        &self.config
    }

    fn markets_url(&self, ids: &[Identifier]) -> String {
        let joined = ids
            .iter()
            .map(Identifier::as_str)
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}/coins/markets?vs_currency={}&ids={}&per_page={}&page=1",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.vs_currency),
            urlencoding::encode(&joined),
            MAX_IDS_PER_REQUEST
        )
    }

    /// Fetch one page of markets
    async fn fetch_markets(&self, ids: &[Identifier]) -> Result<Vec<MarketCoin>, EnrichmentError> {
        let url = self.markets_url(ids);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.config.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request
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

        response
            .json::<Vec<MarketCoin>>()
            .await
            .map_err(|e| EnrichmentError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl EnrichmentClient for CoinGeckoClient {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch_batch(&self, ids: &[Identifier]) -> Result<EnrichmentBatch, EnrichmentError> {
        let mut batch = EnrichmentBatch::new();
        if ids.is_empty() {
            return Ok(batch);
        }

        let requested: HashMap<&str, &Identifier> =
            ids.iter().map(|id| (id.as_str(), id)).collect();

        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            let coins = self.fetch_markets(chunk).await?;
            tracing::debug!(
                requested = chunk.len(),
                returned = coins.len(),
                "Fetched CoinGecko markets"
            );

            for coin in coins {
                // The API echoes ids in lower case; ignore anything we did not ask for
                let Some(id) = requested.get(coin.id.to_lowercase().as_str()) else {
                    continue;
                };
                batch.insert((*id).clone(), coin.into_record());
            }
        }

        Ok(batch)
    }
}

// ============================================
// Response DTOs
// ============================================

#[derive(Debug, Deserialize)]
struct MarketCoin {
    id: String,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    current_price: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    total_volume: Option<f64>,
    #[serde(default)]
    price_change_percentage_24h: Option<f64>,
}

impl MarketCoin {
    fn into_record(self) -> EnrichmentRecord {
        EnrichmentRecord::new()
            .maybe_number(fields::CURRENT_PRICE, self.current_price)
            .maybe_number(fields::MARKET_CAP, self.market_cap)
            .maybe_number(fields::TOTAL_VOLUME, self.total_volume)
            .maybe_number(fields::PRICE_CHANGE_24H, self.price_change_percentage_24h)
            .maybe_text(fields::SYMBOL, self.symbol)
            .maybe_text(fields::NAME, self.name)
    }
}
