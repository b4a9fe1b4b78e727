//! Demo Market Client
//!
//! Canned market figures for running the dashboard without network access.
//! The numbers are fixed sample data, not quotes.

use super::{fields, EnrichmentBatch, EnrichmentClient, EnrichmentError, EnrichmentRecord};
use crate::storage::Identifier;
use async_trait::async_trait;

/// (id, symbol, name, price, market cap, volume, 24h change %)
const DEMO_COINS: &[(&str, &str, &str, f64, f64, f64, f64)] = &[
    ("bitcoin", "btc", "Bitcoin", 67123.0, 1.32e12, 48.0e9, 2.15),
    ("ethereum", "eth", "Ethereum", 3470.0, 420.0e9, 22.0e9, -1.02),
    ("solana", "sol", "Solana", 150.87, 67.0e9, 3.7e9, 4.7),
    ("dogecoin", "doge", "Dogecoin", 0.165, 24.0e9, 2.0e9, 5.9),
    ("arbitrum", "arb", "Arbitrum", 1.24, 3.3e9, 0.9e9, -3.2),
    ("bonk", "bonk", "Bonk", 0.000026, 1.68e9, 0.7e9, 15.2),
    ("pepe", "pepe", "Pepe", 0.000012, 0.6e9, 0.18e9, 9.5),
];

/// Market client serving [`DEMO_COINS`]; unknown ids are omitted
#[derive(Debug, Clone, Default)]
pub struct DemoMarketClient;

impl DemoMarketClient {
    pub fn new() -> Self {
        Self
    }

    /// Ids the demo client knows about
    pub fn known_ids() -> impl Iterator<Item = &'static str> {
        DEMO_COINS.iter().map(|c| c.0)
    }

    fn record_for(id: &str) -> Option<EnrichmentRecord> {
        DEMO_COINS
            .iter()
            .find(|c| c.0 == id)
            .map(|&(_, symbol, name, price, cap, volume, change)| {
                EnrichmentRecord::new()
                    .number(fields::CURRENT_PRICE, price)
                    .number(fields::MARKET_CAP, cap)
                    .number(fields::TOTAL_VOLUME, volume)
                    .number(fields::PRICE_CHANGE_24H, change)
                    .text(fields::SYMBOL, symbol)
                    .text(fields::NAME, name)
            })
    }
}

#[async_trait]
impl EnrichmentClient for DemoMarketClient {
    fn name(&self) -> &str {
        "demo"
    }

    async fn fetch_batch(&self, ids: &[Identifier]) -> Result<EnrichmentBatch, EnrichmentError> {
        Ok(ids
            .iter()
            .filter_map(|id| Self::record_for(id.as_str()).map(|r| (id.clone(), r)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::IdentifierKind;

    #[tokio::test]
    async fn test_demo_batch() {
        let ids: Vec<Identifier> = ["bitcoin", "sol-not-an-id", "pepe"]
            .iter()
            .map(|r| IdentifierKind::CoinId.parse(r).unwrap())
            .collect();

        let batch = DemoMarketClient::new().fetch_batch(&ids).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch[&ids[0]].get_number(fields::CURRENT_PRICE),
            Some(67123.0)
        );
        assert_eq!(batch[&ids[2]].get_text(fields::NAME), Some("Pepe"));
    }

    #[test]
    fn test_known_ids() {
        let known: Vec<&str> = DemoMarketClient::known_ids().collect();
        assert_eq!(known.len(), 7);
        assert!(known.contains(&"solana"));
    }
}
