//! Service wiring
//!
//! Builds the store, the enrichment clients and the synchronizer from a
//! [`Config`]. Both binaries start from here.

use crate::config::{Config, MarketProvider};
use crate::enrichment::{
    CoinGeckoClient, DemoMarketClient, EnrichmentClient, EnrichmentError, EtherscanClient,
};
use crate::portfolio::HoldingsBook;
use crate::storage::{FileStore, IdentifierStore, KeyValueStore, StorageError};
use crate::sync::{SyncError, SyncView, WatchlistSynchronizer};
use std::sync::Arc;
use thiserror::Error;

/// Key of the list whose coins carry holdings
pub const PORTFOLIO: &str = "portfolio";

/// Startup errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to open data directory: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to build enrichment client: {0}")]
    Enrichment(#[from] EnrichmentError),
}

/// Everything a surface needs to serve the lists
#[derive(Clone)]
pub struct Services {
    pub kv: Arc<dyn KeyValueStore>,
    pub sync: Arc<WatchlistSynchronizer>,
    pub holdings: Arc<HoldingsBook>,
}

impl Services {
    /// File-backed services under `config.storage.data_dir`
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        let data_dir = expand_home(&config.storage.data_dir);
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&data_dir)?);
        tracing::info!(data_dir = %data_dir, "Opened list storage");
        Self::with_store(config, kv)
    }

    /// Services over an arbitrary store
    pub fn with_store(config: &Config, kv: Arc<dyn KeyValueStore>) -> Result<Self, ServiceError> {
        let market: Arc<dyn EnrichmentClient> = match config.market.provider {
            MarketProvider::Coingecko => {
                Arc::new(CoinGeckoClient::new(config.market.client_config())?)
            }
            MarketProvider::Demo => {
                tracing::info!("Using demo market data");
                Arc::new(DemoMarketClient::new())
            }
        };
        let balances: Arc<dyn EnrichmentClient> =
            Arc::new(EtherscanClient::new(config.balance.client_config())?);

        Ok(Self::assemble(config, kv, market, balances))
    }

    /// Services with explicit clients for coin lists and wallet lists
    pub fn assemble(
        config: &Config,
        kv: Arc<dyn KeyValueStore>,
        market: Arc<dyn EnrichmentClient>,
        balances: Arc<dyn EnrichmentClient>,
    ) -> Self {
        let [watchlist, portfolio, wallets] = config.lists.namespaces();
        let sync = WatchlistSynchronizer::new(IdentifierStore::new(Arc::clone(&kv)))
            .register(watchlist, Arc::clone(&market))
            .register(portfolio, market)
            .register(wallets, balances);

        Self {
            holdings: Arc::new(HoldingsBook::new(Arc::clone(&kv))),
            sync: Arc::new(sync),
            kv,
        }
    }

    /// See [`remove_tracked`]
    pub async fn remove(&self, namespace: &str, raw: &str) -> Result<SyncView, SyncError> {
        remove_tracked(&self.sync, &self.holdings, namespace, raw).await
    }
}

/// Remove `raw` from `namespace`; removing a portfolio coin also drops its holding
///
/// The list change stands even when the holding cannot be dropped; that
/// failure is only logged.
pub async fn remove_tracked(
    sync: &WatchlistSynchronizer,
    holdings: &HoldingsBook,
    namespace: &str,
    raw: &str,
) -> Result<SyncView, SyncError> {
    let view = sync.remove(namespace, raw).await?;

    if namespace == PORTFOLIO {
        if let Err(e) = holdings.remove(raw) {
            tracing::warn!(coin = %raw.trim(), error = %e, "Failed to drop holding");
        }
    }
    Ok(view)
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).to_string_lossy().to_string(),
        _ => path.to_string(),
    }
}
