//! # Singularity
//!
//! Persistence and synchronization core of the Singularity dashboard: locally
//! tracked coin watchlists, portfolios and wallet addresses, enriched with
//! market data and balances fetched from remote APIs.
//!
//! ## Features
//!
//! - **Durable lists**: ordered, duplicate-free identifier lists that survive restarts
//! - **Fail-soft storage**: missing or unreadable records fall back to defaults,
//!   and a record that could not be read is never overwritten
//! - **Batch enrichment**: one remote call per list, partial results tolerated
//! - **Consistent views**: every entry is pending, enriched or unavailable, and
//!   an older refresh never overwrites a newer one
//!
//! ## Modules
//!
//! - [`storage`]: Key-value capability and the identifier store
//! - [`enrichment`]: Market data and balance clients
//! - [`sync`]: The watchlist synchronizer and its views
//! - [`portfolio`]: Holding amounts and valuation
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use singularity::enrichment::DemoMarketClient;
//! use singularity::storage::{FileStore, IdentifierStore, Namespace};
//! use singularity::sync::WatchlistSynchronizer;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = IdentifierStore::new(Arc::new(FileStore::open("./singularity_data")?));
//!     let sync = WatchlistSynchronizer::new(store)
//!         .register(Namespace::watchlist(), Arc::new(DemoMarketClient::new()));
//!
//!     // Persist a new coin and fetch the whole list
//!     let view = sync.add_and_refresh("watchlist", "dogecoin").await?;
//!
//!     for entry in &view.entries {
//!         println!("{} pending={}", entry.id, entry.is_pending());
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod enrichment;
pub mod format;
pub mod logging;
pub mod portfolio;
pub mod services;
pub mod storage;
pub mod sync;

// Re-export top-level types for convenience
pub use storage::{
    FileStore, Identifier, IdentifierError, IdentifierKind, IdentifierStore, KeyValueStore,
    MemoryStore, Namespace, StorageError, StorageResult, TrackedList,
};

pub use enrichment::{
    CoinGeckoClient, CoinGeckoConfig, DemoMarketClient, EnrichmentBatch, EnrichmentClient,
    EnrichmentError, EnrichmentRecord, EtherscanClient, EtherscanConfig,
};

pub use sync::{EntryStatus, SyncError, SyncView, UnavailableReason, WatchlistSynchronizer};

pub use portfolio::{valuate, Holdings, HoldingsBook, PortfolioError, Valuation};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig, MarketProvider};

pub use services::{ServiceError, Services};
