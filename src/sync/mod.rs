//! Singularity Synchronization
//!
//! Combines the identifier store with the enrichment clients:
//!
//! - **view**: `SyncView`, the merged list-plus-enrichment snapshot
//! - **synchronizer**: `WatchlistSynchronizer`, which produces and publishes views
//!
//! # Example
//!
//! ```rust,no_run
//! use singularity::enrichment::DemoMarketClient;
//! use singularity::storage::{IdentifierStore, MemoryStore, Namespace};
//! use singularity::sync::WatchlistSynchronizer;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = IdentifierStore::new(Arc::new(MemoryStore::new()));
//!     let sync = WatchlistSynchronizer::new(store)
//!         .register(Namespace::watchlist(), Arc::new(DemoMarketClient::new()));
//!
//!     let view = sync.add_and_refresh("watchlist", "dogecoin").await?;
//!     println!("{} of {} entries enriched", view.enriched_count(), view.len());
//!     Ok(())
//! }
//! ```

pub mod synchronizer;
pub mod view;

pub use synchronizer::{SyncError, WatchlistSynchronizer};
pub use view::{EntryStatus, SyncView, UnavailableReason, ViewEntry};
