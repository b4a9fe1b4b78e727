//! Singularity Storage Layer
//!
//! This module provides local persistence of tracked identifier lists:
//!
//! - **kv**: Key-value capability (`KeyValueStore`) with in-memory and file backends
//! - **types**: Identifiers, namespaces and the ordered `TrackedList`
//! - **store**: `IdentifierStore` with fail-soft load and atomic add/remove
//! - **error**: Error types
//!
//! # Persisted layout
//!
//! ```text
//! <data_dir>/watchlist.json   ["bitcoin","ethereum","solana"]
//! <data_dir>/portfolio.json   ["sol"]
//! <data_dir>/wallets.json     ["0xAbC..."]
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use singularity::storage::{FileStore, IdentifierStore, Namespace};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = IdentifierStore::new(Arc::new(FileStore::open("./singularity_data")?));
//!     let ns = Namespace::watchlist();
//!
//!     let list = store.load(&ns);
//!     let mutation = store.add(&ns, &list, "DOGECOIN")?;
//!     println!("{} coins tracked", mutation.list.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod kv;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{IdentifierError, StorageError, StorageResult};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use store::{IdentifierStore, Mutation};
pub use types::{Identifier, IdentifierKind, Namespace, TrackedList, MAX_IDENTIFIER_LEN};
