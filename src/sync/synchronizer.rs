//! Watchlist Synchronizer
//!
//! Keeps each registered namespace's view consistent with its stored list.
//! Every view call loads the list, fetches enrichment for the whole list and
//! publishes the merged result. Published views only move forward: a view
//! produced by an older call never replaces one produced by a newer call.

use crate::enrichment::EnrichmentClient;
use crate::storage::{Identifier, IdentifierError, IdentifierStore, Namespace, TrackedList};
use crate::sync::view::SyncView;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

const HELD_IN_MEMORY: &str = "changes are held in memory only; storage is unavailable";

/// Errors returned to the rendering layer
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),
}

/// A namespace and the client that enriches it
struct Binding {
    namespace: Namespace,
    client: Arc<dyn EnrichmentClient>,
}

/// A membership change that has not reached storage yet
#[derive(Debug, Clone)]
enum Edit {
    Add(Identifier),
    Remove(Identifier),
}

impl Edit {
    fn apply(&self, list: &TrackedList) -> (TrackedList, bool) {
        match self {
            Edit::Add(id) => list.with_added(id.clone()),
            Edit::Remove(id) => list.without(id),
        }
    }
}

/// Session state of a namespace whose changes are not persisted
///
/// `edits` are replayed onto the stored record once it can be read again,
/// so a list loaded while storage was unreadable never replaces it.
#[derive(Debug, Default)]
struct HeldList {
    list: TrackedList,
    edits: Vec<Edit>,
}

impl HeldList {
    fn replay(&self, stored: TrackedList) -> TrackedList {
        self.edits
            .iter()
            .fold(stored, |list, edit| edit.apply(&list).0)
    }
}

/// The list a call works on
struct Current {
    list: TrackedList,
    warning: Option<String>,
    /// False when the stored record could not be read
    readable: bool,
}

/// Orchestrates the identifier store and the enrichment clients
pub struct WatchlistSynchronizer {
    store: IdentifierStore,
    bindings: Vec<Binding>,
    /// Lists with changes that could not be persisted, served instead of the store
    session: Mutex<HashMap<String, HeldList>>,
    /// Newest view per namespace
    published: RwLock<HashMap<String, SyncView>>,
    sequence: AtomicU64,
}

impl WatchlistSynchronizer {
    /// Create a synchronizer without namespaces
    pub fn new(store: IdentifierStore) -> Self {
        Self {
            store,
            bindings: Vec::new(),
            session: Mutex::new(HashMap::new()),
            published: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Builder method: register a namespace with its enrichment client
    ///
    /// Registering a key twice replaces the earlier binding.
    pub fn register(mut self, namespace: Namespace, client: Arc<dyn EnrichmentClient>) -> Self {
        tracing::debug!(
            namespace = %namespace.key,
            kind = namespace.kind.as_str(),
            client = client.name(),
            "Registered namespace"
        );
        self.bindings.retain(|b| b.namespace.key != namespace.key);
        self.bindings.push(Binding { namespace, client });
        self
    }

    /// Registered namespaces, in registration order
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.bindings.iter().map(|b| &b.namespace)
    }

    /// Look up a registered namespace
    pub fn namespace(&self, key: &str) -> Option<&Namespace> {
        self.binding(key).ok().map(|b| &b.namespace)
    }

    /// Name of the client enriching `key`
    pub fn client_name(&self, key: &str) -> Result<&str, SyncError> {
        Ok(self.binding(key)?.client.name())
    }

    fn binding(&self, key: &str) -> Result<&Binding, SyncError> {
        self.bindings
            .iter()
            .find(|b| b.namespace.key == key)
            .ok_or_else(|| SyncError::UnknownNamespace(key.to_string()))
    }

    /// Current list of `key` without fetching anything
    pub async fn list(&self, key: &str) -> Result<TrackedList, SyncError> {
        let binding = self.binding(key)?;
        let session = self.session.lock().await;
        Ok(self.current_list(&session, &binding.namespace).list)
    }

    /// Load the list of `key`, fetch enrichment for all of it and return the merged view
    pub async fn view(&self, key: &str) -> Result<SyncView, SyncError> {
        let binding = self.binding(key)?;
        Ok(self.mutate_and_refresh(binding, None).await)
    }

    /// Add `raw` to `key`, then refresh
    ///
    /// The identifier is part of the returned view even if its enrichment fails.
    pub async fn add_and_refresh(&self, key: &str, raw: &str) -> Result<SyncView, SyncError> {
        let binding = self.binding(key)?;
        let id = binding.namespace.parse(raw)?;
        Ok(self.mutate_and_refresh(binding, Some(Edit::Add(id))).await)
    }

    /// Remove `raw` from `key`, then refresh the reduced list
    ///
    /// Input that cannot be an identifier of this namespace removes nothing.
    pub async fn remove(&self, key: &str, raw: &str) -> Result<SyncView, SyncError> {
        let binding = self.binding(key)?;
        let edit = binding.namespace.parse(raw).ok().map(Edit::Remove);
        Ok(self.mutate_and_refresh(binding, edit).await)
    }

    /// Most recently published view of `key`
    ///
    /// While a synchronization is in flight this is its all-pending view.
    pub async fn latest(&self, key: &str) -> Result<Option<SyncView>, SyncError> {
        self.binding(key)?;
        Ok(self.published.read().await.get(key).cloned())
    }

    /// Apply `edit` under the session lock, then synchronize the resulting snapshot
    ///
    /// The sequence number is taken while the lock is held, so snapshots and
    /// sequence numbers are ordered the same way.
    async fn mutate_and_refresh(&self, binding: &Binding, edit: Option<Edit>) -> SyncView {
        let (list, warning, sequence) = {
            let mut session = self.session.lock().await;
            let current = self.current_list(&session, &binding.namespace);
            let (list, warning) = match edit {
                Some(edit) => self.apply(&mut session, &binding.namespace, current, edit),
                None => (current.list, current.warning),
            };
            (list, warning, self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
        };
        self.refresh(binding, list, warning, sequence).await
    }

    /// Session overlay replayed onto the persisted record
    fn current_list(&self, session: &HashMap<String, HeldList>, namespace: &Namespace) -> Current {
        let (stored, error) = self.store.load_with_status(namespace);
        let held = session.get(&namespace.key);
        match (error, held) {
            (None, None) => Current {
                list: stored,
                warning: None,
                readable: true,
            },
            (None, Some(held)) => Current {
                list: held.replay(stored),
                warning: Some(HELD_IN_MEMORY.to_string()),
                readable: true,
            },
            (Some(e), None) => Current {
                list: stored,
                warning: Some(e.to_string()),
                readable: false,
            },
            (Some(e), Some(held)) => Current {
                list: held.list.clone(),
                warning: Some(e.to_string()),
                readable: false,
            },
        }
    }

    /// Apply one edit, persisting it only when the stored record was readable
    fn apply(
        &self,
        session: &mut HashMap<String, HeldList>,
        namespace: &Namespace,
        current: Current,
        edit: Edit,
    ) -> (TrackedList, Option<String>) {
        let key = namespace.key.as_str();

        if !current.readable {
            let (list, changed) = edit.apply(&current.list);
            if changed {
                tracing::warn!(
                    namespace = %key,
                    edit = ?edit,
                    "Stored list is unreadable, holding change in memory"
                );
                Self::hold(session, key, &list, edit);
            }
            return (list, current.warning);
        }

        let mutation = match &edit {
            Edit::Add(id) => self.store.add_identifier(namespace, &current.list, id.clone()),
            Edit::Remove(id) => self.store.remove_identifier(namespace, &current.list, id),
        };
        if !mutation.changed {
            return (mutation.list, current.warning);
        }

        match &edit {
            Edit::Add(id) => tracing::info!(namespace = %key, id = %id, "Added identifier"),
            Edit::Remove(id) => tracing::info!(namespace = %key, id = %id, "Removed identifier"),
        }
        match mutation.persist_error {
            Some(e) => {
                Self::hold(session, key, &mutation.list, edit);
                (mutation.list, Some(e.to_string()))
            }
            None => {
                session.remove(key);
                (mutation.list, None)
            }
        }
    }

    fn hold(session: &mut HashMap<String, HeldList>, key: &str, list: &TrackedList, edit: Edit) {
        let held = session.entry(key.to_string()).or_default();
        held.list = list.clone();
        held.edits.push(edit);
    }

    /// Run one synchronization over a list snapshot
    async fn refresh(
        &self,
        binding: &Binding,
        list: TrackedList,
        storage_warning: Option<String>,
        sequence: u64,
    ) -> SyncView {
        let key = binding.namespace.key.as_str();

        if list.is_empty() {
            let view = SyncView::pending(key, sequence, &list).with_storage_warning(storage_warning);
            self.publish(view.clone()).await;
            return view;
        }

        self.publish(
            SyncView::pending(key, sequence, &list).with_storage_warning(storage_warning.clone()),
        )
        .await;

        let start = std::time::Instant::now();
        let outcome = binding.client.fetch_batch(list.as_slice()).await;
        match &outcome {
            Ok(batch) => tracing::debug!(
                namespace = %key,
                sequence,
                requested = list.len(),
                returned = batch.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Enrichment batch completed"
            ),
            Err(e) => tracing::warn!(
                namespace = %key,
                sequence,
                client = binding.client.name(),
                error = %e,
                "Enrichment batch failed"
            ),
        }

        let view = SyncView::resolved(key, sequence, &list, outcome)
            .with_storage_warning(storage_warning);
        self.publish(view.clone()).await;
        view
    }

    /// Store `view` unless a newer call already published
    async fn publish(&self, view: SyncView) -> bool {
        let mut published = self.published.write().await;
        if let Some(current) = published.get(&view.namespace) {
            if current.sequence > view.sequence {
                tracing::debug!(
                    namespace = %view.namespace,
                    stale = view.sequence,
                    current = current.sequence,
                    "Discarding superseded view"
                );
                return false;
            }
        }
        published.insert(view.namespace.clone(), view);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{fields, EnrichmentBatch, EnrichmentError, EnrichmentRecord};
    use crate::storage::{Identifier, KeyValueStore, MemoryStore};
    use crate::sync::view::{EntryStatus, UnavailableReason};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    /// Returns fixed prices for known ids, or fails every call
    struct ScriptedClient {
        prices: HashMap<&'static str, f64>,
        fail: bool,
        calls: AtomicUsize,
        requested: StdMutex<Vec<Vec<String>>>,
    }

    impl ScriptedClient {
        fn with_prices(prices: &[(&'static str, f64)]) -> Arc<Self> {
            Arc::new(Self {
                prices: prices.iter().copied().collect(),
                fail: false,
                calls: AtomicUsize::new(0),
                requested: StdMutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                prices: HashMap::new(),
                fail: true,
                calls: AtomicUsize::new(0),
                requested: StdMutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> Vec<String> {
            self.requested.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl EnrichmentClient for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch_batch(
            &self,
            ids: &[Identifier],
        ) -> Result<EnrichmentBatch, EnrichmentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested
                .lock()
                .unwrap()
                .push(ids.iter().map(|i| i.to_string()).collect());
            if self.fail {
                return Err(EnrichmentError::Unavailable("scripted".to_string()));
            }
            Ok(ids
                .iter()
                .filter_map(|id| {
                    self.prices.get(id.as_str()).map(|p| {
                        (
                            id.clone(),
                            EnrichmentRecord::new().number(fields::CURRENT_PRICE, *p),
                        )
                    })
                })
                .collect())
        }
    }

    /// Blocks its first call until released; answers with the call index as price
    struct GatedClient {
        calls: AtomicUsize,
        release: Notify,
        requested: StdMutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl EnrichmentClient for GatedClient {
        fn name(&self) -> &str {
            "gated"
        }

        async fn fetch_batch(
            &self,
            ids: &[Identifier],
        ) -> Result<EnrichmentBatch, EnrichmentError> {
            self.requested
                .lock()
                .unwrap()
                .push(ids.iter().map(|i| i.to_string()).collect());
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                self.release.notified().await;
            }
            Ok(ids
                .iter()
                .map(|id| {
                    (
                        id.clone(),
                        EnrichmentRecord::new().number(fields::CURRENT_PRICE, call as f64),
                    )
                })
                .collect())
        }
    }

    fn synchronizer(
        kv: Arc<MemoryStore>,
        client: Arc<dyn EnrichmentClient>,
    ) -> WatchlistSynchronizer {
        WatchlistSynchronizer::new(IdentifierStore::new(kv))
            .register(Namespace::watchlist(), client.clone())
            .register(Namespace::portfolio(), client.clone())
            .register(Namespace::wallets(), client)
    }

    #[tokio::test]
    async fn test_partial_result_scenario() {
        let kv = Arc::new(MemoryStore::new().with_record("watchlist", r#"["bitcoin","ethereum"]"#));
        let client = ScriptedClient::with_prices(&[("bitcoin", 67123.0)]);
        let sync = synchronizer(kv, client.clone());

        let view = sync.view("watchlist").await.unwrap();

        assert_eq!(client.calls(), 1);
        assert_eq!(view.len(), 2);
        assert_eq!(
            view.get("bitcoin")
                .and_then(|e| e.record())
                .and_then(|r| r.get_number(fields::CURRENT_PRICE)),
            Some(67123.0)
        );
        assert_eq!(
            view.get("ethereum").unwrap().status,
            EntryStatus::Unavailable {
                reason: UnavailableReason::NotReturned
            }
        );
    }

    #[tokio::test]
    async fn test_empty_list_never_calls_client() {
        let client = ScriptedClient::with_prices(&[]);
        let sync = synchronizer(Arc::new(MemoryStore::new()), client.clone());

        let view = sync.view("portfolio").await.unwrap();

        assert!(view.is_empty());
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_total_failure_marks_every_entry() {
        let client = ScriptedClient::failing();
        let sync = synchronizer(Arc::new(MemoryStore::new()), client);

        let view = sync.view("watchlist").await.unwrap();

        assert_eq!(view.len(), 3);
        assert!(view.remote_error.is_some());
        for entry in &view.entries {
            assert!(matches!(
                entry.status,
                EntryStatus::Unavailable {
                    reason: UnavailableReason::RemoteUnavailable(_)
                }
            ));
        }
    }

    #[tokio::test]
    async fn test_add_and_refresh_on_empty_portfolio() {
        let kv = Arc::new(MemoryStore::new());
        let client = ScriptedClient::with_prices(&[("sol", 150.87)]);
        let sync = synchronizer(kv.clone(), client);

        let view = sync.add_and_refresh("portfolio", "SOL").await.unwrap();

        assert_eq!(view.len(), 1);
        let entry = view.get("sol").unwrap();
        assert!(matches!(
            entry.status,
            EntryStatus::Pending | EntryStatus::Enriched { .. }
        ));
        assert_eq!(
            sync.list("portfolio").await.unwrap().to_json(),
            r#"["sol"]"#
        );
        assert_eq!(
            kv.get("portfolio").unwrap().as_deref(),
            Some(r#"["sol"]"#)
        );
    }

    #[tokio::test]
    async fn test_added_identifier_never_dropped() {
        let client = ScriptedClient::with_prices(&[("bitcoin", 1.0)]);
        let sync = synchronizer(Arc::new(MemoryStore::new()), client);

        let view = sync.add_and_refresh("watchlist", "newcoin").await.unwrap();

        assert_eq!(view.len(), 4);
        assert!(view.get("newcoin").unwrap().is_unavailable());
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let client = ScriptedClient::with_prices(&[]);
        let sync = synchronizer(Arc::new(MemoryStore::new()), client);

        let once = sync.add_and_refresh("portfolio", "Bitcoin").await.unwrap();
        let twice = sync.add_and_refresh("portfolio", "BITCOIN").await.unwrap();

        assert_eq!(once.len(), 1);
        assert_eq!(twice.len(), 1);
        assert_eq!(sync.list("portfolio").await.unwrap().to_json(), r#"["bitcoin"]"#);
    }

    #[tokio::test]
    async fn test_invalid_identifier_rejected() {
        let kv = Arc::new(MemoryStore::new());
        let client = ScriptedClient::with_prices(&[]);
        let sync = synchronizer(kv.clone(), client.clone());

        let err = sync.add_and_refresh("wallets", "   ").await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidIdentifier(IdentifierError::Empty)));

        let err = sync.add_and_refresh("wallets", "0xnope").await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidIdentifier(_)));

        assert!(kv.is_empty());
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_namespace() {
        let sync = synchronizer(Arc::new(MemoryStore::new()), ScriptedClient::with_prices(&[]));

        assert!(matches!(
            sync.view("nfts").await,
            Err(SyncError::UnknownNamespace(_))
        ));
        assert!(sync.latest("nfts").await.is_err());
    }

    #[tokio::test]
    async fn test_remove_skips_removed_identifiers() {
        let client = ScriptedClient::with_prices(&[("bitcoin", 1.0), ("solana", 2.0)]);
        let sync = synchronizer(Arc::new(MemoryStore::new()), client.clone());

        let view = sync.remove("watchlist", "ethereum").await.unwrap();

        assert_eq!(view.len(), 2);
        assert!(view.get("ethereum").is_none());
        assert_eq!(client.last_request(), vec!["bitcoin", "solana"]);
    }

    #[tokio::test]
    async fn test_remove_last_identifier_skips_fetch() {
        let kv = Arc::new(MemoryStore::new().with_record("portfolio", r#"["sol"]"#));
        let client = ScriptedClient::with_prices(&[]);
        let sync = synchronizer(kv, client.clone());

        let view = sync.remove("portfolio", "sol").await.unwrap();

        assert!(view.is_empty());
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_every_view_refetches() {
        let client = ScriptedClient::with_prices(&[("bitcoin", 1.0)]);
        let sync = synchronizer(Arc::new(MemoryStore::new()), client.clone());

        let first = sync.view("watchlist").await.unwrap();
        let second = sync.view("watchlist").await.unwrap();

        assert_eq!(client.calls(), 2);
        assert!(second.sequence > first.sequence);
    }

    #[tokio::test]
    async fn test_malformed_storage_falls_back_to_default() {
        let kv = Arc::new(MemoryStore::new().with_record("watchlist", "not json"));
        let client = ScriptedClient::with_prices(&[]);
        let sync = synchronizer(kv, client);

        let view = sync.view("watchlist").await.unwrap();
        assert_eq!(view.len(), 3);
        assert!(view.storage_warning.is_none());
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_session_list() {
        let kv = Arc::new(MemoryStore::new());
        let client = ScriptedClient::with_prices(&[]);
        let sync = synchronizer(kv.clone(), client);

        kv.set_fail_writes(true);
        let view = sync.add_and_refresh("portfolio", "eth").await.unwrap();
        assert_eq!(view.len(), 1);
        assert!(view.storage_warning.is_some());

        // Still served from memory on the next view
        let view = sync.view("portfolio").await.unwrap();
        assert_eq!(view.len(), 1);
        assert!(view.storage_warning.is_some());

        // Once storage recovers the next mutation persists everything
        kv.set_fail_writes(false);
        let view = sync.add_and_refresh("portfolio", "btc").await.unwrap();
        assert!(view.storage_warning.is_none());
        assert_eq!(
            kv.get("portfolio").unwrap().as_deref(),
            Some(r#"["eth","btc"]"#)
        );
    }

    #[tokio::test]
    async fn test_read_failure_reports_warning() {
        let kv = Arc::new(MemoryStore::new());
        kv.set_fail_reads(true);
        let sync = synchronizer(kv, ScriptedClient::with_prices(&[]));

        let view = sync.view("watchlist").await.unwrap();
        assert_eq!(view.len(), 3);
        assert!(view.storage_warning.is_some());
    }

    #[tokio::test]
    async fn test_read_failure_never_overwrites_stored_list() {
        let kv = Arc::new(
            MemoryStore::new().with_record("watchlist", r#"["pepe","bonk","arbitrum"]"#),
        );
        let sync = synchronizer(kv.clone(), ScriptedClient::with_prices(&[]));

        kv.set_fail_reads(true);
        let view = sync.add_and_refresh("watchlist", "dogecoin").await.unwrap();
        assert!(view.storage_warning.is_some());
        assert!(view.get("dogecoin").is_some());
        let view = sync.remove("watchlist", "ethereum").await.unwrap();
        assert!(view.storage_warning.is_some());
        assert!(view.get("ethereum").is_none());

        kv.set_fail_reads(false);
        assert_eq!(
            kv.get("watchlist").unwrap().as_deref(),
            Some(r#"["pepe","bonk","arbitrum"]"#)
        );

        // Held edits are replayed onto the stored record once it is readable
        let view = sync.view("watchlist").await.unwrap();
        assert!(view.storage_warning.is_some());
        let ids: Vec<&str> = view.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["pepe", "bonk", "arbitrum", "dogecoin"]);

        let view = sync.add_and_refresh("watchlist", "ordi").await.unwrap();
        assert!(view.storage_warning.is_none());
        assert_eq!(
            kv.get("watchlist").unwrap().as_deref(),
            Some(r#"["pepe","bonk","arbitrum","dogecoin","ordi"]"#)
        );
    }

    #[tokio::test]
    async fn test_noop_add_during_read_failure_keeps_warning() {
        let kv = Arc::new(MemoryStore::new());
        kv.set_fail_reads(true);
        let sync = synchronizer(kv.clone(), ScriptedClient::with_prices(&[]));

        let view = sync.add_and_refresh("watchlist", "Bitcoin").await.unwrap();

        assert_eq!(view.len(), 3);
        assert!(view.storage_warning.is_some());
        kv.set_fail_reads(false);
        assert!(kv.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_later_mutation_wins_latest() {
        for _ in 0..50 {
            let sync = Arc::new(synchronizer(
                Arc::new(MemoryStore::new()),
                ScriptedClient::with_prices(&[]),
            ));
            let first = {
                let sync = Arc::clone(&sync);
                tokio::spawn(async move { sync.add_and_refresh("portfolio", "eth").await })
            };
            let second = {
                let sync = Arc::clone(&sync);
                tokio::spawn(async move { sync.add_and_refresh("portfolio", "btc").await })
            };
            let first = first.await.unwrap().unwrap();
            let second = second.await.unwrap().unwrap();

            // Whichever mutation ran second saw both ids and carries the higher sequence
            let newest = if first.sequence > second.sequence { first } else { second };
            assert_eq!(newest.len(), 2);
            let latest = sync.latest("portfolio").await.unwrap().unwrap();
            assert_eq!(latest.sequence, newest.sequence);
            assert_eq!(latest.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_older_call_does_not_overwrite_newer_view() {
        let client = Arc::new(GatedClient {
            calls: AtomicUsize::new(0),
            release: Notify::new(),
            requested: StdMutex::new(Vec::new()),
        });
        let sync = Arc::new(synchronizer(Arc::new(MemoryStore::new()), client.clone()));

        let slow = {
            let sync = Arc::clone(&sync);
            tokio::spawn(async move { sync.view("watchlist").await })
        };
        while client.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // The in-flight call has published its pending view
        let pending = sync.latest("watchlist").await.unwrap().unwrap();
        assert!(pending.entries.iter().all(|e| e.is_pending()));

        let fast = sync.view("watchlist").await.unwrap();
        client.release.notify_one();
        let slow = slow.await.unwrap().unwrap();

        assert!(slow.sequence < fast.sequence);
        let latest = sync.latest("watchlist").await.unwrap().unwrap();
        assert_eq!(latest.sequence, fast.sequence);
        assert_eq!(
            latest
                .get("bitcoin")
                .and_then(|e| e.record())
                .and_then(|r| r.get_number(fields::CURRENT_PRICE)),
            Some(1.0)
        );
    }

    #[tokio::test]
    async fn test_in_flight_fetch_uses_snapshot() {
        let client = Arc::new(GatedClient {
            calls: AtomicUsize::new(0),
            release: Notify::new(),
            requested: StdMutex::new(Vec::new()),
        });
        let sync = Arc::new(synchronizer(Arc::new(MemoryStore::new()), client.clone()));

        let slow = {
            let sync = Arc::clone(&sync);
            tokio::spawn(async move { sync.view("watchlist").await })
        };
        while client.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let after_add = sync.add_and_refresh("watchlist", "dogecoin").await.unwrap();
        client.release.notify_one();
        let slow = slow.await.unwrap().unwrap();

        assert_eq!(slow.len(), 3);
        assert!(slow.get("dogecoin").is_none());
        assert_eq!(after_add.len(), 4);

        let requested = client.requested.lock().unwrap().clone();
        assert_eq!(requested[0], vec!["bitcoin", "ethereum", "solana"]);
        assert_eq!(requested[1], vec!["bitcoin", "ethereum", "solana", "dogecoin"]);
    }
}
