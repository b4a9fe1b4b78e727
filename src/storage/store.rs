//! Identifier Store
//!
//! Durable, duplicate-free identifier lists on top of a [`KeyValueStore`].
//! Each namespace is one record holding a JSON array of strings; every
//! mutation rewrites the whole record.

use crate::storage::error::{IdentifierError, StorageError};
use crate::storage::kv::KeyValueStore;
use crate::storage::types::{Identifier, Namespace, TrackedList};
use std::sync::Arc;

/// Result of an add or remove
#[derive(Debug)]
pub struct Mutation {
    /// The list after the mutation (in-memory truth for the session)
    pub list: TrackedList,
    /// Whether membership actually changed
    pub changed: bool,
    /// Set when the new list could not be persisted; the stored record is untouched
    pub persist_error: Option<StorageError>,
}

impl Mutation {
    fn unchanged(list: &TrackedList) -> Self {
        Self {
            list: list.clone(),
            changed: false,
            persist_error: None,
        }
    }

    /// True if the new list is both returned and durably stored
    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// Identifier lists persisted per namespace
#[derive(Clone)]
pub struct IdentifierStore {
    kv: Arc<dyn KeyValueStore>,
}

impl IdentifierStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the list for `namespace`
    ///
    /// A missing, unreadable or malformed record yields the namespace's
    /// default list. Nothing is written back.
    pub fn load(&self, namespace: &Namespace) -> TrackedList {
        self.load_with_status(namespace).0
    }

    /// Like [`load`](Self::load), also reporting a storage failure that was recovered from
    pub fn load_with_status(&self, namespace: &Namespace) -> (TrackedList, Option<StorageError>) {
        match self.kv.get(&namespace.key) {
            Ok(Some(json)) => match TrackedList::from_json(namespace.kind, &json) {
                Some(list) => (list, None),
                None => {
                    tracing::warn!(
                        namespace = %namespace.key,
                        "Stored list is malformed, using default"
                    );
                    (namespace.default_list(), None)
                }
            },
            Ok(None) => (namespace.default_list(), None),
            Err(e) => {
                tracing::warn!(
                    namespace = %namespace.key,
                    error = %e,
                    "Failed to read stored list, using default"
                );
                (namespace.default_list(), Some(e))
            }
        }
    }

    /// Append `raw` to `list` unless already present, persisting the result
    ///
    /// Invalid input is rejected before anything is touched.
    pub fn add(
        &self,
        namespace: &Namespace,
        list: &TrackedList,
        raw: &str,
    ) -> Result<Mutation, IdentifierError> {
        let id = namespace.parse(raw)?;
        Ok(self.add_identifier(namespace, list, id))
    }

    /// Append an already-validated identifier
    pub fn add_identifier(
        &self,
        namespace: &Namespace,
        list: &TrackedList,
        id: Identifier,
    ) -> Mutation {
        let (next, changed) = list.with_added(id);
        if !changed {
            return Mutation::unchanged(list);
        }
        self.persist(namespace, next)
    }

    /// Remove `raw` from `list`; absent or unparsable input is a no-op
    pub fn remove(&self, namespace: &Namespace, list: &TrackedList, raw: &str) -> Mutation {
        match namespace.parse(raw) {
            Ok(id) => self.remove_identifier(namespace, list, &id),
            Err(_) => Mutation::unchanged(list),
        }
    }

    /// Remove an already-validated identifier
    pub fn remove_identifier(
        &self,
        namespace: &Namespace,
        list: &TrackedList,
        id: &Identifier,
    ) -> Mutation {
        let (next, changed) = list.without(id);
        if !changed {
            return Mutation::unchanged(list);
        }
        self.persist(namespace, next)
    }

    /// Write the full list for `namespace`
    pub fn save(&self, namespace: &Namespace, list: &TrackedList) -> Result<(), StorageError> {
        self.kv.set(&namespace.key, &list.to_json())
    }

    fn persist(&self, namespace: &Namespace, list: TrackedList) -> Mutation {
        let persist_error = match self.save(namespace, &list) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    namespace = %namespace.key,
                    error = %e,
                    "Failed to persist list, keeping in-memory copy"
                );
                Some(e)
            }
        };

        Mutation {
            list,
            changed: true,
            persist_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::{FileStore, MemoryStore};
    use crate::storage::types::IdentifierKind;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn memory_store() -> (Arc<MemoryStore>, IdentifierStore) {
        let kv = Arc::new(MemoryStore::new());
        let store = IdentifierStore::new(kv.clone());
        (kv, store)
    }

    #[test]
    fn test_load_missing_returns_default_without_writing() {
        let (kv, store) = memory_store();

        let list = store.load(&Namespace::watchlist());
        assert_eq!(list.to_json(), r#"["bitcoin","ethereum","solana"]"#);
        assert!(store.load(&Namespace::portfolio()).is_empty());
        assert!(kv.is_empty());
    }

    #[test]
    fn test_load_malformed_returns_default() {
        let kv = Arc::new(MemoryStore::new().with_record("watchlist", "{oops"));
        let store = IdentifierStore::new(kv);

        let (list, warning) = store.load_with_status(&Namespace::watchlist());
        assert_eq!(list, Namespace::watchlist().default_list());
        assert!(warning.is_none());
    }

    #[test]
    fn test_load_read_failure_returns_default() {
        let (kv, store) = memory_store();
        kv.set_fail_reads(true);

        let (list, warning) = store.load_with_status(&Namespace::watchlist());
        assert_eq!(list, Namespace::watchlist().default_list());
        assert!(matches!(warning, Some(StorageError::Unavailable(_))));
    }

    #[test]
    fn test_add_is_idempotent_and_case_insensitive() {
        let (_kv, store) = memory_store();
        let ns = Namespace::portfolio();
        let list = store.load(&ns);

        let first = store.add(&ns, &list, "SOL").unwrap();
        assert!(first.changed);
        assert!(first.is_persisted());

        let second = store.add(&ns, &first.list, "sol").unwrap();
        assert!(!second.changed);
        assert_eq!(first.list, second.list);

        assert_eq!(store.load(&ns).to_json(), r#"["sol"]"#);
    }

    #[test]
    fn test_add_rejects_invalid_without_mutation() {
        let (kv, store) = memory_store();
        let ns = Namespace::wallets();
        let list = store.load(&ns);

        assert!(matches!(
            store.add(&ns, &list, ""),
            Err(IdentifierError::Empty)
        ));
        assert!(matches!(
            store.add(&ns, &list, "not-an-address"),
            Err(IdentifierError::MalformedAddress(_))
        ));
        assert!(kv.is_empty());
    }

    #[test]
    fn test_addresses_compare_exactly() {
        let (_kv, store) = memory_store();
        let ns = Namespace::wallets();
        let lower = "0xabcdef0000000000000000000000000000000001";
        let upper = "0xABCDEF0000000000000000000000000000000001";

        let m = store.add(&ns, &TrackedList::new(), lower).unwrap();
        let m = store.add(&ns, &m.list, upper).unwrap();
        assert!(m.changed);
        assert_eq!(m.list.len(), 2);
    }

    #[test]
    fn test_remove() {
        let (_kv, store) = memory_store();
        let ns = Namespace::watchlist();
        let list = store.load(&ns);

        let m = store.remove(&ns, &list, "Ethereum");
        assert!(m.changed);
        assert_eq!(m.list.to_json(), r#"["bitcoin","solana"]"#);

        let again = store.remove(&ns, &m.list, "ethereum");
        assert!(!again.changed);

        let garbage = store.remove(&ns, &m.list, "???");
        assert!(!garbage.changed);
        assert_eq!(store.load(&ns).to_json(), r#"["bitcoin","solana"]"#);
    }

    #[test]
    fn test_persist_failure_leaves_store_untouched() {
        let kv = Arc::new(MemoryStore::new().with_record("portfolio", r#"["btc"]"#));
        let store = IdentifierStore::new(kv.clone());
        let ns = Namespace::portfolio();
        let list = store.load(&ns);

        kv.set_fail_writes(true);
        let m = store.add(&ns, &list, "eth").unwrap();
        assert!(m.changed);
        assert!(!m.is_persisted());
        assert_eq!(m.list.to_json(), r#"["btc","eth"]"#);

        kv.set_fail_writes(false);
        assert_eq!(store.load(&ns).to_json(), r#"["btc"]"#);
    }

    #[test]
    fn test_add_remove_sequence_matches_model() {
        let (_kv, store) = memory_store();
        let ns = Namespace::new("scanner", IdentifierKind::CoinId);
        let ops: &[(bool, &str)] = &[
            (true, "Bitcoin"),
            (true, "ethereum"),
            (true, "BITCOIN"),
            (false, "ethereum"),
            (true, "solana"),
            (true, "Ethereum"),
            (false, "dogecoin"),
            (false, "SOLANA"),
        ];

        let mut list = store.load(&ns);
        let mut model: Vec<String> = Vec::new();
        for (is_add, raw) in ops {
            let lower = raw.to_lowercase();
            if *is_add {
                list = store.add(&ns, &list, raw).unwrap().list;
                if !model.contains(&lower) {
                    model.push(lower);
                }
            } else {
                list = store.remove(&ns, &list, raw).list;
                model.retain(|m| *m != lower);
            }
        }

        let actual: Vec<&str> = list.iter().map(|i| i.as_str()).collect();
        assert_eq!(actual, model);
        assert_eq!(store.load(&ns), list);
    }

    /// Add (`true`) or remove (`false`) of a mixed-case coin id from a small alphabet
    fn arb_op() -> impl Strategy<Value = (bool, String)> {
        (any::<bool>(), "[a-cA-C][a-c0-9]{0,1}")
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_add_remove_matches_vec_model(
            ops in proptest::collection::vec(arb_op(), 0..40)
        ) {
            let (_kv, store) = memory_store();
            let ns = Namespace::new("scanner", IdentifierKind::CoinId);

            let mut list = store.load(&ns);
            let mut model: Vec<String> = Vec::new();
            for (is_add, raw) in &ops {
                let lower = raw.to_lowercase();
                if *is_add {
                    list = store.add(&ns, &list, raw).unwrap().list;
                    if !model.contains(&lower) {
                        model.push(lower);
                    }
                } else {
                    list = store.remove(&ns, &list, raw).list;
                    model.retain(|m| *m != lower);
                }
            }

            let actual: Vec<&str> = list.iter().map(|i| i.as_str()).collect();
            prop_assert_eq!(actual, model.iter().map(String::as_str).collect::<Vec<_>>());
            prop_assert_eq!(store.load(&ns), list);
        }

        #[test]
        fn prop_add_is_idempotent(
            ops in proptest::collection::vec(arb_op(), 0..20),
            raw in "[a-cA-C][a-c0-9]{0,1}",
        ) {
            let (kv, store) = memory_store();
            let ns = Namespace::new("scanner", IdentifierKind::CoinId);

            let mut list = store.load(&ns);
            for (is_add, op) in &ops {
                list = if *is_add {
                    store.add(&ns, &list, op).unwrap().list
                } else {
                    store.remove(&ns, &list, op).list
                };
            }

            let once = store.add(&ns, &list, &raw).unwrap();
            let stored = kv.get("scanner").unwrap();
            let twice = store.add(&ns, &once.list, &raw.to_uppercase()).unwrap();

            prop_assert!(!twice.changed);
            prop_assert_eq!(&twice.list, &once.list);
            prop_assert_eq!(kv.get("scanner").unwrap(), stored);
        }
    }

    #[test]
    fn test_file_backed_store() {
        let dir = tempdir().unwrap();
        let kv = Arc::new(FileStore::open(dir.path()).unwrap());
        let store = IdentifierStore::new(kv);
        let ns = Namespace::wallets();
        let addr = "0x00000000219ab540356cBB839Cbe05303d7705Fa";

        let m = store.add(&ns, &store.load(&ns), addr).unwrap();
        assert!(m.is_persisted());

        let reopened = IdentifierStore::new(Arc::new(FileStore::open(dir.path()).unwrap()));
        let list = reopened.load(&ns);
        assert_eq!(list.len(), 1);
        assert_eq!(list.as_slice()[0].as_str(), addr);
    }
}
