//! Core data types for tracked lists
//!
//! This module defines the fundamental types of the persistence layer:
//! - `Identifier`: A validated key naming a tracked entity
//! - `IdentifierKind`: How identifiers of a namespace are normalized and compared
//! - `Namespace`: A named list (watchlist, portfolio, wallets) with its seed
//! - `TrackedList`: Ordered, duplicate-free sequence of identifiers

use crate::storage::error::IdentifierError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Longest identifier accepted from callers
pub const MAX_IDENTIFIER_LEN: usize = 128;

fn coin_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9._-]*$").expect("valid coin id regex"))
}

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid address regex"))
}

/// Kind of identifiers held by a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// Market-data coin id (`bitcoin`, `usd-coin`); lower-cased, compared case-insensitively
    CoinId,
    /// Wallet address (`0xabc...`); stored as received, compared exactly
    Address,
}

impl IdentifierKind {
    /// Validate and normalize raw user input
    pub fn parse(self, raw: &str) -> Result<Identifier, IdentifierError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }
        let len = trimmed.chars().count();
        if len > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong {
                len,
                max: MAX_IDENTIFIER_LEN,
            });
        }

        match self {
            IdentifierKind::CoinId => {
                let normalized = trimmed.to_lowercase();
                if coin_id_pattern().is_match(&normalized) {
                    Ok(Identifier(normalized))
                } else {
                    Err(IdentifierError::MalformedCoinId(trimmed.to_string()))
                }
            }
            IdentifierKind::Address => {
                if address_pattern().is_match(trimmed) {
                    Ok(Identifier(trimmed.to_string()))
                } else {
                    Err(IdentifierError::MalformedAddress(trimmed.to_string()))
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::CoinId => "coin_id",
            IdentifierKind::Address => "address",
        }
    }
}

/// A validated identifier
///
/// Only constructed through [`IdentifierKind::parse`], so a coin id is
/// always lower case and an address always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A named, persisted list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Storage key of the record (`"watchlist"`, `"portfolio"`, `"wallets"`)
    pub key: String,
    /// Kind of identifiers in the list
    pub kind: IdentifierKind,
    /// Raw identifiers returned by `load` when nothing has been persisted yet
    pub seed: Vec<String>,
}

impl Namespace {
    pub fn new(key: impl Into<String>, kind: IdentifierKind) -> Self {
        Self {
            key: key.into(),
            kind,
            seed: Vec::new(),
        }
    }

    /// Builder method: set the default list
    pub fn with_seed<I, S>(mut self, seed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seed = seed.into_iter().map(Into::into).collect();
        self
    }

    /// Coin watchlist, seeded with the dashboard's default coins
    pub fn watchlist() -> Self {
        Self::new("watchlist", IdentifierKind::CoinId).with_seed(["bitcoin", "ethereum", "solana"])
    }

    /// Coins held in the portfolio
    pub fn portfolio() -> Self {
        Self::new("portfolio", IdentifierKind::CoinId)
    }

    /// Watched wallet addresses
    pub fn wallets() -> Self {
        Self::new("wallets", IdentifierKind::Address)
    }

    /// Validate raw input for this namespace
    pub fn parse(&self, raw: &str) -> Result<Identifier, IdentifierError> {
        self.kind.parse(raw)
    }

    /// Seed list, with invalid or repeated entries dropped
    pub fn default_list(&self) -> TrackedList {
        TrackedList::from_raw(self.kind, self.seed.iter().map(String::as_str))
    }
}

/// Ordered, duplicate-free list of identifiers
///
/// Insertion order is the display order. Mutations return a new list, the
/// original is left as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TrackedList {
    items: Vec<Identifier>,
}

impl TrackedList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from raw strings, skipping entries that fail validation
    /// and keeping only the first occurrence of each identifier
    pub fn from_raw<'a>(kind: IdentifierKind, raw: impl IntoIterator<Item = &'a str>) -> Self {
        let mut list = Self::new();
        for value in raw {
            match kind.parse(value) {
                Ok(id) => {
                    if !list.contains(&id) {
                        list.items.push(id);
                    }
                }
                Err(e) => {
                    tracing::warn!(value = %value, error = %e, "Dropping invalid stored identifier");
                }
            }
        }
        list
    }

    /// Parse a persisted JSON array
    ///
    /// Returns `None` when the record is not a JSON array of strings.
    pub fn from_json(kind: IdentifierKind, json: &str) -> Option<Self> {
        let raw: Vec<String> = serde_json::from_str(json).ok()?;
        Some(Self::from_raw(kind, raw.iter().map(String::as_str)))
    }

    /// Serialize as a JSON array of strings
    pub fn to_json(&self) -> String {
        let raw: Vec<&str> = self.items.iter().map(Identifier::as_str).collect();
        serde_json::to_string(&raw).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.items.iter().any(|existing| existing == id)
    }

    /// Returns the list with `id` appended and whether anything changed
    pub fn with_added(&self, id: Identifier) -> (Self, bool) {
        if self.contains(&id) {
            return (self.clone(), false);
        }
        let mut next = self.clone();
        next.items.push(id);
        (next, true)
    }

    /// Returns the list without `id` and whether anything changed
    pub fn without(&self, id: &Identifier) -> (Self, bool) {
        let next: Vec<Identifier> = self.items.iter().filter(|i| *i != id).cloned().collect();
        let changed = next.len() != self.items.len();
        (Self { items: next }, changed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Identifier] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
