//! Portfolio Holdings
//!
//! Amount held per coin, persisted next to the identifier lists as one JSON
//! object under the `holdings` key, and the valuation of those amounts
//! against a synchronized portfolio view.

use crate::enrichment::fields;
use crate::storage::{
    Identifier, IdentifierError, IdentifierKind, KeyValueStore, StorageError,
};
use crate::sync::SyncView;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Storage key of the holdings record
pub const HOLDINGS_KEY: &str = "holdings";

/// Errors from holding updates
#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Invalid coin id: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("Invalid amount {0}: must be a finite number >= 0")]
    InvalidAmount(f64),

    #[error("Failed to persist holdings: {0}")]
    Storage(#[from] StorageError),

    #[error("Holdings lock poisoned")]
    Lock,
}

/// Coin id to amount held
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Holdings {
    amounts: BTreeMap<String, f64>,
}

impl Holdings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a persisted JSON object, dropping invalid ids and amounts
    ///
    /// Returns `None` when the record is not a JSON object of numbers.
    pub fn from_json(json: &str) -> Option<Self> {
        let raw: BTreeMap<String, f64> = serde_json::from_str(json).ok()?;
        let mut holdings = Self::new();
        for (coin, amount) in raw {
            if let Err(e) = holdings.set_amount(&coin, amount) {
                tracing::warn!(coin = %coin, error = %e, "Dropping invalid stored holding");
            }
        }
        Some(holdings)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.amounts).unwrap_or_else(|_| "{}".to_string())
    }

    /// Set the amount held of `coin`; zero removes the holding
    pub fn set_amount(&mut self, coin: &str, amount: f64) -> Result<Identifier, PortfolioError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(PortfolioError::InvalidAmount(amount));
        }
        let id = IdentifierKind::CoinId.parse(coin)?;
        if amount == 0.0 {
            self.amounts.remove(id.as_str());
        } else {
            self.amounts.insert(id.as_str().to_string(), amount);
        }
        Ok(id)
    }

    /// Drop the holding of `coin`, returning whether one existed
    pub fn remove(&mut self, coin: &str) -> bool {
        match IdentifierKind::CoinId.parse(coin) {
            Ok(id) => self.amounts.remove(id.as_str()).is_some(),
            Err(_) => false,
        }
    }

    pub fn amount_of(&self, coin: &str) -> Option<f64> {
        self.amounts.get(coin).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.amounts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

/// Persisted holdings
///
/// Updates are read-modify-write on the whole record and serialized by an
/// internal lock.
pub struct HoldingsBook {
    kv: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl HoldingsBook {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    /// Load holdings; a missing, unreadable or malformed record is empty
    pub fn load(&self) -> Holdings {
        match self.kv.get(HOLDINGS_KEY) {
            Ok(Some(json)) => Holdings::from_json(&json).unwrap_or_else(|| {
                tracing::warn!("Stored holdings are malformed, starting empty");
                Holdings::new()
            }),
            Ok(None) => Holdings::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read holdings, starting empty");
                Holdings::new()
            }
        }
    }

    /// Holdings to update; unlike [`load`](Self::load) a read failure is an error
    fn load_for_update(&self) -> Result<Holdings, PortfolioError> {
        Ok(match self.kv.get(HOLDINGS_KEY)? {
            Some(json) => Holdings::from_json(&json).unwrap_or_else(|| {
                tracing::warn!("Stored holdings are malformed, replacing them");
                Holdings::new()
            }),
            None => Holdings::new(),
        })
    }

    /// Set and persist the amount held of `coin`
    ///
    /// Fails without writing if the stored holdings cannot be read.
    pub fn set_amount(&self, coin: &str, amount: f64) -> Result<Holdings, PortfolioError> {
        let _guard = self.write_lock.lock().map_err(|_| PortfolioError::Lock)?;
        let mut holdings = self.load_for_update()?;
        let id = holdings.set_amount(coin, amount)?;
        self.kv.set(HOLDINGS_KEY, &holdings.to_json())?;
        tracing::info!(coin = %id, amount, "Updated holding");
        Ok(holdings)
    }

    /// Drop and persist the holding of `coin`; unknown coins are a no-op
    pub fn remove(&self, coin: &str) -> Result<Holdings, PortfolioError> {
        let _guard = self.write_lock.lock().map_err(|_| PortfolioError::Lock)?;
        let mut holdings = self.load_for_update()?;
        if holdings.remove(coin) {
            self.kv.set(HOLDINGS_KEY, &holdings.to_json())?;
        }
        Ok(holdings)
    }
}

/// One priced position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationRow {
    pub id: Identifier,
    pub amount: f64,
    /// Current price, absent when the entry has no record
    pub price: Option<f64>,
    /// `amount * price`, absent without a price
    pub value: Option<f64>,
}

/// Valuation of a portfolio view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    pub rows: Vec<ValuationRow>,
    /// Sum over rows that have a value
    pub total_value: f64,
}

/// Price every entry of `view` with the amounts in `holdings`
///
/// Rows follow view order. Coins without a holding count as amount zero.
pub fn valuate(view: &SyncView, holdings: &Holdings) -> Valuation {
    let rows: Vec<ValuationRow> = view
        .entries
        .iter()
        .map(|entry| {
            let amount = holdings.amount_of(entry.id.as_str()).unwrap_or(0.0);
            let price = entry
                .record()
                .and_then(|r| r.get_number(fields::CURRENT_PRICE));
            ValuationRow {
                id: entry.id.clone(),
                amount,
                price,
                value: price.map(|p| p * amount),
            }
        })
        .collect();

    let total_value = rows.iter().filter_map(|r| r.value).sum();
    Valuation { rows, total_value }
}
