//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::portfolio::Valuation;
use crate::sync::SyncView;

// ============================================
// LIST DTOs
// ============================================

/// One registered list
#[derive(Debug, Serialize)]
pub struct ListInfo {
    /// Namespace key
    pub key: String,
    /// "coin_id" or "address"
    pub kind: String,
    /// Enrichment client backing the list
    pub client: String,
    /// Number of tracked identifiers
    pub count: usize,
}

/// List of registered lists
#[derive(Debug, Serialize)]
pub struct ListsResponse {
    pub lists: Vec<ListInfo>,
    pub total: usize,
}

/// Add identifier request
#[derive(Debug, Deserialize)]
pub struct AddIdentifierRequest {
    /// Raw identifier as typed by the user
    pub id: String,
}

// ============================================
// PORTFOLIO DTOs
// ============================================

/// Set holding request
#[derive(Debug, Deserialize)]
pub struct SetHoldingRequest {
    pub amount: f64,
}

/// Portfolio view with valuation
#[derive(Debug, Serialize)]
pub struct PortfolioResponse {
    pub view: SyncView,
    pub valuation: Valuation,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, degraded
    pub status: String,
    /// Storage status
    pub storage: String,
    /// Number of registered lists
    pub lists: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
