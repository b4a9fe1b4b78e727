//! API Routes
//!
//! Route handlers organized by functionality.

pub mod health;
pub mod lists;
pub mod portfolio;
