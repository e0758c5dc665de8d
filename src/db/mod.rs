//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - The repository owning the additive ledger and transaction log

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::{ReconcileReport, Repository};
