//! AuditChain - a tamper-evident hash chain over tabular audit records
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Hash Chain
//! - [`blockchain`] - Chain construction, verification and the shared ledger
//! - [`schema`] - Canonical field serialization for hashing
//! - [`record`] - Schema-less record and value types
//!
//! ## Data & Models
//! - [`dataset`] - CSV ingestion
//! - [`classifier`] - Binary classifier (logistic regression)
//! - [`cache`] - Memoization of datasets and trained models
//!
//! ## Presentation
//! - [`dashboard`] - Table rendering
//! - [`cli`] - Dashboard wiring used by the binaries
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```
//! use auditchain::blockchain::{build, verify, GENESIS_HASH};
//! use auditchain::record::Record;
//! use auditchain::schema::ChainSchema;
//!
//! let rows = vec![
//!     Record::new().with("state", "X").with("date", "1").with("new_cases", 2).with("deaths", 0),
//! ];
//! let chain = build(&rows, &ChainSchema::covid()).unwrap();
//! assert_eq!(chain[0].previous_hash, GENESIS_HASH);
//! assert!(verify(&chain, &ChainSchema::covid()).is_valid());
//! ```

#![forbid(unsafe_code)]

// ============================================================================
// Core Hash Chain
// ============================================================================
pub mod blockchain;
pub mod record;
pub mod schema;

// ============================================================================
// Data & Models
// ============================================================================
pub mod cache;
pub mod classifier;
pub mod dataset;

// ============================================================================
// Presentation
// ============================================================================
pub mod cli;
pub mod dashboard;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
