//! # EPES Common Library
//!
//! Transformer servicing records for EPES field engineers:
//! - Record model, field catalogues and validation
//! - Transformer count derivation and sequence generation
//! - The three-stage data-entry wizard
//! - Record persistence (SQLite) behind the `RecordStore` trait
//! - JSON and spreadsheet export
//! - Configuration loading

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod derivation;
pub mod error;
pub mod export;
pub mod model;
pub mod store;
pub mod wizard;

pub use error::{Error, Result};
pub use model::{ClientInfo, OltcInfo, OltcStatus, Record, TransformerCounts, TransformerRecord};
pub use store::{RecordId, RecordStore, RecordSubmitter, RecordSummary, SaveError};
pub use wizard::{Stage, Wizard, WizardError, WizardEvent};
