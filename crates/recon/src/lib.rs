//! `samaudit-recon`: software compliance reconciliation engine.
//!
//! Pure engine crate: receives configuration and raw inventory rows through
//! [`InventorySource`], returns a numbered [`FleetReport`].
//! No network or file-format dependencies.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;

pub use aggregate::FleetReportBuilder;
pub use classify::{Classified, Classifier, NoiseReason};
pub use config::{AuditConfig, OwnerRow, ServerConfig};
pub use engine::{audit_asset, reconcile_asset, run_audit, InventorySource};
pub use error::ConfigError;
pub use matcher::{is_allowed_anywhere, matches};
pub use model::{
    AssetIdentity, AssetRecord, CatalogEntry, ComplianceRow, ExclusionRule, FleetReport,
    NormalizedSoftwareName, RawSoftwareRecord, UnauthorizedFinding,
};
