use serde::Serialize;

/// Placeholder for an owner or department that the mapping does not provide.
pub const UNKNOWN: &str = "unknown";

// ---------------------------------------------------------------------------
// Configuration records
// ---------------------------------------------------------------------------

/// One approved-software label. Catalog order defines report column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CatalogEntry(String);

impl CatalogEntry {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Label as configured (used for report headers).
    pub fn label(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keyword marking any software name that contains it as noise.
/// Stored lower-cased; matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExclusionRule(String);

impl ExclusionRule {
    pub fn new(keyword: &str) -> Self {
        Self(keyword.trim().to_lowercase())
    }

    pub fn keyword(&self) -> &str {
        &self.0
    }
}

/// Owner of a named asset, as given by the user/department mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub user: String,
    pub department: String,
}

// ---------------------------------------------------------------------------
// Inventory input
// ---------------------------------------------------------------------------

/// An asset as listed by the inventory source, before owner resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub id: String,
    pub name: String,
}

/// A single software row reported for one asset. `name` is `None` when the
/// inventory row carried no usable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSoftwareRecord {
    pub name: Option<String>,
}

impl RawSoftwareRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()) }
    }
}

/// Lower-cased, trimmed software name that survived noise filtering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedSoftwareName(String);

impl NormalizedSoftwareName {
    /// Only the classifier builds these.
    pub(crate) fn from_trimmed(trimmed: &str) -> Self {
        Self(trimmed.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NormalizedSoftwareName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetIdentity {
    pub asset_id: String,
    pub asset_name: String,
    pub owner_user: String,
    pub department: String,
}

/// Per-asset compliance: one flag per catalog entry, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceRow {
    /// 1-based over assets in retrieval order.
    pub index: usize,
    pub asset: AssetIdentity,
    pub present: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnauthorizedFinding {
    /// 1-based over all findings in the fleet, not per asset.
    pub index: usize,
    pub asset: AssetIdentity,
    pub software: NormalizedSoftwareName,
}

/// Result of reconciling one asset, before fleet numbering is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReconciliation {
    pub asset: AssetIdentity,
    pub present: Vec<bool>,
    pub unauthorized: Vec<NormalizedSoftwareName>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogCoverage {
    pub entry: CatalogEntry,
    pub assets_with_entry: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FleetSummary {
    pub assets: usize,
    pub unauthorized_findings: usize,
    pub assets_with_findings: usize,
    pub coverage: Vec<CatalogCoverage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditMeta {
    pub engine_version: String,
    pub run_at: String,
}

/// Everything the report renderer needs, in render order.
#[derive(Debug, Clone, Serialize)]
pub struct FleetReport {
    pub meta: AuditMeta,
    pub catalog: Vec<CatalogEntry>,
    pub rows: Vec<ComplianceRow>,
    pub findings: Vec<UnauthorizedFinding>,
    pub summary: FleetSummary,
}
