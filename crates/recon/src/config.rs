use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{AssetIdentity, AssetRecord, CatalogEntry, ExclusionRule, Owner, UNKNOWN};

pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// File shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AuditConfigFile {
    #[serde(default)]
    server: ServerConfig,
    catalog: CatalogSection,
    #[serde(default)]
    owners: Vec<OwnerRow>,
}

#[derive(Debug, Deserialize)]
struct CatalogSection {
    allowed: Vec<String>,
    #[serde(default)]
    excluded: Vec<String>,
}

/// One row of the asset → (user, department) mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerRow {
    pub asset: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Connection settings. Tokens never live here; they come from flags or env.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Validated config
// ---------------------------------------------------------------------------

/// Validated audit configuration. Built once at startup; the engine only
/// ever sees this form, never the raw tables.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub server: ServerConfig,
    pub catalog: Vec<CatalogEntry>,
    pub exclusions: Vec<ExclusionRule>,
    owners: HashMap<String, Owner>,
}

impl AuditConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let file: AuditConfigFile =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_tables(file.server, file.catalog.allowed, file.catalog.excluded, file.owners)
    }

    /// Build from the three configuration tables.
    ///
    /// Catalog entries and owner keys are trimmed and must be non-blank.
    /// Blank exclusion keywords are dropped: an empty keyword is a substring
    /// of every name.
    pub fn from_tables(
        server: ServerConfig,
        allowed: Vec<String>,
        excluded: Vec<String>,
        owners: Vec<OwnerRow>,
    ) -> Result<Self, ConfigError> {
        let mut catalog = Vec::with_capacity(allowed.len());
        for (i, label) in allowed.iter().enumerate() {
            let label = label.trim();
            if label.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "catalog entry #{} is blank",
                    i + 1
                )));
            }
            catalog.push(CatalogEntry::new(label));
        }

        let exclusions = excluded
            .iter()
            .filter(|k| !k.trim().is_empty())
            .map(|k| ExclusionRule::new(k))
            .collect();

        let mut owner_map = HashMap::with_capacity(owners.len());
        for row in owners {
            let asset = row.asset.trim();
            if asset.is_empty() {
                return Err(ConfigError::Validation("owner mapping has a blank asset name".into()));
            }
            let owner = Owner {
                user: or_unknown(row.user.as_deref()),
                department: or_unknown(row.department.as_deref()),
            };
            if owner_map.insert(asset.to_string(), owner).is_some() {
                return Err(ConfigError::DuplicateOwner(asset.to_string()));
            }
        }

        let config = Self {
            server,
            catalog,
            exclusions,
            owners: owner_map,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.page_size == 0 {
            return Err(ConfigError::Validation("server.page_size must be at least 1".into()));
        }
        if self.server.timeout_secs == 0 {
            return Err(ConfigError::Validation("server.timeout_secs must be at least 1".into()));
        }
        if let Some(url) = &self.server.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "server.url must start with http:// or https://, got '{url}'"
                )));
            }
        }
        if self.catalog.is_empty() {
            tracing::warn!("catalog is empty: every software name outside the VS shortcut will be unauthorized");
        }
        Ok(())
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Resolve the owner of an asset by exact name, falling back to "unknown".
    pub fn identity_for(&self, asset: &AssetRecord) -> AssetIdentity {
        let (owner_user, department) = match self.owners.get(&asset.name) {
            Some(owner) => (owner.user.clone(), owner.department.clone()),
            None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
        };
        AssetIdentity {
            asset_id: asset.id.clone(),
            asset_name: asset.name.clone(),
            owner_user,
            department,
        }
    }
}

fn or_unknown(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
