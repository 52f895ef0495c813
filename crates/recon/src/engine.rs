use crate::aggregate::FleetReportBuilder;
use crate::classify::Classifier;
use crate::config::AuditConfig;
use crate::matcher::{is_allowed_anywhere, matches};
use crate::model::{
    AssetIdentity, AssetRecord, AssetReconciliation, CatalogEntry, FleetReport,
    NormalizedSoftwareName, RawSoftwareRecord,
};

/// Where assets and their installed software come from.
///
/// Implementations must return *complete* inventories or an error; the
/// engine never continues past a failed fetch.
pub trait InventorySource {
    type Error;

    fn list_assets(&mut self) -> Result<Vec<AssetRecord>, Self::Error>;

    fn installed_software(&mut self, asset: &AssetRecord) -> Result<Vec<RawSoftwareRecord>, Self::Error>;
}

/// Reconcile one asset's classified names against the catalog.
pub fn reconcile_asset(
    asset: AssetIdentity,
    names: &[NormalizedSoftwareName],
    catalog: &[CatalogEntry],
) -> AssetReconciliation {
    let present = catalog
        .iter()
        .map(|entry| names.iter().any(|name| matches(name, entry)))
        .collect();

    let unauthorized = names
        .iter()
        .filter(|name| !is_allowed_anywhere(name, catalog))
        .cloned()
        .collect();

    AssetReconciliation {
        asset,
        present,
        unauthorized,
    }
}

/// Classify then reconcile one asset's raw software records.
pub fn audit_asset(
    classifier: &Classifier,
    asset: AssetIdentity,
    software: &[RawSoftwareRecord],
    catalog: &[CatalogEntry],
) -> AssetReconciliation {
    let names = classifier.classify_all(software.iter().map(|r| r.name.as_deref()));
    reconcile_asset(asset, &names, catalog)
}

/// Run a full audit: list assets, then fetch, classify and reconcile each
/// one in listing order.
///
/// `on_asset(index, total, identity)` is called before each asset's software
/// is fetched. The first source error aborts the run and is returned as-is.
pub fn run_audit<S, F>(
    source: &mut S,
    config: &AuditConfig,
    mut on_asset: F,
) -> Result<FleetReport, S::Error>
where
    S: InventorySource,
    F: FnMut(usize, usize, &AssetIdentity),
{
    let classifier = Classifier::new(&config.exclusions);
    let assets = source.list_assets()?;
    let total = assets.len();
    tracing::info!(assets = total, "retrieved asset list");

    let mut builder = FleetReportBuilder::new(&config.catalog);
    for (i, asset) in assets.iter().enumerate() {
        let identity = config.identity_for(asset);
        on_asset(i + 1, total, &identity);

        let software = source.installed_software(asset)?;
        let result = audit_asset(&classifier, identity, &software, &config.catalog);
        tracing::info!(
            asset = %asset.name,
            installed = software.len(),
            unauthorized = result.unauthorized.len(),
            "reconciled asset"
        );
        builder.push(result);
    }

    Ok(builder.finish())
}
