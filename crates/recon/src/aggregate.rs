use crate::model::{
    AssetReconciliation, AuditMeta, CatalogCoverage, CatalogEntry, ComplianceRow, FleetReport,
    FleetSummary, UnauthorizedFinding,
};

/// Accumulates per-asset results into a fleet report.
///
/// Owns both counters: the asset index and the fleet-wide finding index.
/// Findings are numbered across the whole fleet, so asset A with two findings
/// followed by asset B with one yields 1, 2, 3.
pub struct FleetReportBuilder {
    catalog: Vec<CatalogEntry>,
    rows: Vec<ComplianceRow>,
    findings: Vec<UnauthorizedFinding>,
}

impl FleetReportBuilder {
    pub fn new(catalog: &[CatalogEntry]) -> Self {
        Self {
            catalog: catalog.to_vec(),
            rows: Vec::new(),
            findings: Vec::new(),
        }
    }

    /// Append one asset. Returns the row index it was given.
    ///
    /// # Panics
    /// If `result.present` does not hold exactly one flag per catalog entry.
    pub fn push(&mut self, result: AssetReconciliation) -> usize {
        assert_eq!(
            result.present.len(),
            self.catalog.len(),
            "asset {} has {} presence flags for {} catalog entries",
            result.asset.asset_name,
            result.present.len(),
            self.catalog.len(),
        );

        let index = self.rows.len() + 1;
        for software in result.unauthorized {
            self.findings.push(UnauthorizedFinding {
                index: self.findings.len() + 1,
                asset: result.asset.clone(),
                software,
            });
        }
        self.rows.push(ComplianceRow {
            index,
            asset: result.asset,
            present: result.present,
        });
        index
    }

    pub fn finish(self) -> FleetReport {
        let coverage = self
            .catalog
            .iter()
            .enumerate()
            .map(|(col, entry)| CatalogCoverage {
                entry: entry.clone(),
                assets_with_entry: self.rows.iter().filter(|r| r.present[col]).count(),
            })
            .collect();

        let mut with_findings: Vec<&str> =
            self.findings.iter().map(|f| f.asset.asset_id.as_str()).collect();
        with_findings.dedup();

        let summary = FleetSummary {
            assets: self.rows.len(),
            unauthorized_findings: self.findings.len(),
            assets_with_findings: with_findings.len(),
            coverage,
        };

        FleetReport {
            meta: AuditMeta {
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            catalog: self.catalog,
            rows: self.rows,
            findings: self.findings,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::model::{AssetIdentity, NormalizedSoftwareName};

    fn identity(id: &str) -> AssetIdentity {
        AssetIdentity {
            asset_id: id.into(),
            asset_name: format!("PC{id}"),
            owner_user: "unknown".into(),
            department: "unknown".into(),
        }
    }

    fn names(raw: &[&str]) -> Vec<NormalizedSoftwareName> {
        let c = Classifier::new(&[]);
        raw.iter().map(|r| c.classify(r).name().unwrap()).collect()
    }

    fn result(id: &str, present: Vec<bool>, unauthorized: &[&str]) -> AssetReconciliation {
        AssetReconciliation {
            asset: identity(id),
            present,
            unauthorized: names(unauthorized),
        }
    }

    #[test]
    fn finding_numbering_is_global() {
        let catalog = vec![CatalogEntry::new("Chrome")];
        let mut builder = FleetReportBuilder::new(&catalog);
        assert_eq!(builder.push(result("1", vec![true], &["winrar", "7-zip"])), 1);
        assert_eq!(builder.push(result("2", vec![false], &["putty"])), 2);

        let report = builder.finish();
        let indices: Vec<_> = report.findings.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(report.findings[2].asset.asset_id, "2");
        assert_eq!(report.findings[2].software.as_str(), "putty");
    }

    #[test]
    fn summary_counts() {
        let catalog = vec![CatalogEntry::new("Chrome"), CatalogEntry::new("Zoom")];
        let mut builder = FleetReportBuilder::new(&catalog);
        builder.push(result("1", vec![true, false], &["winrar", "winrar"]));
        builder.push(result("2", vec![true, true], &[]));
        builder.push(result("3", vec![false, false], &["putty"]));

        let report = builder.finish();
        assert_eq!(report.summary.assets, 3);
        assert_eq!(report.summary.unauthorized_findings, 3);
        assert_eq!(report.summary.assets_with_findings, 2);
        assert_eq!(report.summary.coverage[0].assets_with_entry, 2);
        assert_eq!(report.summary.coverage[1].assets_with_entry, 1);
        let rows: Vec<_> = report.rows.iter().map(|r| r.index).collect();
        assert_eq!(rows, vec![1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "1 presence flags for 2 catalog entries")]
    fn short_presence_row_is_rejected_on_push() {
        let catalog = vec![CatalogEntry::new("Chrome"), CatalogEntry::new("Zoom")];
        let mut builder = FleetReportBuilder::new(&catalog);
        builder.push(result("1", vec![true], &[]));
    }

    #[test]
    fn empty_fleet() {
        let report = FleetReportBuilder::new(&[]).finish();
        assert_eq!(report.summary.assets, 0);
        assert!(report.rows.is_empty());
        assert!(report.findings.is_empty());
    }
}
