// XLSX audit report export
//
// Two sheets, rendered from a FleetReport:
//   Software Audit          one row per asset, one column per catalog entry
//   Unauthorized Software   one row per finding
// Presentation output only; nothing reads it back.

use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use samaudit_recon::model::{AssetIdentity, FleetReport};
use thiserror::Error;

pub const AUDIT_SHEET: &str = "Software Audit";
pub const FINDINGS_SHEET: &str = "Unauthorized Software";

/// Leading columns shared by both sheets.
pub const IDENTITY_HEADERS: [&str; 4] = ["S. No.", "System Name", "User Name", "Department"];
pub const FINDING_HEADER: &str = "Unauthorized Software";
pub const PRESENT_MARK: &str = "\u{2713}";

const HEADER_FILL: u32 = 0x4F81BD;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("xlsx: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("cannot write {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Export statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportStats {
    pub audit_rows: usize,
    pub finding_rows: usize,
}

struct Styles {
    header: Format,
    cell: Format,
}

impl Styles {
    fn new() -> Self {
        let cell = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin);
        let header = cell
            .clone()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(HEADER_FILL));
        Self { header, cell }
    }
}

/// Write the two-sheet report to `path`, replacing any existing file.
pub fn write_report(report: &FleetReport, path: &Path) -> Result<ReportStats, ReportError> {
    let mut workbook = build_workbook(report)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(ReportError::Io {
                path: path.display().to_string(),
                reason: format!("directory {} does not exist", parent.display()),
            });
        }
    }
    workbook.save(path)?;
    tracing::info!(path = %path.display(), assets = report.rows.len(), findings = report.findings.len(), "report written");
    Ok(ReportStats {
        audit_rows: report.rows.len(),
        finding_rows: report.findings.len(),
    })
}

fn build_workbook(report: &FleetReport) -> Result<Workbook, ReportError> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();

    let audit = workbook.add_worksheet().set_name(AUDIT_SHEET)?;
    write_audit_sheet(audit, report, &styles)?;

    let findings = workbook.add_worksheet().set_name(FINDINGS_SHEET)?;
    write_findings_sheet(findings, report, &styles)?;

    Ok(workbook)
}

fn write_audit_sheet(ws: &mut Worksheet, report: &FleetReport, styles: &Styles) -> Result<(), XlsxError> {
    let mut headers: Vec<&str> = IDENTITY_HEADERS.to_vec();
    headers.extend(report.catalog.iter().map(|c| c.label()));
    let mut widths = ColumnWidths::new(&headers);
    write_header(ws, &headers, styles)?;

    for (i, row) in report.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        write_identity(ws, r, row.index, &row.asset, styles, &mut widths)?;
        for (j, &present) in row.present.iter().enumerate() {
            let col = (IDENTITY_HEADERS.len() + j) as u16;
            if present {
                ws.write_string_with_format(r, col, PRESENT_MARK, &styles.cell)?;
                widths.observe(col, PRESENT_MARK);
            } else {
                ws.write_blank(r, col, &styles.cell)?;
            }
        }
    }

    widths.apply(ws)?;
    ws.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_findings_sheet(ws: &mut Worksheet, report: &FleetReport, styles: &Styles) -> Result<(), XlsxError> {
    let mut headers: Vec<&str> = IDENTITY_HEADERS.to_vec();
    headers.push(FINDING_HEADER);
    let mut widths = ColumnWidths::new(&headers);
    write_header(ws, &headers, styles)?;

    let col = IDENTITY_HEADERS.len() as u16;
    for (i, finding) in report.findings.iter().enumerate() {
        let r = (i + 1) as u32;
        write_identity(ws, r, finding.index, &finding.asset, styles, &mut widths)?;
        ws.write_string_with_format(r, col, finding.software.as_str(), &styles.cell)?;
        widths.observe(col, finding.software.as_str());
    }

    widths.apply(ws)?;
    ws.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_header(ws: &mut Worksheet, headers: &[&str], styles: &Styles) -> Result<(), XlsxError> {
    for (col, text) in headers.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, *text, &styles.header)?;
    }
    Ok(())
}

fn write_identity(
    ws: &mut Worksheet,
    row: u32,
    index: usize,
    asset: &AssetIdentity,
    styles: &Styles,
    widths: &mut ColumnWidths,
) -> Result<(), XlsxError> {
    ws.write_number_with_format(row, 0, index as f64, &styles.cell)?;
    widths.observe(0, &index.to_string());
    let texts = [&asset.asset_name, &asset.owner_user, &asset.department];
    for (offset, text) in texts.into_iter().enumerate() {
        let col = (offset + 1) as u16;
        ws.write_string_with_format(row, col, text.as_str(), &styles.cell)?;
        widths.observe(col, text);
    }
    Ok(())
}

/// Longest rendered value per column, in characters.
struct ColumnWidths(Vec<usize>);

impl ColumnWidths {
    fn new(headers: &[&str]) -> Self {
        Self(headers.iter().map(|h| h.chars().count()).collect())
    }

    fn observe(&mut self, col: u16, text: &str) {
        let len = text.chars().count();
        if let Some(w) = self.0.get_mut(col as usize) {
            *w = (*w).max(len);
        }
    }

    fn apply(&self, ws: &mut Worksheet) -> Result<(), XlsxError> {
        for (col, &w) in self.0.iter().enumerate() {
            ws.set_column_width(col as u16, (w + 2) as f64)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto, Data, Reader};
    use samaudit_recon::{reconcile_asset, AssetRecord, AuditConfig, FleetReportBuilder};

    fn sample_report() -> FleetReport {
        let config = AuditConfig::from_toml(
            r#"
[catalog]
allowed = ["Google Chrome", "Visual Studio"]

[[owners]]
asset = "PC1"
user = "alice"
department = "Finance"
"#,
        )
        .unwrap();

        let mut builder = FleetReportBuilder::new(&config.catalog);
        let classifier = samaudit_recon::Classifier::new(&config.exclusions);
        for (id, name, software) in [
            ("1", "PC1", vec!["Google Chrome 119", "7-Zip"]),
            ("2", "PC2", vec!["VS Code", "PuTTY", "WinSCP"]),
        ] {
            let identity = config.identity_for(&AssetRecord {
                id: id.into(),
                name: name.into(),
            });
            let names: Vec<_> = software
                .into_iter()
                .filter_map(|s| classifier.classify(s).name())
                .collect();
            builder.push(reconcile_asset(identity, &names, &config.catalog));
        }
        builder.finish()
    }

    fn text(cell: &Data) -> String {
        match cell {
            Data::String(s) => s.clone(),
            Data::Float(f) => format!("{}", *f as i64),
            Data::Int(n) => n.to_string(),
            Data::Empty => String::new(),
            other => other.to_string(),
        }
    }

    fn read_sheet(path: &Path, name: &str) -> Vec<Vec<String>> {
        let mut wb = open_workbook_auto(path).unwrap();
        let range = wb.worksheet_range(name).unwrap();
        range.rows().map(|r| r.iter().map(text).collect()).collect()
    }

    #[test]
    fn report_has_expected_sheets_and_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.xlsx");
        let stats = write_report(&sample_report(), &path).unwrap();
        assert_eq!(stats, ReportStats { audit_rows: 2, finding_rows: 3 });

        let wb = open_workbook_auto(&path).unwrap();
        assert_eq!(wb.sheet_names(), vec![AUDIT_SHEET.to_string(), FINDINGS_SHEET.to_string()]);

        let audit = read_sheet(&path, AUDIT_SHEET);
        assert_eq!(
            audit[0],
            vec!["S. No.", "System Name", "User Name", "Department", "Google Chrome", "Visual Studio"]
        );
        assert_eq!(audit[1], vec!["1", "PC1", "alice", "Finance", PRESENT_MARK, ""]);
        assert_eq!(audit[2], vec!["2", "PC2", "unknown", "unknown", "", PRESENT_MARK]);

        let findings = read_sheet(&path, FINDINGS_SHEET);
        assert_eq!(
            findings[0],
            vec!["S. No.", "System Name", "User Name", "Department", "Unauthorized Software"]
        );
        assert_eq!(findings[1], vec!["1", "PC1", "alice", "Finance", "7-zip"]);
        assert_eq!(findings[2][0], "2");
        assert_eq!(findings[3], vec!["3", "PC2", "unknown", "unknown", "winscp"]);
    }

    #[test]
    fn empty_fleet_still_has_headers() {
        let report = FleetReportBuilder::new(&[]).finish();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        write_report(&report, &path).unwrap();

        let audit = read_sheet(&path, AUDIT_SHEET);
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].len(), 4);
        let findings = read_sheet(&path, FINDINGS_SHEET);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("audit.xlsx");
        let err = write_report(&sample_report(), &path).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }

    #[test]
    fn widths_track_longest_value() {
        let mut widths = ColumnWidths::new(&["S. No.", "System Name"]);
        widths.observe(1, "a-very-long-hostname");
        widths.observe(7, "ignored");
        assert_eq!(widths.0, vec![6, 20]);
    }
}
