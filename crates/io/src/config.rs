// Audit configuration loading (TOML or Excel workbook)
//
// The workbook layout is three sheets, each with a header in row 1:
//   Allowed      A: software label
//   Excluded     A: keyword
//   UserDeptMap  A: asset name, B: user, C: department
// Blank cells are skipped. Connection settings are not read from workbooks.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use samaudit_recon::config::{AuditConfig, OwnerRow, ServerConfig};
use samaudit_recon::error::ConfigError;

pub const ALLOWED_SHEET: &str = "Allowed";
pub const EXCLUDED_SHEET: &str = "Excluded";
pub const OWNER_SHEET: &str = "UserDeptMap";

/// Load a config by extension: `.toml`, or an Excel/ODS workbook.
pub fn load_config(path: &Path) -> Result<AuditConfig, ConfigError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "toml" => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::Io(format!("cannot read {}: {e}", path.display())))?;
            AuditConfig::from_toml(&text)
        }
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_config_workbook(path),
        other => Err(ConfigError::Io(format!(
            "unsupported config format '{other}' (expected .toml or .xlsx)"
        ))),
    }
}

/// Load the three configuration tables from a workbook.
pub fn load_config_workbook(path: &Path) -> Result<AuditConfig, ConfigError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ConfigError::Io(format!("cannot open {}: {e}", path.display())))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    for required in [ALLOWED_SHEET, EXCLUDED_SHEET, OWNER_SHEET] {
        if !sheet_names.iter().any(|n| n == required) {
            return Err(ConfigError::Validation(format!(
                "workbook {} has no '{required}' sheet",
                path.display()
            )));
        }
    }

    let mut read = |name: &str| {
        workbook
            .worksheet_range(name)
            .map_err(|e| ConfigError::Io(format!("cannot read sheet '{name}': {e}")))
    };
    let allowed = read(ALLOWED_SHEET)?;
    let excluded = read(EXCLUDED_SHEET)?;
    let owners = read(OWNER_SHEET)?;

    let allowed = body_rows(&allowed)
        .filter_map(|row| cell_text(&row, 0))
        .collect();
    let excluded = body_rows(&excluded)
        .filter_map(|row| cell_text(&row, 0))
        .collect();
    let owners = body_rows(&owners)
        .filter_map(|row| {
            Some(OwnerRow {
                asset: cell_text(&row, 0)?,
                user: cell_text(&row, 1),
                department: cell_text(&row, 2),
            })
        })
        .collect();

    AuditConfig::from_tables(ServerConfig::default(), allowed, excluded, owners)
}

/// A data row addressed by absolute column index.
struct SheetRow<'a> {
    cells: &'a [Data],
    start_col: usize,
}

/// Rows below the header (absolute row 0), whatever offset the used range
/// starts at.
fn body_rows(range: &Range<Data>) -> impl Iterator<Item = SheetRow<'_>> {
    let (start_row, start_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    range
        .rows()
        .enumerate()
        .filter(move |(i, _)| start_row + i > 0)
        .map(move |(_, cells)| SheetRow { cells, start_col })
}

/// Trimmed, non-blank text of a cell.
fn cell_text(row: &SheetRow<'_>, col: usize) -> Option<String> {
    let data = row.cells.get(col.checked_sub(row.start_col)?)?;
    let text = match data {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
