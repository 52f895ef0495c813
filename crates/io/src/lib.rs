// File I/O: audit configuration loading and the xlsx report
pub mod config;
pub mod report;

pub use config::{load_config, load_config_workbook};
pub use report::{write_report, ReportError, ReportStats};
