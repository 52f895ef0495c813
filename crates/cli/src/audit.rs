//! `samaudit audit` and `samaudit validate`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use samaudit_glpi::{Credentials, GlpiClient, GlpiError};
use samaudit_io::{load_config, write_report, ReportError, ReportStats};
use samaudit_recon::{run_audit, AuditConfig, ConfigError, FleetReport};

use crate::exit_codes::{glpi_exit_code, EXIT_AUDIT_CONFIG, EXIT_AUDIT_REPORT};
use crate::CliError;

pub const URL_ENV: &str = "GLPI_URL";
const DEFAULT_REPORT: &str = "SAM_report.xlsx";

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Path to the .toml config or the .xlsx config workbook
    #[arg(long, short = 'c')]
    pub config: PathBuf,

    /// Path of the xlsx report to write
    #[arg(long, short = 'o', default_value = DEFAULT_REPORT)]
    pub output: PathBuf,

    /// GLPI API base URL (e.g. https://glpi.example.com/apirest.php)
    #[arg(long, env = URL_ENV)]
    pub url: Option<String>,

    /// GLPI application token [env: GLPI_APP_TOKEN]
    #[arg(long)]
    pub app_token: Option<String>,

    /// GLPI user API token [env: GLPI_USER_TOKEN]
    #[arg(long)]
    pub user_token: Option<String>,

    /// Items requested per page (overrides server.page_size)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Per-request timeout in seconds (overrides server.timeout_secs)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the fleet result as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Write the fleet result as JSON to a file
    #[arg(long)]
    pub output_json: Option<PathBuf>,

    /// Suppress per-asset progress and the summary
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

/// Connection settings after flag/env/config precedence is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Connection {
    url: String,
    page_size: usize,
    timeout: Duration,
}

fn config_err(path: &Path, err: ConfigError) -> CliError {
    CliError::new(EXIT_AUDIT_CONFIG, format!("{}: {err}", path.display()))
}

fn glpi_err(err: GlpiError) -> CliError {
    let hint = match &err {
        GlpiError::Http { status: 401, .. } | GlpiError::Http { status: 403, .. } => {
            Some("check the app token and the user API token")
        }
        GlpiError::Transport(_) => Some("is the GLPI URL reachable from this host?"),
        _ => None,
    };
    let cli = CliError::new(glpi_exit_code(&err), err.to_string());
    match hint {
        Some(h) => cli.with_hint(h),
        None => cli,
    }
}

fn report_err(err: ReportError) -> CliError {
    CliError::new(EXIT_AUDIT_REPORT, err.to_string())
}

/// Flag (or GLPI_URL) > config file > error.
fn resolve_connection(args: &AuditArgs, config: &AuditConfig) -> Result<Connection, CliError> {
    let url = args
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .or(config.server.url.as_deref())
        .ok_or_else(|| {
            CliError::new(EXIT_AUDIT_CONFIG, "no GLPI URL configured")
                .with_hint(format!("pass --url, set {URL_ENV}, or set server.url in the config"))
        })?;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(CliError::args(format!("--url must start with http:// or https://, got '{url}'")));
    }

    let page_size = args.page_size.unwrap_or(config.server.page_size);
    if page_size == 0 {
        return Err(CliError::args("--page-size must be at least 1"));
    }
    let timeout_secs = args.timeout.unwrap_or(config.server.timeout_secs);
    if timeout_secs == 0 {
        return Err(CliError::args("--timeout must be at least 1"));
    }

    Ok(Connection {
        url: url.to_string(),
        page_size,
        timeout: Duration::from_secs(timeout_secs),
    })
}

pub fn cmd_audit(args: AuditArgs) -> Result<(), CliError> {
    let config = load_config(&args.config).map_err(|e| config_err(&args.config, e))?;
    let conn = resolve_connection(&args, &config)?;
    let credentials = Credentials::resolve(args.app_token.clone(), args.user_token.clone()).map_err(glpi_err)?;

    tracing::info!(url = %conn.url, page_size = conn.page_size, "connecting to GLPI");
    let mut session = GlpiClient::connect(&conn.url, &credentials, conn.timeout, conn.page_size).map_err(glpi_err)?;

    // On error the session is released when it drops
    let quiet = args.quiet;
    let report = run_audit(&mut session, &config, |i, total, asset| {
        if !quiet {
            eprintln!("processing {i}/{total}: {}", asset.asset_name);
        }
    })
    .map_err(glpi_err)?;

    if let Err(e) = session.close() {
        tracing::warn!(error = %e, "failed to release GLPI session");
    }

    let stats = write_report(&report, &args.output).map_err(report_err)?;
    emit_json(&report, args.json, args.output_json.as_deref())?;

    if !quiet {
        print_summary(&report);
    }
    eprintln!("{}", wrote_line(&args.output, &stats));
    Ok(())
}

fn emit_json(report: &FleetReport, to_stdout: bool, to_file: Option<&Path>) -> Result<(), CliError> {
    if !to_stdout && to_file.is_none() {
        return Ok(());
    }
    let json_str = serde_json::to_string_pretty(report)
        .map_err(|e| CliError::new(EXIT_AUDIT_REPORT, format!("JSON serialization error: {e}")))?;

    if let Some(path) = to_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::new(EXIT_AUDIT_REPORT, format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    if to_stdout {
        println!("{json_str}");
    }
    Ok(())
}

fn wrote_line(path: &Path, stats: &ReportStats) -> String {
    format!(
        "wrote {} ({} asset row(s), {} finding row(s))",
        path.display(),
        stats.audit_rows,
        stats.finding_rows,
    )
}

fn print_summary(report: &FleetReport) {
    let s = &report.summary;
    eprintln!(
        "audited {} asset(s): {} unauthorized finding(s) on {} asset(s)",
        s.assets, s.unauthorized_findings, s.assets_with_findings,
    );
    for c in &s.coverage {
        eprintln!("  {:<32} {}/{}", c.entry.label(), c.assets_with_entry, s.assets);
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path).map_err(|e| config_err(&config_path, e))?;
    eprintln!(
        "valid: {} catalog entr{}, {} exclusion keyword(s), {} owner mapping(s)",
        config.catalog.len(),
        if config.catalog.len() == 1 { "y" } else { "ies" },
        config.exclusions.len(),
        config.owner_count(),
    );
    match &config.server.url {
        Some(url) => eprintln!("server: {url} (page size {})", config.server.page_size),
        None => eprintln!("server: not set (pass --url or set {URL_ENV})"),
    }
    Ok(())
}
