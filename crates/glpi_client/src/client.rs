//! GLPI REST client.
//!
//! Blocking reqwest client (no Tokio runtime required). A [`Session`] is
//! opened with `initSession` and released with `killSession` on every exit
//! path: [`Session::close`] on success, `Drop` after an error.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use samaudit_recon::engine::InventorySource;
use samaudit_recon::model::{AssetRecord, RawSoftwareRecord};

use crate::auth::Credentials;
use crate::paging::{fetch_all, Endpoint, PageSource};

const USER_AGENT: &str = concat!("samaudit/", env!("CARGO_PKG_VERSION"));

/// GLPI search option holding the software name.
const SOFTWARE_NAME_FIELD: &str = "1";

/// Error type for GLPI operations.
#[derive(Debug, Error)]
pub enum GlpiError {
    /// No token from flag or environment.
    #[error("missing GLPI {what} (use {flag} or set {env})")]
    MissingCredential {
        what: &'static str,
        flag: &'static str,
        env: &'static str,
    },
    /// Request never produced a response (DNS, TLS, timeout, ...).
    #[error("network error: {0}")]
    Transport(String),
    /// Server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// Response body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("page size must be at least 1")]
    InvalidPageSize,
}

impl GlpiError {
    /// Transport-class failure (no response, or a non-success status).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http { .. })
    }
}

/// GLPI API client (blocking). Holds the app token; user sessions are
/// opened with [`GlpiClient::init_session`].
#[derive(Clone)]
pub struct GlpiClient {
    http: reqwest::blocking::Client,
    api_base: String,
    app_token: String,
}

impl GlpiClient {
    pub fn new(api_base: &str, app_token: String, timeout: Duration) -> Result<Self, GlpiError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GlpiError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            app_token,
        })
    }

    /// Exchange the user token for a session token.
    pub fn init_session(&self, user_token: &str, page_size: usize) -> Result<Session, GlpiError> {
        if page_size == 0 {
            return Err(GlpiError::InvalidPageSize);
        }

        let url = self.url("initSession");
        let response = self
            .http
            .post(&url)
            .header("App-Token", &self.app_token)
            .json(&serde_json::json!({ "user_token": user_token }))
            .send()
            .map_err(|e| GlpiError::Transport(e.to_string()))?;
        let body = read_json(response)?;

        let token = body["session_token"]
            .as_str()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GlpiError::MalformedResponse("initSession: missing session_token".into()))?;

        tracing::info!(api_base = %self.api_base, "GLPI session started");
        Ok(Session {
            client: self.clone(),
            token: token.to_string(),
            page_size,
            released: false,
        })
    }

    /// Convenience: build a client and open a session in one step.
    pub fn connect(
        api_base: &str,
        credentials: &Credentials,
        timeout: Duration,
        page_size: usize,
    ) -> Result<Session, GlpiError> {
        Self::new(api_base, credentials.app_token.clone(), timeout)?
            .init_session(&credentials.user_token, page_size)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}

/// An open GLPI session. Released exactly once: by [`Session::close`], or
/// best-effort on drop.
pub struct Session {
    client: GlpiClient,
    token: String,
    page_size: usize,
    released: bool,
}

impl Session {
    /// All non-deleted computers.
    pub fn list_computers(&mut self) -> Result<Vec<AssetRecord>, GlpiError> {
        let endpoint = Endpoint::new("Computer").param("is_deleted", "0");
        let page_size = self.page_size;
        let items = fetch_all(self, &endpoint, page_size)?;
        items.iter().map(parse_computer).collect()
    }

    /// Every software row GLPI links to the given computer id.
    pub fn computer_software(&mut self, computer_id: &str) -> Result<Vec<RawSoftwareRecord>, GlpiError> {
        let endpoint = software_search(computer_id);
        let page_size = self.page_size;
        let items = fetch_all(self, &endpoint, page_size)?;
        Ok(items.iter().map(parse_software).collect())
    }

    /// Release the session, reporting failure to the caller.
    pub fn close(mut self) -> Result<(), GlpiError> {
        self.released = true;
        self.kill()
    }

    fn kill(&self) -> Result<(), GlpiError> {
        let response = self
            .client
            .http
            .get(self.client.url("killSession"))
            .header("App-Token", &self.client.app_token)
            .header("Session-Token", &self.token)
            .send()
            .map_err(|e| GlpiError::Transport(e.to_string()))?;
        check_status(response)?;
        tracing::info!("GLPI session closed");
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.kill() {
            tracing::warn!(error = %e, "failed to release GLPI session");
        }
    }
}

impl PageSource for Session {
    fn fetch_page(&mut self, endpoint: &Endpoint, start: usize, end: usize) -> Result<Value, GlpiError> {
        let range = format!("{start}-{end}");
        let response = self
            .client
            .http
            .get(self.client.url(&endpoint.path))
            .header("App-Token", &self.client.app_token)
            .header("Session-Token", &self.token)
            .query(&endpoint.query)
            .query(&[("range", range.as_str())])
            .send()
            .map_err(|e| GlpiError::Transport(e.to_string()))?;
        read_json(response)
    }
}

impl InventorySource for Session {
    type Error = GlpiError;

    fn list_assets(&mut self) -> Result<Vec<AssetRecord>, GlpiError> {
        self.list_computers()
    }

    fn installed_software(&mut self, asset: &AssetRecord) -> Result<Vec<RawSoftwareRecord>, GlpiError> {
        self.computer_software(&asset.id)
    }
}

// ── Endpoints + parsing ─────────────────────────────────────────────

/// Software search restricted to one computer (meta criterion on the
/// computer id, anchored so `4` does not match `42`).
fn software_search(computer_id: &str) -> Endpoint {
    Endpoint::new("search/Software")
        .param("is_deleted", "0")
        .param("as_map", "0")
        .param("criteria[0][link]", "AND")
        .param("criteria[0][itemtype]", "Computer")
        .param("criteria[0][meta]", "1")
        .param("criteria[0][field]", "2")
        .param("criteria[0][searchtype]", "contains")
        .param("criteria[0][value]", format!("^{computer_id}$"))
}

fn parse_computer(item: &Value) -> Result<AssetRecord, GlpiError> {
    let id = item["id"]
        .as_i64()
        .map(|n| n.to_string())
        .or_else(|| item["id"].as_str().map(String::from))
        .ok_or_else(|| GlpiError::MalformedResponse("computer entry without an id".into()))?;

    let name = match item["name"].as_str() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("Computer-{id}"),
    };

    Ok(AssetRecord { id, name })
}

fn parse_software(item: &Value) -> RawSoftwareRecord {
    RawSoftwareRecord {
        name: item[SOFTWARE_NAME_FIELD].as_str().map(String::from),
    }
}

// ── Response helpers ────────────────────────────────────────────────

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, GlpiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(GlpiError::Http {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }
    Ok(response)
}

fn read_json(response: reqwest::blocking::Response) -> Result<Value, GlpiError> {
    let response = check_status(response)?;
    let text = response
        .text()
        .map_err(|e| GlpiError::Transport(format!("failed to read response body: {e}")))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| {
        GlpiError::MalformedResponse(format!(
            "invalid JSON: {e} (body: {})",
            text.chars().take(200).collect::<String>()
        ))
    })
}
