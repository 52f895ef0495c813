//! Credential resolution.
//!
//! Tokens come from a CLI flag or the environment, never from the config
//! file. Flag wins over env; a blank value counts as missing.

use crate::client::GlpiError;

pub const APP_TOKEN_ENV: &str = "GLPI_APP_TOKEN";
pub const USER_TOKEN_ENV: &str = "GLPI_USER_TOKEN";

/// GLPI API credentials: the application token plus the user's API token.
#[derive(Clone)]
pub struct Credentials {
    pub app_token: String,
    pub user_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_token", &"<redacted>")
            .field("user_token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(app_token: impl Into<String>, user_token: impl Into<String>) -> Self {
        Self {
            app_token: app_token.into(),
            user_token: user_token.into(),
        }
    }

    /// Resolve both tokens: flag > env > error.
    pub fn resolve(app_flag: Option<String>, user_flag: Option<String>) -> Result<Self, GlpiError> {
        Ok(Self {
            app_token: resolve_token(app_flag, "app token", "--app-token", APP_TOKEN_ENV)?,
            user_token: resolve_token(user_flag, "user token", "--user-token", USER_TOKEN_ENV)?,
        })
    }
}

fn resolve_token(
    flag: Option<String>,
    what: &'static str,
    flag_name: &'static str,
    env_var: &'static str,
) -> Result<String, GlpiError> {
    let missing = || GlpiError::MissingCredential {
        what,
        flag: flag_name,
        env: env_var,
    };

    if let Some(value) = flag {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(missing());
        }
        return Ok(trimmed.to_string());
    }

    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(missing()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_and_is_trimmed() {
        let token = resolve_token(Some("  abc  ".into()), "app token", "--app-token", "SAMAUDIT_TEST_UNSET_1").unwrap();
        assert_eq!(token, "abc");
    }

    #[test]
    fn blank_flag_is_missing() {
        let err = resolve_token(Some("   ".into()), "app token", "--app-token", "SAMAUDIT_TEST_UNSET_2").unwrap_err();
        assert!(matches!(err, GlpiError::MissingCredential { what: "app token", .. }));
        assert!(err.to_string().contains("--app-token"));
        assert!(err.to_string().contains("SAMAUDIT_TEST_UNSET_2"));
    }

    #[test]
    fn absent_flag_and_env_is_missing() {
        let err = resolve_token(None, "user token", "--user-token", "SAMAUDIT_TEST_UNSET_3").unwrap_err();
        assert!(err.to_string().contains("user token"));
    }

    #[test]
    fn debug_redacts_tokens() {
        let creds = Credentials::new("secret-app", "secret-user");
        let printed = format!("{creds:?}");
        assert!(!printed.contains("secret"));
    }
}
