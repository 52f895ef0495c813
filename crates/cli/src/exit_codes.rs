//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                              |
//! |---------|------------|------------------------------------------|
//! | 0       | Universal  | Success                                  |
//! | 1       | Universal  | General error (unspecified)              |
//! | 2       | Universal  | CLI usage error (bad args)               |
//! | 60-69   | audit      | Configuration, GLPI and report failures  |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use samaudit_glpi::GlpiError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, invalid option values.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Audit (60-69)
// =============================================================================

/// Config file unreadable or invalid, missing URL or credentials.
pub const EXIT_AUDIT_CONFIG: u8 = 60;

/// GLPI unreachable, timed out, or answered with a non-success status
/// (including rejected tokens).
pub const EXIT_AUDIT_TRANSPORT: u8 = 61;

/// GLPI answered 2xx with a body of the wrong shape.
pub const EXIT_AUDIT_MALFORMED: u8 = 62;

/// Report (xlsx or JSON) could not be written.
pub const EXIT_AUDIT_REPORT: u8 = 63;

/// Map a GLPI error to its exit code.
pub fn glpi_exit_code(err: &GlpiError) -> u8 {
    match err {
        e if e.is_transport() => EXIT_AUDIT_TRANSPORT,
        GlpiError::MissingCredential { .. } => EXIT_AUDIT_CONFIG,
        GlpiError::MalformedResponse(_) => EXIT_AUDIT_MALFORMED,
        _ => EXIT_USAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_USAGE,
            EXIT_AUDIT_CONFIG,
            EXIT_AUDIT_TRANSPORT,
            EXIT_AUDIT_MALFORMED,
            EXIT_AUDIT_REPORT,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn glpi_errors_map_by_class() {
        assert_eq!(glpi_exit_code(&GlpiError::Transport("timeout".into())), EXIT_AUDIT_TRANSPORT);
        assert_eq!(
            glpi_exit_code(&GlpiError::Http { status: 401, body: String::new() }),
            EXIT_AUDIT_TRANSPORT
        );
        assert_eq!(
            glpi_exit_code(&GlpiError::MalformedResponse("x".into())),
            EXIT_AUDIT_MALFORMED
        );
        assert_eq!(
            glpi_exit_code(&GlpiError::MissingCredential {
                what: "app token",
                flag: "--app-token",
                env: "GLPI_APP_TOKEN",
            }),
            EXIT_AUDIT_CONFIG
        );
        assert_eq!(glpi_exit_code(&GlpiError::InvalidPageSize), EXIT_USAGE);
    }
}
