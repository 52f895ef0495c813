use thiserror::Error;

/// Failure to load or validate an audit configuration.
///
/// Always raised at startup, before any network I/O.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Config validation error (blank catalog entry, zero page size, etc.).
    #[error("config validation error: {0}")]
    Validation(String),
    /// The same asset name is mapped to an owner more than once.
    #[error("asset '{0}' is mapped to an owner more than once")]
    DuplicateOwner(String),
    /// IO error (file read, unsupported workbook, etc.).
    #[error("IO error: {0}")]
    Io(String),
}
