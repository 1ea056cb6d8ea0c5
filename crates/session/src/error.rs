use std::fmt;

use crate::store::StoreError;

#[derive(Debug)]
pub enum SessionError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (zero interval, timeout below suppression).
    ConfigValidation(String),
    /// Event validation failure. Rejected before any state change.
    Validation(String),
    /// The store failed a mutation; the overlay was rolled back.
    MutationFailed { key: String, source: StoreError },
    /// A background fetch failed. Visible state, overlays included, is
    /// preserved; the caller may retry.
    Fetch(StoreError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Validation(msg) => write!(f, "invalid event: {msg}"),
            Self::MutationFailed { key, source } => {
                write!(f, "mutation for event '{key}' failed: {source}")
            }
            Self::Fetch(source) => write!(f, "background fetch failed: {source}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MutationFailed { source, .. } | Self::Fetch(source) => Some(source),
            _ => None,
        }
    }
}
