//! use vault_openvpn::error::VaultOpenVpnError;

use thiserror::Error;

/// Represents errors that can occur while managing certificates through the backend.
///
/// Every variant carries enough context to identify the failing resource, so the
/// top-level dispatcher can print it as-is.
#[derive(Debug, Error)]
pub enum VaultOpenVpnError {
    /// Missing credential, unreadable config file or an option with an unusable value.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Malformed user input, rejected before any backend call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport failure or non-success answer from the backend.
    #[error("Backend {operation} of {path:?} failed: {message}")]
    BackendError {
        operation: &'static str,
        path: String,
        message: String,
    },

    /// The backend answered without the data the operation requires.
    #[error("Got no data from backend for {0:?}")]
    NoData(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Template could not be loaded, parsed or evaluated.
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Writing to the output stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error wrapped with the workflow step that produced it.
    #[error("{context}: {inner}")]
    Workflow {
        context: String,
        inner: Box<VaultOpenVpnError>,
    },
}

impl VaultOpenVpnError {
    /// Wraps the error with a description of the step that failed.
    pub fn within(self, context: impl Into<String>) -> Self {
        VaultOpenVpnError::Workflow {
            context: context.into(),
            inner: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultOpenVpnError>;

impl From<der::Error> for VaultOpenVpnError {
    /// Converts a `der::Error` into a `VaultOpenVpnError`.
    fn from(err: der::Error) -> Self {
        VaultOpenVpnError::DecodingError(err.to_string())
    }
}

impl From<pem::PemError> for VaultOpenVpnError {
    fn from(err: pem::PemError) -> Self {
        VaultOpenVpnError::DecodingError(err.to_string())
    }
}

impl From<toml::de::Error> for VaultOpenVpnError {
    fn from(err: toml::de::Error) -> Self {
        VaultOpenVpnError::ConfigurationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_context_prefixes_inner_message() {
        let err = VaultOpenVpnError::NoData("pki/certs".to_string())
            .within("Could not revoke certificate");
        assert_eq!(
            err.to_string(),
            "Could not revoke certificate: Got no data from backend for \"pki/certs\""
        );
    }
}
