//! HTTP client for the Vault API.
//!
//! Every request is authenticated with the token given at construction and
//! addressed as `<address>/v1/<path>`. Calls are blocking and strictly sequential.

use reqwest::blocking::{Client, ClientBuilder, RequestBuilder, Response};
use reqwest::{Certificate, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::Backend;
use crate::config::{Config, TlsConfig};
use crate::error::{Result, VaultOpenVpnError};

/// Header carrying the Vault token.
const TOKEN_HEADER: &str = "X-Vault-Token";

/// Response envelope shared by all Vault endpoints.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
}

/// Error payload of a non-success response.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

/// Authenticated client for a single Vault server.
pub struct VaultClient {
    http: Client,
    base_url: String,
    token: String,
}

impl VaultClient {
    /// Create a client for `address` authenticated with `token`, verifying the
    /// server certificate as `tls` says.
    ///
    /// An empty token is a configuration error: no request is ever sent without one.
    pub fn new(address: &str, token: &str, tls: &TlsConfig) -> Result<Self> {
        let token = checked_token(token)?;

        let builder = Client::builder()
            .user_agent(concat!("vault-openvpn/", env!("CARGO_PKG_VERSION")));
        let http = with_tls(builder, tls)?.build().map_err(|e| {
            VaultOpenVpnError::ConfigurationError(format!("Could not create Vault client: {e}"))
        })?;

        Ok(Self::from_parts(http, address, token))
    }

    /// Create a client from the resolved configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let token = config.vault_token.as_deref().unwrap_or_default();
        Self::new(&config.vault_address, token, &config.tls)
    }

    pub(crate) fn from_parts(http: Client, address: &str, token: &str) -> Self {
        Self {
            http,
            base_url: address.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Get the base URL for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of a resource path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn execute(
        &self,
        operation: &'static str,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Option<Value>> {
        debug!(operation, path, "Sending backend request");

        let response = request
            .header(TOKEN_HEADER, &self.token)
            .send()
            .map_err(|e| backend_error(operation, path, e.to_string()))?;

        Self::data_of(operation, path, response)
    }

    fn data_of(operation: &'static str, path: &str, response: Response) -> Result<Option<Value>> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        if !status.is_success() {
            let message = match response.json::<ErrorBody>() {
                Ok(body) if !body.errors.is_empty() => body.errors.join("; "),
                _ => status.to_string(),
            };
            return Err(backend_error(operation, path, message));
        }

        let envelope: Envelope = response.json().map_err(|e| {
            VaultOpenVpnError::DecodingError(format!(
                "unexpected {operation} response from {path:?}: {e}"
            ))
        })?;

        Ok(envelope.data.filter(|data| !data.is_null()))
    }
}

impl Backend for VaultClient {
    fn read(&self, path: &str) -> Result<Option<Value>> {
        let request = self.http.get(self.url(path));
        self.execute("read", path, request)
    }

    fn write(&self, path: &str, body: &Value) -> Result<Option<Value>> {
        let request = self.http.post(self.url(path)).json(body);
        self.execute("write", path, request)
    }

    fn list(&self, path: &str) -> Result<Option<Value>> {
        let request = self.http.get(self.url(path)).query(&[("list", "true")]);
        self.execute("list", path, request)
    }
}

fn checked_token(token: &str) -> Result<&str> {
    let token = token.trim();
    if token.is_empty() {
        return Err(VaultOpenVpnError::ConfigurationError(
            "You need to set vault-token".to_string(),
        ));
    }
    Ok(token)
}

/// Adds the configured CA certificates to the trusted roots.
fn with_tls(mut builder: ClientBuilder, tls: &TlsConfig) -> Result<ClientBuilder> {
    for (path, pem) in tls.pem_bundles()? {
        let certificates = Certificate::from_pem_bundle(&pem).map_err(|e| {
            VaultOpenVpnError::ConfigurationError(format!(
                "Unable to parse CA certificate {}: {e}",
                path.display()
            ))
        })?;
        if certificates.is_empty() {
            return Err(VaultOpenVpnError::ConfigurationError(format!(
                "No CA certificate found in {}",
                path.display()
            )));
        }

        debug!(path = %path.display(), count = certificates.len(), "Trusting CA certificates");
        for certificate in certificates {
            builder = builder.add_root_certificate(certificate);
        }
    }

    if tls.skip_verify {
        warn!("TLS verification of the Vault server is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder)
}

fn backend_error(operation: &'static str, path: &str, message: String) -> VaultOpenVpnError {
    VaultOpenVpnError::BackendError {
        operation,
        path: path.to_string(),
        message,
    }
}
