//! OpenVPN configuration templates.
//!
//! Templates are Go `text/template` files named `client.conf` and `server.conf`
//! inside the configured template directory. They are read and parsed on every
//! render and evaluated with `gtmpl`, so `if`, `with`, pipelines, comments and
//! trim markers behave as in Go.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use bon::Builder;
use gtmpl::{Context, Template, Value};

use crate::error::{Result, VaultOpenVpnError};

/// Which side of the tunnel a configuration is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    Client,
    Server,
}

impl ConfigKind {
    /// Template file name for this kind.
    pub fn file_name(self) -> &'static str {
        match self {
            ConfigKind::Client => "client.conf",
            ConfigKind::Server => "server.conf",
        }
    }
}

/// Values available to a template.
///
/// # Fields
/// * `cert_authority` - PEM of the CA chain, `{{ .CertAuthority }}`.
/// * `certificate` - PEM of the issued certificate, `{{ .Certificate }}`.
/// * `private_key` - PEM of the issued private key, `{{ .PrivateKey }}`.
/// * `tls_auth` - Optional OpenVPN shared secret, `{{ .TLSAuth }}`. Renders as an
///   empty string when unset.
#[derive(Debug, Clone, Builder)]
pub struct TemplateContext {
    pub cert_authority: String,
    pub certificate: String,
    pub private_key: String,
    pub tls_auth: Option<String>,
}

impl From<&TemplateContext> for Value {
    fn from(context: &TemplateContext) -> Self {
        let tls_auth = context.tls_auth.clone().unwrap_or_default();
        let fields = HashMap::from([
            ("CertAuthority".to_string(), Value::from(context.cert_authority.clone())),
            ("Certificate".to_string(), Value::from(context.certificate.clone())),
            ("PrivateKey".to_string(), Value::from(context.private_key.clone())),
            ("TLSAuth".to_string(), Value::from(tls_auth.clone())),
            ("TlsAuth".to_string(), Value::from(tls_auth)),
        ]);
        Value::Object(fields)
    }
}

/// Parses `source` and renders it with `context`.
pub fn render_str(source: &str, context: &TemplateContext) -> Result<String> {
    let mut template = Template::default();
    template
        .parse(source)
        .map_err(|e| VaultOpenVpnError::TemplateError(e.to_string()))?;

    template
        .render(&Context::from(Value::from(context)))
        .map_err(|e| VaultOpenVpnError::TemplateError(e.to_string()))
}

/// Loads `<dir>/<kind file name>`, renders it with `context` and writes the result to `out`.
///
/// Nothing is written to `out` unless the template loads, parses and evaluates.
pub fn render_file<W: Write>(
    dir: &Path,
    kind: ConfigKind,
    context: &TemplateContext,
    out: &mut W,
) -> Result<()> {
    let path = dir.join(kind.file_name());
    let source = std::fs::read_to_string(&path).map_err(|e| {
        VaultOpenVpnError::TemplateError(format!("could not read {}: {e}", path.display()))
    })?;

    let rendered = render_str(&source, context)
        .map_err(|e| e.within(format!("Template {}", path.display())))?;
    out.write_all(rendered.as_bytes())?;
    Ok(())
}
