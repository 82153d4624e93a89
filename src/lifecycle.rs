//! Certificate workflows: issue a configuration, revoke and list.
//!
//! Each workflow runs its backend calls strictly one after another and wraps any
//! failure with the step that produced it. Nothing is rolled back: a certificate
//! issued before a failing template render stays issued.

use std::io::Write;

use serde_json::Value;
use tracing::{debug, info};

use crate::backend::responses::{
    CertificateRecord, IssueRequest, IssuedCertificate, RevokeRequest, SharedSecret,
};
use crate::backend::{Backend, read_as, resource_path, write_as};
use crate::config::{Config, format_ttl};
use crate::directory::CertificateDirectory;
use crate::error::{Result, VaultOpenVpnError};
use crate::listing::{ListRow, sort_rows, write_rows};
use crate::template::{ConfigKind, TemplateContext, render_file};

/// Rejects names without at least two dot-separated components.
///
/// # Example
/// ```
/// use vault_openvpn::lifecycle::validate_fqdn;
/// assert!(validate_fqdn("example.com").is_ok());
/// assert!(validate_fqdn("localhost").is_err());
/// ```
pub fn validate_fqdn(fqdn: &str) -> Result<()> {
    if fqdn.split('.').count() > 1 {
        Ok(())
    } else {
        Err(VaultOpenVpnError::InvalidInput(
            "You need to provide a valid FQDN".to_string(),
        ))
    }
}

/// Rejects serials without a colon separator.
pub fn validate_serial(serial: &str) -> Result<()> {
    if serial.split(':').count() > 1 {
        Ok(())
    } else {
        Err(VaultOpenVpnError::InvalidInput(
            "You need to provide a valid serial".to_string(),
        ))
    }
}

/// Runs the workflows against one backend with one resolved configuration.
pub struct Lifecycle<'a, B: Backend + ?Sized> {
    backend: &'a B,
    config: &'a Config,
}

impl<'a, B: Backend + ?Sized> Lifecycle<'a, B> {
    pub fn new(backend: &'a B, config: &'a Config) -> Self {
        Self { backend, config }
    }

    fn directory(&self) -> CertificateDirectory<'a, B> {
        CertificateDirectory::new(self.backend, &self.config.pki_mountpoint)
    }

    fn path(&self, segments: &[&str]) -> String {
        resource_path(&self.config.pki_mountpoint, segments)
    }

    /// Issues a certificate for `fqdn` and writes the rendered `kind` configuration to `out`.
    ///
    /// With auto-revoke enabled every valid certificate for `fqdn` is revoked first.
    pub fn issue_config<W: Write>(&self, kind: ConfigKind, fqdn: &str, out: &mut W) -> Result<()> {
        validate_fqdn(fqdn)?;

        if self.config.auto_revoke {
            self.revoke_by_name(fqdn)
                .map_err(|e| e.within("Could not revoke certificate"))?;
        }

        let cert_authority = self
            .fetch_ca_chain()
            .map_err(|e| e.within("Could not load CA certificate"))?;

        let issued = self
            .issue_certificate(fqdn)
            .map_err(|e| e.within("Could not generate new certificate"))?;

        let tls_auth = match self.config.ovpn_key.as_deref() {
            Some(name) => Some(
                self.fetch_shared_secret(name)
                    .map_err(|e| e.within("Could not fetch TLSAuth key"))?,
            ),
            None => None,
        };

        let context = TemplateContext::builder()
            .cert_authority(cert_authority)
            .certificate(issued.certificate)
            .private_key(issued.private_key)
            .maybe_tls_auth(tls_auth)
            .build();

        render_file(&self.config.template_path, kind, &context, out)
            .map_err(|e| e.within("Could not render configuration"))
    }

    /// Revokes every valid certificate whose common name is exactly `fqdn`.
    ///
    /// Returns the number of certificates actually revoked. Running it again for
    /// the same name finds nothing left to revoke.
    pub fn revoke_by_name(&self, fqdn: &str) -> Result<usize> {
        validate_fqdn(fqdn)?;

        let certificates = self
            .directory()
            .fetch_valid(false)
            .map_err(|e| VaultOpenVpnError::from(e).within("Could not fetch certificates"))?;

        let mut revoked = 0;
        for cert in certificates.iter().filter(|c| c.common_name == fqdn) {
            if self.revoke_serial(&cert.serial)? {
                revoked += 1;
            }
        }

        Ok(revoked)
    }

    /// Revokes the certificate with `serial`.
    ///
    /// Returns `false` without writing anything when it is already revoked or expired.
    pub fn revoke_by_serial(&self, serial: &str) -> Result<bool> {
        validate_serial(serial)?;
        self.revoke_serial(serial)
    }

    fn revoke_serial(&self, serial: &str) -> Result<bool> {
        let (cert, unusable) = self
            .directory()
            .fetch_by_serial(serial)
            .map_err(|e| e.within("Could not fetch certificate"))?;

        if unusable {
            debug!(
                cn = %cert.common_name,
                serial = %cert.serial,
                "Certificate already revoked or expired"
            );
            return Ok(false);
        }

        let path = self.path(&["revoke"]);
        write_as::<Value, _, B>(
            self.backend,
            &path,
            &RevokeRequest {
                serial_number: &cert.serial,
            },
        )
        .map_err(|e| e.within("Could not revoke certificate"))?;

        info!(cn = %cert.common_name, serial = %cert.serial, "Revoked certificate");
        Ok(true)
    }

    /// Writes the certificate inventory to `out`, sorted and formatted per configuration.
    pub fn list<W: Write>(&self, out: &mut W) -> Result<()> {
        let certificates = self
            .directory()
            .fetch_valid(self.config.list_expired)
            .map_err(|e| VaultOpenVpnError::from(e).within("Could not fetch certificates"))?;

        let mut rows = certificates.iter().map(ListRow::from).collect::<Vec<_>>();
        sort_rows(&mut rows, self.config.sort);
        write_rows(out, &rows, self.config.format)
    }

    /// PEM of the CA chain, or of the CA certificate when the chain is unavailable.
    fn fetch_ca_chain(&self) -> Result<String> {
        let chain_path = self.path(&["cert", "ca_chain"]);
        match read_as::<CertificateRecord, B>(self.backend, &chain_path) {
            Ok(Some(record)) if !record.certificate.trim().is_empty() => {
                return Ok(record.certificate);
            }
            Ok(_) => debug!(path = %chain_path, "No CA chain found, using CA certificate"),
            Err(err) => debug!(
                path = %chain_path,
                error = %err,
                "Could not read CA chain, using CA certificate"
            ),
        }

        let ca_path = self.path(&["cert", "ca"]);
        read_as::<CertificateRecord, B>(self.backend, &ca_path)?
            .map(|record| record.certificate)
            .filter(|pem| !pem.trim().is_empty())
            .ok_or(VaultOpenVpnError::NoData(ca_path))
    }

    fn issue_certificate(&self, fqdn: &str) -> Result<IssuedCertificate> {
        let path = self.path(&["issue", &self.config.pki_role]);
        let request = IssueRequest {
            common_name: fqdn,
            ttl: format_ttl(self.config.cert_ttl),
        };

        let issued = write_as::<IssuedCertificate, _, B>(self.backend, &path, &request)?
            .ok_or(VaultOpenVpnError::NoData(path))?;

        debug!(cn = fqdn, serial = %issued.serial_number, "Generated new certificate");
        Ok(issued)
    }

    fn fetch_shared_secret(&self, name: &str) -> Result<String> {
        let path = name.trim_matches('/');
        let secret = read_as::<SharedSecret, B>(self.backend, path)?
            .ok_or_else(|| VaultOpenVpnError::NoData(path.to_string()))?;

        secret.key().map(str::to_string).ok_or_else(|| {
            VaultOpenVpnError::DecodingError(
                "Within specified secret no entry named 'key' was found".to_string(),
            )
        })
    }
}
