//! Read access to the certificates stored under a PKI mount.

use time::OffsetDateTime;
use tracing::debug;

use crate::backend::responses::{CertificateRecord, SerialList};
use crate::backend::{Backend, list_as, read_as, resource_path};
use crate::cert::serial::normalize_serial;
use crate::cert::{Certificate, CertificateStatus};
use crate::error::{Result, VaultOpenVpnError};

/// Certificates accumulated before a fetch failed, together with the failure.
#[derive(Debug, thiserror::Error)]
#[error("{error} (after {count} certificates)", count = .certificates.len())]
pub struct PartialFetch {
    pub certificates: Vec<Certificate>,
    pub error: VaultOpenVpnError,
}

impl From<PartialFetch> for VaultOpenVpnError {
    fn from(partial: PartialFetch) -> Self {
        partial.error
    }
}

/// View on the certificates of one mount point.
pub struct CertificateDirectory<'a, B: Backend + ?Sized> {
    backend: &'a B,
    mount: &'a str,
}

impl<'a, B: Backend + ?Sized> CertificateDirectory<'a, B> {
    pub fn new(backend: &'a B, mount: &'a str) -> Self {
        Self { backend, mount }
    }

    /// Lists every serial known to the mount.
    ///
    /// A mount that answers with no inventory at all is an error, while an
    /// inventory with zero entries is an empty list.
    pub fn list_serials(&self) -> Result<Vec<String>> {
        let path = resource_path(self.mount, &["certs"]);
        let list = list_as::<SerialList, B>(self.backend, &path)?
            .ok_or(VaultOpenVpnError::NoData(path))?;
        Ok(list.keys)
    }

    /// Fetches one certificate and tells whether it is unusable (revoked or expired).
    pub fn fetch_by_serial(&self, serial: &str) -> Result<(Certificate, bool)> {
        self.fetch_by_serial_at(serial, OffsetDateTime::now_utc())
    }

    /// [`Self::fetch_by_serial`] evaluated at `now`.
    pub fn fetch_by_serial_at(
        &self,
        serial: &str,
        now: OffsetDateTime,
    ) -> Result<(Certificate, bool)> {
        let (cert, status) = self.fetch_with_status(serial, now)?;
        Ok((cert, !status.is_effective()))
    }

    /// Fetches every certificate of the mount, dropping revoked ones and, unless
    /// `include_expired` is set, expired ones.
    ///
    /// Stops at the first failing fetch and hands back what was collected so far.
    pub fn fetch_valid(
        &self,
        include_expired: bool,
    ) -> std::result::Result<Vec<Certificate>, PartialFetch> {
        self.fetch_valid_at(include_expired, OffsetDateTime::now_utc())
    }

    /// [`Self::fetch_valid`] evaluated at `now`.
    pub fn fetch_valid_at(
        &self,
        include_expired: bool,
        now: OffsetDateTime,
    ) -> std::result::Result<Vec<Certificate>, PartialFetch> {
        let mut certificates = Vec::new();

        let serials = match self.list_serials() {
            Ok(serials) => serials,
            Err(error) => {
                return Err(PartialFetch {
                    certificates,
                    error,
                });
            }
        };

        for serial in serials {
            let (cert, status) = match self.fetch_with_status(&serial, now) {
                Ok(found) => found,
                Err(error) => {
                    return Err(PartialFetch {
                        certificates,
                        error,
                    });
                }
            };

            match status {
                CertificateStatus::Valid => certificates.push(cert),
                CertificateStatus::Expired if include_expired => certificates.push(cert),
                status => debug!(serial = %cert.serial, ?status, "Skipping certificate"),
            }
        }

        Ok(certificates)
    }

    fn fetch_with_status(
        &self,
        serial: &str,
        now: OffsetDateTime,
    ) -> Result<(Certificate, CertificateStatus)> {
        let serial = normalize_serial(serial);
        let path = resource_path(self.mount, &["cert", &serial]);
        let record = read_as::<CertificateRecord, B>(self.backend, &path)?
            .ok_or_else(|| VaultOpenVpnError::NoData(path.clone()))?;

        if record.certificate.trim().is_empty() {
            return Err(VaultOpenVpnError::NoData(path));
        }

        let cert = Certificate::from_pem(&record.certificate)
            .map_err(|e| e.within(format!("Could not decode certificate {serial}")))?
            .with_revocation_time(record.revocation_time);
        let status = cert.status_at(now);
        Ok((cert, status))
    }
}
