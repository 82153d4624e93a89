pub mod serial;

use der::Decode;
use der::asn1::{Ia5StringRef, PrintableStringRef};
use time::OffsetDateTime;
use x509_cert::attr::AttributeTypeAndValue;

use crate::error::{Result, VaultOpenVpnError};
use crate::pem_utils::certificate_pem_to_der;

/// Effective state of a certificate at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateStatus {
    /// Inside its validity window and not revoked.
    Valid,
    /// Past its `notAfter` and never revoked while still valid.
    Expired,
    /// Carries a revocation timestamp in the past.
    Revoked,
}

impl CertificateStatus {
    /// Whether the certificate still counts for listing and matching.
    pub fn is_effective(self) -> bool {
        self == CertificateStatus::Valid
    }
}

/// A certificate as known to the backend, reduced to the fields this tool works with.
///
/// # Fields
/// * `serial` - Canonical colon-separated hex serial.
/// * `common_name` - The subject common name (CN), used as the FQDN.
/// * `not_before` - Start of the validity window.
/// * `not_after` - End of the validity window.
/// * `revocation_time` - Unix timestamp reported by the backend, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub serial: String,
    pub common_name: String,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub revocation_time: Option<i64>,
}

impl Certificate {
    /// Decodes a PEM-encoded certificate.
    ///
    /// The input must hold exactly one `CERTIFICATE` block containing a parseable
    /// X.509 structure. The revocation marker is not part of the certificate itself
    /// and starts out unset.
    pub fn from_pem(pem_text: &str) -> Result<Self> {
        let der = certificate_pem_to_der(pem_text)?;
        Self::from_der(&der)
    }

    /// Decodes a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = x509_cert::Certificate::from_der(der)?;
        let tbs = &inner.tbs_certificate;

        Ok(Self {
            serial: serial::format_serial(tbs.serial_number.as_bytes()),
            common_name: common_name(&tbs.subject)?,
            not_before: to_offset_date_time(&tbs.validity.not_before),
            not_after: to_offset_date_time(&tbs.validity.not_after),
            revocation_time: None,
        })
    }

    /// Attaches the backend's revocation marker.
    pub fn with_revocation_time(mut self, revocation_time: Option<i64>) -> Self {
        self.revocation_time = revocation_time;
        self
    }

    /// Whether the revocation marker is a positive timestamp strictly before `now`.
    ///
    /// Zero or future timestamps mean "not yet revoked".
    pub fn is_revoked_at(&self, now: OffsetDateTime) -> bool {
        matches!(self.revocation_time, Some(t) if t > 0 && t < now.unix_timestamp())
    }

    /// Computes the effective status at `now`.
    ///
    /// The backend stops stamping a revocation time once a certificate has expired, so
    /// expiry is checked after revocation and both count as ineffective.
    pub fn status_at(&self, now: OffsetDateTime) -> CertificateStatus {
        if self.is_revoked_at(now) {
            CertificateStatus::Revoked
        } else if self.not_after < now {
            CertificateStatus::Expired
        } else {
            CertificateStatus::Valid
        }
    }

    /// Computes the effective status against the current clock.
    pub fn status(&self) -> CertificateStatus {
        self.status_at(OffsetDateTime::now_utc())
    }
}

/// Extracts the first common name from an X.509 name.
fn common_name(name: &x509_cert::name::Name) -> Result<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|attr| attr.oid == const_oid::db::rfc4519::CN)
        .map(attribute_string)
        .unwrap_or_else(|| {
            Err(VaultOpenVpnError::DecodingError(
                "certificate subject has no common name".to_string(),
            ))
        })
}

fn attribute_string(attr: &AttributeTypeAndValue) -> Result<String> {
    attr.value
        .decode_as::<String>()
        .or_else(|_| {
            attr.value
                .decode_as::<PrintableStringRef<'_>>()
                .map(|s| s.as_str().to_owned())
        })
        .or_else(|_| {
            attr.value
                .decode_as::<Ia5StringRef<'_>>()
                .map(|s| s.as_str().to_owned())
        })
        .map_err(|e| {
            VaultOpenVpnError::DecodingError(format!("unsupported common name encoding: {e}"))
        })
}

fn to_offset_date_time(value: &x509_cert::time::Time) -> OffsetDateTime {
    match value {
        x509_cert::time::Time::UtcTime(ut) => OffsetDateTime::from(ut.to_system_time()),
        x509_cert::time::Time::GeneralTime(gt) => OffsetDateTime::from(gt.to_system_time()),
    }
}
