use serde::{Deserialize, Serialize};

/// Answer of `LIST <mount>/certs`.
#[derive(Debug, Clone, Deserialize)]
pub struct SerialList {
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Answer of `GET <mount>/cert/<serial>`, `cert/ca` and `cert/ca_chain`.
///
/// # Fields
/// * `certificate` - PEM text of the certificate (or chain).
/// * `revocation_time` - Unix timestamp of the revocation, `0` while not revoked.
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateRecord {
    #[serde(default)]
    pub certificate: String,
    #[serde(default)]
    pub revocation_time: Option<i64>,
}

/// Body of `POST <mount>/issue/<role>`.
#[derive(Debug, Clone, Serialize)]
pub struct IssueRequest<'a> {
    pub common_name: &'a str,
    pub ttl: String,
}

/// Answer of `POST <mount>/issue/<role>`.
///
/// The private key only lives in this struct until it is handed to the template.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuedCertificate {
    pub certificate: String,
    pub private_key: String,
    pub serial_number: String,
}

/// Body of `POST <mount>/revoke`.
#[derive(Debug, Clone, Serialize)]
pub struct RevokeRequest<'a> {
    pub serial_number: &'a str,
}

/// Answer of a secret read holding the OpenVPN shared key.
///
/// KV version 1 mounts answer with the entries directly, version 2 mounts nest
/// them under another `data` object.
#[derive(Debug, Clone, Deserialize)]
pub struct SharedSecret {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl SharedSecret {
    /// Returns the `key` entry, looking into the nested version 2 payload when needed.
    pub fn key(&self) -> Option<&str> {
        self.key
            .as_deref()
            .or_else(|| self.data.as_ref()?.get("key")?.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn certificate_record_without_revocation() {
        let record: CertificateRecord =
            serde_json::from_value(json!({"certificate": "PEM", "revocation_time": 0})).unwrap();
        assert_eq!(record.certificate, "PEM");
        assert_eq!(record.revocation_time, Some(0));
    }

    #[test]
    fn issued_certificate_requires_private_key() {
        let result: Result<IssuedCertificate, _> =
            serde_json::from_value(json!({"certificate": "PEM", "serial_number": "01:02"}));
        assert!(result.is_err());
    }

    #[test]
    fn shared_secret_reads_kv_v1_and_v2() {
        let v1: SharedSecret = serde_json::from_value(json!({"key": "static"})).unwrap();
        assert_eq!(v1.key(), Some("static"));

        let v2: SharedSecret =
            serde_json::from_value(json!({"data": {"key": "nested"}, "metadata": {}})).unwrap();
        assert_eq!(v2.key(), Some("nested"));

        let missing: SharedSecret = serde_json::from_value(json!({"other": "x"})).unwrap();
        assert_eq!(missing.key(), None);
    }
}
