use crate::error::{Result, VaultOpenVpnError};

/// PEM label of an X.509 certificate block.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new())
}

/// Extract the DER bytes of the single certificate block in `pem_str`.
///
/// Input holding no block, more than one block, or a block with another label is rejected.
pub fn certificate_pem_to_der(pem_str: &str) -> Result<Vec<u8>> {
    let mut blocks = pem::parse_many(pem_str)?;
    if blocks.len() != 1 {
        return Err(VaultOpenVpnError::DecodingError(format!(
            "expected exactly one PEM block, found {}",
            blocks.len()
        )));
    }

    let block = blocks.remove(0);
    if block.tag() != CERTIFICATE_LABEL {
        return Err(VaultOpenVpnError::DecodingError(format!(
            "expected a {CERTIFICATE_LABEL} PEM block, found {:?}",
            block.tag()
        )));
    }

    Ok(block.into_contents())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_block_round_trips() {
        let encoded = der_to_pem(&[0x30, 0x03, 0x02, 0x01, 0x01], CERTIFICATE_LABEL);
        let der = certificate_pem_to_der(&encoded).unwrap();
        assert_eq!(der, vec![0x30, 0x03, 0x02, 0x01, 0x01]);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(certificate_pem_to_der("not a pem block").is_err());
    }

    #[test]
    fn rejects_multiple_blocks() {
        let one = der_to_pem(&[1, 2, 3], CERTIFICATE_LABEL);
        let two = format!("{one}{one}");
        assert!(certificate_pem_to_der(&two).is_err());
    }

    #[test]
    fn rejects_other_labels() {
        let key = der_to_pem(&[1, 2, 3], "PRIVATE KEY");
        assert!(certificate_pem_to_der(&key).is_err());
    }
}
