/// Renders serial bytes the way the backend names certificates: lowercase hex pairs
/// joined by colons.
///
/// DER serials carry a leading zero byte when the high bit of the magnitude is set;
/// that padding is not part of the canonical form and is stripped. A serial made only
/// of zero bytes renders as `00`.
///
/// # Example
/// ```
/// use vault_openvpn::cert::serial::format_serial;
/// assert_eq!(format_serial(&[0x00, 0x9a, 0x0b]), "9a:0b");
/// ```
pub fn format_serial(bytes: &[u8]) -> String {
    let first_significant = bytes.iter().position(|b| *b != 0);
    let magnitude = match first_significant {
        Some(idx) => &bytes[idx..],
        None => return "00".to_string(),
    };

    magnitude
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Normalises a user-supplied serial to the canonical lowercase form.
pub fn normalize_serial(serial: &str) -> String {
    serial.trim().to_ascii_lowercase()
}
