//! Small adapter utilities.
//! - format_hex: canonical `0x`-prefixed uppercase hex rendering
//! - parse_address: accept the address shapes clients send back

/// Renders a register or address value the way every response does:
/// `0x` prefix, uppercase, fixed width.
pub(super) fn format_hex(value: u16, width: usize) -> String {
    format!("0x{value:0width$X}")
}

/// Parses an address as clients echo them: with or without a `0x` prefix,
/// always hexadecimal.
pub(super) fn parse_address(text: &str) -> Option<u16> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u32::from_str_radix(digits, 16)
        .ok()
        .map(|value| (value & 0xFFFF) as u16)
}
