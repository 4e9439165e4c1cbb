//! Shared helpers for the text-format parsers.

use std::fs;
use std::path::Path;

/// Reads a file as lines; `None` when missing or unreadable.
pub(crate) fn read_lines(path: &Path) -> Option<Vec<String>> {
    let text = fs::read_to_string(path).ok()?;
    Some(text.lines().map(str::to_string).collect())
}

/// Parses a hexadecimal field with or without a `0x` prefix.
pub(crate) fn parse_hex(field: &str) -> Option<u32> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u32::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::parse_hex;

    #[test]
    fn hex_with_and_without_prefix() {
        assert_eq!(parse_hex("0116"), Some(0x116));
        assert_eq!(parse_hex("0x0116"), Some(0x116));
        assert_eq!(parse_hex("zz"), None);
    }
}
