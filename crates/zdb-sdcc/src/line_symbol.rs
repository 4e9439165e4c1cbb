//! Decoder for compiler line markers embedded in linker symbol names.
//!
//! The assembler has no dedicated field for line info, so SDCC smuggles it
//! through symbol names using the convention
//! `C$<file>$<line>$<level>$<block>`, e.g. `C$clock.c$18$0_0$36`. Decoding
//! is a pure string operation, kept apart from any address or session
//! lookup so it can be tested on its own.

use once_cell::sync::Lazy;
use regex::Regex;

/// A decoded `C$` line marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSymbol {
    pub file: String,
    pub line: u32,
}

static LINE_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^C\$(.+?)\$(\d+)(?:\$|$)").expect("line symbol regex"));

/// Decodes a line marker from a symbol name; `None` for every name that
/// does not follow the convention (which is most of them).
#[must_use]
pub fn decode_line_symbol(name: &str) -> Option<LineSymbol> {
    let captures = LINE_SYMBOL_RE.captures(name)?;
    let line = captures[2].parse().ok()?;
    Some(LineSymbol {
        file: captures[1].to_string(),
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::decode_line_symbol;

    #[test]
    fn decodes_conventional_name() {
        let symbol = decode_line_symbol("C$clock.c$18$0_0$36").expect("line symbol");
        assert_eq!(symbol.file, "clock.c");
        assert_eq!(symbol.line, 18);
    }

    #[test]
    fn decodes_without_trailing_fields() {
        let symbol = decode_line_symbol("C$main.c$7").expect("line symbol");
        assert_eq!(symbol.file, "main.c");
        assert_eq!(symbol.line, 7);
    }

    #[test]
    fn rejects_plain_symbols() {
        assert!(decode_line_symbol("_clock_init").is_none());
        assert!(decode_line_symbol("C$no_line$x$y").is_none());
        assert!(decode_line_symbol("A$clock$152").is_none());
    }

    #[test]
    fn file_names_may_contain_dollars() {
        // The lazy file group stops at the first `$<digits>$` boundary.
        let symbol = decode_line_symbol("C$odd$name.c$12$0$1");
        // `odd` alone is not followed by digits, so the match extends.
        let symbol = symbol.expect("line symbol");
        assert_eq!(symbol.file, "odd$name.c");
        assert_eq!(symbol.line, 12);
    }
}
