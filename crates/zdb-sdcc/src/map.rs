//! Parser for SDCC/ASxxxx linker MAP files.
//!
//! The MAP is a flat view of the linked program: memory segments and every
//! symbol with its final address. It doubles as a fallback source of line
//! info, because the assembler re-encodes compiler line markers into symbol
//! names (see [`crate::line_symbol`]).

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use smol_str::SmolStr;

use crate::util::{parse_hex, read_lines};

/// A linked memory segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: SmolStr,
    pub address: u32,
    pub size: u32,
    pub attributes: String,
}

/// A linked symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSymbol {
    pub name: SmolStr,
    pub address: u32,
    pub area: String,
    pub bank: i32,
}

/// Everything extracted from one MAP file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapInfo {
    pub segments: Vec<Segment>,
    pub symbols: Vec<MapSymbol>,
}

// _CODE 00000100 000025FF = 9727. bytes (REL,CON)
static SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*([A-Za-z0-9_.$]+)\s+((?:0[xX])?[0-9A-Fa-f]{4,8})\s+((?:0[xX])?[0-9A-Fa-f]{4,8}).*\(([^)]*)\)\s*$",
    )
    .expect("segment regex")
});

// 00000116  C$clock.c$18$0_0$36                clock
static SYMBOL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:0[xX])?[0-9A-Fa-f]{4,8})\s+(\S+)(?:\s+(\S+))?\s*$").expect("symbol regex")
});

/// Parser for MAP files. `parse` yields `None` when the file cannot be
/// read; lines that match neither table shape are skipped.
#[derive(Debug, Default)]
pub struct MapParser {
    data: MapInfo,
}

impl MapParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, path: &Path) -> Option<MapInfo> {
        let lines = read_lines(path)?;
        self.data = parse_tables(lines.iter().map(String::as_str));
        Some(self.data.clone())
    }

    #[must_use]
    pub fn parse_str(&mut self, text: &str) -> MapInfo {
        self.data = parse_tables(text.lines());
        self.data.clone()
    }

    #[must_use]
    pub fn data(&self) -> &MapInfo {
        &self.data
    }
}

fn parse_tables<'a, I>(lines: I) -> MapInfo
where
    I: Iterator<Item = &'a str>,
{
    let mut info = MapInfo::default();

    for raw in lines {
        let line = raw.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        if let Some(captures) = SEGMENT_RE.captures(line) {
            if let (Some(address), Some(size)) =
                (parse_hex(&captures[2]), parse_hex(&captures[3]))
            {
                info.segments.push(Segment {
                    name: SmolStr::new(&captures[1]),
                    address,
                    size,
                    attributes: captures[4].to_string(),
                });
                continue;
            }
        }

        if let Some(captures) = SYMBOL_RE.captures(line) {
            // Table headings look like symbol rows; skip them.
            if &captures[1] == "Value" || &captures[2] == "Global" {
                continue;
            }
            if let Some(address) = parse_hex(&captures[1]) {
                info.symbols.push(MapSymbol {
                    name: SmolStr::new(&captures[2]),
                    address,
                    area: captures
                        .get(3)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default(),
                    bank: 0,
                });
            }
        }
    }

    info
}
