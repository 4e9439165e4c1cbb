//! Symbol resolution over the two toolchain tables.
//!
//! Two independent sources may describe the same program: the hierarchical
//! CDB debug info and the flat linker map, whose symbol names can embed
//! compiler line markers. Every lookup searches the CDB first and the
//! decoded map markers second; that precedence is fixed, so the richer
//! table always wins a tie.

use std::path::{Path, PathBuf};

use smol_str::SmolStr;
use zdb_sdcc::{decode_line_symbol, MapInfo, Module};

/// Loaded symbol tables plus the directories used for source resolution.
#[derive(Debug, Default)]
pub struct SymbolTables {
    pub debug_info: Option<Vec<Module>>,
    pub map: Option<MapInfo>,
    pub source_roots: Vec<PathBuf>,
}

/// A source position a code address maps to. `resolved` is the on-disk
/// path when the resolution heuristic found one; callers must tolerate a
/// location whose file never resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub resolved: Option<PathBuf>,
}

/// Nearest-symbol query modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolQuery {
    /// Only a symbol at exactly the queried address.
    Exact,
    /// The highest-addressed symbol not exceeding the queried address.
    NearestBelow,
}

/// A nearest-symbol answer; `offset` is zero for exact hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearestSymbol {
    pub name: SmolStr,
    pub offset: u16,
}

impl NearestSymbol {
    /// Display form: `name` or `name+0x12`.
    #[must_use]
    pub fn display(&self) -> String {
        if self.offset == 0 {
            self.name.to_string()
        } else {
            format!("{}+0x{:02X}", self.name, self.offset)
        }
    }
}

/// Why a source breakpoint line did or did not get an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointResolution {
    Resolved(u16),
    /// Nothing is loaded yet; the line may verify after a launch.
    NoTables,
    /// Tables are loaded but no code maps to this line.
    NoCode,
}

impl SymbolTables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.debug_info = None;
        self.map = None;
        self.source_roots.clear();
    }

    #[must_use]
    pub fn any_loaded(&self) -> bool {
        self.debug_info.is_some() || self.map.is_some()
    }

    /// Maps a code address to a source line: CDB line table first, decoded
    /// map line markers second.
    #[must_use]
    pub fn address_to_source(&self, address: u16) -> Option<SourceLocation> {
        if let Some(modules) = &self.debug_info {
            for module in modules {
                if let Some(entry) = module.lines.iter().find(|entry| entry.address == address) {
                    return Some(self.locate(&entry.file, entry.line));
                }
            }
        }
        if let Some(map) = &self.map {
            for symbol in &map.symbols {
                if symbol.address == u32::from(address) {
                    if let Some(decoded) = decode_line_symbol(&symbol.name) {
                        return Some(self.locate(&decoded.file, decoded.line));
                    }
                }
            }
        }
        None
    }

    /// Maps a (file, line) pair to a code address. Matching is by file
    /// basename: clients send full paths, the compiler stores bare names.
    #[must_use]
    pub fn source_line_to_address(&self, file: &str, line: u32) -> Option<u16> {
        let wanted = basename(file);
        if let Some(modules) = &self.debug_info {
            for module in modules {
                for entry in &module.lines {
                    if entry.line == line && basename(&entry.file) == wanted {
                        return Some(entry.address);
                    }
                }
            }
        }
        if let Some(map) = &self.map {
            for symbol in &map.symbols {
                if let Some(decoded) = decode_line_symbol(&symbol.name) {
                    if decoded.line == line && basename(&decoded.file) == wanted {
                        return Some((symbol.address & 0xFFFF) as u16);
                    }
                }
            }
        }
        None
    }

    /// Resolves one requested breakpoint line.
    #[must_use]
    pub fn resolve_breakpoint(&self, file: &str, line: u32) -> BreakpointResolution {
        if !self.any_loaded() {
            return BreakpointResolution::NoTables;
        }
        match self.source_line_to_address(file, line) {
            Some(address) => BreakpointResolution::Resolved(address),
            None => BreakpointResolution::NoCode,
        }
    }

    /// Nearest-symbol lookup against the linker map. Line markers and
    /// other encoded names are not display symbols and are skipped. "No
    /// symbol" is a valid answer, not an error.
    #[must_use]
    pub fn nearest_symbol(&self, address: u16, query: SymbolQuery) -> Option<NearestSymbol> {
        let map = self.map.as_ref()?;
        let displayable = map
            .symbols
            .iter()
            .filter(|symbol| !symbol.name.contains('$'));
        match query {
            SymbolQuery::Exact => {
                let mut fallback = None;
                for symbol in displayable {
                    if symbol.address != u32::from(address) {
                        continue;
                    }
                    // C symbols carry the underscore prefix; prefer them
                    // over assembler-internal names at the same address.
                    if symbol.name.starts_with('_') {
                        return Some(NearestSymbol {
                            name: symbol.name.clone(),
                            offset: 0,
                        });
                    }
                    fallback.get_or_insert_with(|| NearestSymbol {
                        name: symbol.name.clone(),
                        offset: 0,
                    });
                }
                fallback
            }
            SymbolQuery::NearestBelow => {
                let mut best: Option<&zdb_sdcc::MapSymbol> = None;
                for symbol in displayable {
                    if symbol.address > u32::from(address) {
                        continue;
                    }
                    match best {
                        Some(current) if current.address >= symbol.address => {}
                        _ => best = Some(symbol),
                    }
                }
                best.map(|symbol| NearestSymbol {
                    name: symbol.name.clone(),
                    offset: (u32::from(address) - symbol.address) as u16,
                })
            }
        }
    }

    /// Applies the path-resolution heuristic and packages the result.
    fn locate(&self, file: &str, line: u32) -> SourceLocation {
        SourceLocation {
            file: file.to_string(),
            line,
            resolved: self.resolve_source_path(file),
        }
    }

    /// Resolves a bare or relative source path to an existing file:
    /// the path as given, then under each configured root, then one
    /// directory level deep under each root (the usual `root/src/file.c`
    /// layout). `None` when nothing exists; callers keep the original
    /// path in that case.
    #[must_use]
    pub fn resolve_source_path(&self, file: &str) -> Option<PathBuf> {
        let direct = Path::new(file);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }
        for root in &self.source_roots {
            let candidate = root.join(file);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        for root in &self.source_roots {
            let Ok(entries) = std::fs::read_dir(root) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    let candidate = path.join(file);
                    if candidate.is_file() {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::{BreakpointResolution, SymbolQuery, SymbolTables};
    use zdb_sdcc::{CdbParser, MapParser};

    const CDB: &str = "\
M:clock
L:C$clock.c$18$1$1:116
L:C$clock.c$21$1$1:11C
";

    const MAP: &str = "\
_CODE                          00000100    000025FF =        9727. bytes (REL,CON)
   00000100  _main                              main
   0000012A  _clock_init                        clock
   00000116  C$clock.c$18$0_0$36                clock
   00000150  C$timer.c$9$0_0$12                 timer
";

    fn tables() -> SymbolTables {
        let mut tables = SymbolTables::new();
        tables.debug_info = Some(CdbParser::new().parse_str(CDB));
        tables.map = Some(MapParser::new().parse_str(MAP));
        tables
    }

    #[test]
    fn address_lookup_prefers_debug_info() {
        let tables = tables();
        let location = tables.address_to_source(0x116).expect("location");
        assert_eq!(location.file, "clock.c");
        assert_eq!(location.line, 18);
    }

    #[test]
    fn address_lookup_falls_back_to_map_markers() {
        let tables = tables();
        let location = tables.address_to_source(0x150).expect("location");
        assert_eq!(location.file, "timer.c");
        assert_eq!(location.line, 9);
    }

    #[test]
    fn line_lookup_matches_by_basename() {
        let tables = tables();
        assert_eq!(
            tables.source_line_to_address("/home/user/project/clock.c", 18),
            Some(0x116)
        );
        assert_eq!(
            tables.source_line_to_address(r"C:\project\timer.c", 9),
            Some(0x150)
        );
        assert_eq!(tables.source_line_to_address("clock.c", 99), None);
    }

    #[test]
    fn breakpoint_resolution_distinguishes_pending_from_unmapped() {
        let empty = SymbolTables::new();
        assert_eq!(
            empty.resolve_breakpoint("clock.c", 18),
            BreakpointResolution::NoTables
        );

        let tables = tables();
        assert_eq!(
            tables.resolve_breakpoint("clock.c", 18),
            BreakpointResolution::Resolved(0x116)
        );
        assert_eq!(
            tables.resolve_breakpoint("clock.c", 99),
            BreakpointResolution::NoCode
        );
    }

    #[test]
    fn exact_symbol_prefers_c_prefix() {
        let tables = tables();
        let symbol = tables
            .nearest_symbol(0x100, SymbolQuery::Exact)
            .expect("symbol");
        assert_eq!(symbol.name, "_main");
        assert_eq!(symbol.offset, 0);
        assert!(tables.nearest_symbol(0x101, SymbolQuery::Exact).is_none());
    }

    #[test]
    fn nearest_below_reports_offset() {
        let tables = tables();
        let symbol = tables
            .nearest_symbol(0x12E, SymbolQuery::NearestBelow)
            .expect("symbol");
        assert_eq!(symbol.name, "_clock_init");
        assert_eq!(symbol.offset, 4);
        assert_eq!(symbol.display(), "_clock_init+0x04");
    }

    #[test]
    fn no_symbol_below_lowest_address() {
        let tables = tables();
        assert!(tables
            .nearest_symbol(0x00FF, SymbolQuery::NearestBelow)
            .is_none());
    }

    #[test]
    fn line_markers_never_surface_as_display_symbols() {
        let tables = tables();
        let symbol = tables
            .nearest_symbol(0x116, SymbolQuery::NearestBelow)
            .expect("symbol");
        assert_eq!(symbol.name, "_main");
    }

    #[test]
    fn unresolved_paths_are_kept_verbatim() {
        let tables = tables();
        let location = tables.address_to_source(0x116).expect("location");
        assert!(location.resolved.is_none());
        assert_eq!(location.file, "clock.c");
    }
}
