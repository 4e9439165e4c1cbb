//! Parser for SDCC CDB debug-info files.
//!
//! CDB files are line-oriented records. The subset understood here covers
//! what the debugger needs:
//!
//! ```text
//! M:clock                                      module
//! F:G$clock_init$0$0({2}DF,SV:S),Z,0,0,0,0,0   function
//! S:G$SECOND$0$0({1}SC:U),E,0,0                global symbol
//! S:Lclock.clock_loop$hour$1$1({2}SI:S),E,0,0  function-local symbol
//! T:Fclock$dim_s[({0}S:S$width$0$0...)]        type definition
//! L:C$clock.c$18$1$1:74                        source line -> address
//! ```
//!
//! Records that the subset does not model (assembler lines, register
//! assignments) are skipped, not errors.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use smol_str::SmolStr;

use crate::util::{parse_hex, read_lines};

/// Visibility of a CDB record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Local,
}

impl Scope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "local",
        }
    }
}

/// A named data symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdbSymbol {
    pub name: SmolStr,
    pub scope: Scope,
    pub type_info: String,
}

/// A function with its local symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdbFunction {
    pub name: SmolStr,
    pub scope: Scope,
    pub local_symbols: Vec<CdbSymbol>,
}

/// A type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdbType {
    pub name: SmolStr,
    pub scope: Scope,
    pub type_info: String,
}

/// A source line mapped to a code address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEntry {
    pub file: String,
    pub line: u32,
    pub address: u16,
    pub scope: Scope,
}

/// One compilation unit of the CDB file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub name: SmolStr,
    pub file: String,
    pub functions: Vec<CdbFunction>,
    pub global_symbols: Vec<CdbSymbol>,
    pub types: Vec<CdbType>,
    pub lines: Vec<LineEntry>,
}

// F:G$clock_init$0$0({2}DF,SV:S),Z,0,0,0,0,0
static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^F:([GFL])([^$]*)\$([^$]+)\$[^$]+\$[^$(]*\((.*?)\)").expect("function regex")
});

// S:G$SECOND$0$0({1}SC:U),E,0,0
static SYMBOL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^S:([GFL])([^$]*)\$([^$]+)\$[^$]+\$[^$(]*\((.*?)\)").expect("symbol regex")
});

// T:Fclock$dim_s[...]
static TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^T:([GFL])([^$]*)\$([^$\[]+)(\[.*)?$").expect("type regex"));

// L:C$clock.c$18$1$1:74
static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^L:C\$(.+?)\$(\d+)\$(\d+)\$[^:]*:([0-9A-Fa-f]+)$").expect("line regex")
});

/// Parser for CDB files. `parse` yields `None` when the file cannot be
/// read; an empty or unrecognized file parses to an empty module list.
#[derive(Debug, Default)]
pub struct CdbParser {
    data: Vec<Module>,
}

impl CdbParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, path: &Path) -> Option<Vec<Module>> {
        let lines = read_lines(path)?;
        self.data = parse_records(lines.iter().map(String::as_str));
        Some(self.data.clone())
    }

    #[must_use]
    pub fn parse_str(&mut self, text: &str) -> Vec<Module> {
        self.data = parse_records(text.lines());
        self.data.clone()
    }

    #[must_use]
    pub fn data(&self) -> &[Module] {
        &self.data
    }
}

fn parse_records<'a, I>(lines: I) -> Vec<Module>
where
    I: Iterator<Item = &'a str>,
{
    let mut modules: Vec<Module> = Vec::new();

    for raw in lines {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix("M:") {
            let name = name.trim();
            modules.push(Module {
                name: SmolStr::new(name),
                file: format!("{name}.c"),
                ..Module::default()
            });
            continue;
        }

        let Some(module) = modules.last_mut() else {
            // Records before the first module header have nowhere to go.
            continue;
        };

        if let Some(captures) = FUNCTION_RE.captures(line) {
            module.functions.push(CdbFunction {
                name: SmolStr::new(&captures[3]),
                scope: designator_scope(&captures[1]),
                local_symbols: Vec::new(),
            });
        } else if let Some(captures) = SYMBOL_RE.captures(line) {
            let symbol = CdbSymbol {
                name: SmolStr::new(&captures[3]),
                scope: designator_scope(&captures[1]),
                type_info: format!("({})", &captures[4]),
            };
            match symbol.scope {
                Scope::Global => module.global_symbols.push(symbol),
                Scope::Local => attach_local(module, &captures[2], symbol),
            }
        } else if let Some(captures) = TYPE_RE.captures(line) {
            module.types.push(CdbType {
                name: SmolStr::new(&captures[3]),
                scope: designator_scope(&captures[1]),
                type_info: captures
                    .get(4)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            });
        } else if let Some(captures) = LINE_RE.captures(line) {
            let Some(line_number) = captures[2].parse::<u32>().ok() else {
                continue;
            };
            let Some(address) = parse_hex(&captures[4]) else {
                continue;
            };
            let level: u32 = captures[3].parse().unwrap_or(0);
            module.lines.push(LineEntry {
                file: captures[1].to_string(),
                line: line_number,
                address: (address & 0xFFFF) as u16,
                scope: if level > 0 { Scope::Local } else { Scope::Global },
            });
        }
    }

    modules
}

fn designator_scope(designator: &str) -> Scope {
    if designator == "G" {
        Scope::Global
    } else {
        Scope::Local
    }
}

/// Attaches a local symbol to the function named in its `L` scope path,
/// e.g. `clock.clock_loop` -> function `clock_loop`.
fn attach_local(module: &mut Module, scope_path: &str, symbol: CdbSymbol) {
    let function_name = scope_path.rsplit('.').next().unwrap_or(scope_path);
    if let Some(function) = module
        .functions
        .iter_mut()
        .find(|function| function.name == function_name)
    {
        function.local_symbols.push(symbol);
    }
}
