//! Parsers for SDCC toolchain output.
//!
//! Two independent symbol sources describe the same program: the compiler's
//! hierarchical CDB debug info (modules, functions, symbols, line tables)
//! and the ASxxxx linker map (segments and flat symbols, with compiler line
//! info re-encoded into symbol names). Both parsers return `Option` — a
//! missing or unreadable file is "no table", never a hard error, so the
//! debugger can fall back to address-only operation.

pub mod cdb;
pub mod line_symbol;
pub mod map;
mod util;

pub use cdb::{CdbFunction, CdbParser, CdbSymbol, CdbType, LineEntry, Module, Scope};
pub use line_symbol::{decode_line_symbol, LineSymbol};
pub use map::{MapInfo, MapParser, MapSymbol, Segment};
