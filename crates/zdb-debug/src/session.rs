//! Per-connection debug session state.
//!
//! One [`DebugSession`] exists per connected client, owned by that
//! connection's dispatch loop. Nothing here is shared: the CPU, the 64 KiB
//! address space, both breakpoint sets, the symbol tables and the source
//! cache all live and die with the connection.

use std::collections::HashMap;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use zdb_z80::{FlatMemory, Reg, Z80};

use crate::symbols::{BreakpointResolution, SourceLocation, SymbolTables};

/// The single emulated execution thread.
pub const THREAD_ID: u32 = 1;

/// Source reference permanently bound to the synthetic disassembly
/// listing.
pub const DISASSEMBLY_REFERENCE: u32 = 1;

/// First reference handed out for genuine cached files; leaves the low
/// range to the reserved references.
const FIRST_FILE_REFERENCE: u32 = 1000;

/// A cached source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSource {
    pub content: String,
    pub mime_type: String,
}

/// Bidirectional reference <-> content cache for `source` requests.
/// Reference 0 means "re-read from disk, do not cache" and is never
/// stored here.
#[derive(Debug, Default)]
pub struct SourceCache {
    by_path: HashMap<PathBuf, u32>,
    entries: HashMap<u32, CachedSource>,
    next_reference: u32,
}

impl SourceCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_path: HashMap::new(),
            entries: HashMap::new(),
            next_reference: FIRST_FILE_REFERENCE,
        }
    }

    pub fn reset(&mut self) {
        self.by_path.clear();
        self.entries.clear();
        self.next_reference = FIRST_FILE_REFERENCE;
    }

    /// Returns the reference for `path`, reading and caching the file on
    /// first use.
    pub fn ensure_reference(&mut self, path: &Path) -> io::Result<u32> {
        if let Some(reference) = self.by_path.get(path) {
            return Ok(*reference);
        }
        let content = std::fs::read_to_string(path)?;
        let reference = self.next_reference;
        self.next_reference += 1;
        self.by_path.insert(path.to_path_buf(), reference);
        self.entries.insert(
            reference,
            CachedSource {
                content,
                mime_type: mime_type_for(path).to_string(),
            },
        );
        Ok(reference)
    }

    #[must_use]
    pub fn get(&self, reference: u32) -> Option<&CachedSource> {
        self.entries.get(&reference)
    }
}

/// MIME type by extension; the client uses it to pick a highlighter.
#[must_use]
pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("c") | Some("h") => "text/x-c",
        Some("asm") | Some("s") | Some("lst") => "text/x-asm",
        _ => "text/plain",
    }
}

/// All mutable state of one debugging session.
pub struct DebugSession {
    cpu: Z80,
    memory: FlatMemory,
    launched: bool,
    pending_entry_stop: bool,
    /// Lines as last set by the client, per file path as given. Replaced
    /// wholesale per file, never merged.
    source_breakpoints: IndexMap<String, Vec<u32>>,
    /// Addresses derived from `source_breakpoints`; always rebuilt from
    /// scratch so late-loaded symbol tables can never leave it stale.
    resolved_breakpoints: HashSet<u16>,
    /// Addresses set directly by the client; independent lifecycle.
    instruction_breakpoints: HashSet<u16>,
    pub symbols: SymbolTables,
    pub sources: SourceCache,
    program_path: Option<PathBuf>,
}

impl DebugSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cpu: Z80::new(),
            memory: FlatMemory::new(),
            launched: false,
            pending_entry_stop: false,
            source_breakpoints: IndexMap::new(),
            resolved_breakpoints: HashSet::new(),
            instruction_breakpoints: HashSet::new(),
            symbols: SymbolTables::new(),
            sources: SourceCache::new(),
            program_path: None,
        }
    }

    /// Launch-time reset: memory cleared, tables and caches dropped,
    /// breakpoints forgotten. The session object itself survives for the
    /// lifetime of the connection.
    pub fn reset_for_launch(&mut self) {
        self.cpu.reset();
        self.memory.clear();
        self.launched = false;
        self.pending_entry_stop = false;
        self.source_breakpoints.clear();
        self.resolved_breakpoints.clear();
        self.instruction_breakpoints.clear();
        self.symbols.clear();
        self.sources.reset();
        self.program_path = None;
    }

    #[must_use]
    pub fn launched(&self) -> bool {
        self.launched
    }

    pub fn set_launched(&mut self, launched: bool) {
        self.launched = launched;
    }

    pub fn set_pending_entry_stop(&mut self) {
        self.pending_entry_stop = true;
    }

    /// Consumes the deferred entry stop set by `launch`.
    pub fn take_pending_entry_stop(&mut self) -> bool {
        std::mem::take(&mut self.pending_entry_stop)
    }

    #[must_use]
    pub fn memory(&self) -> &FlatMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut FlatMemory {
        &mut self.memory
    }

    #[must_use]
    pub fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    #[must_use]
    pub fn pc(&self) -> u16 {
        self.cpu.pc()
    }

    pub fn set_pc(&mut self, address: u16) {
        self.cpu.set_reg(Reg::PC, address);
    }

    /// Executes exactly one instruction.
    pub fn step(&mut self) {
        self.cpu.step(&mut self.memory);
    }

    pub fn set_program_path(&mut self, path: PathBuf) {
        self.program_path = Some(path);
    }

    #[must_use]
    pub fn program_path(&self) -> Option<&Path> {
        self.program_path.as_deref()
    }

    /// Replaces the breakpoint lines for one file.
    pub fn set_source_breakpoints(&mut self, path: &str, lines: Vec<u32>) {
        if lines.is_empty() {
            self.source_breakpoints.shift_remove(path);
        } else {
            self.source_breakpoints.insert(path.to_string(), lines);
        }
    }

    /// Replaces the whole instruction breakpoint set.
    pub fn set_instruction_breakpoints(&mut self, addresses: HashSet<u16>) {
        self.instruction_breakpoints = addresses;
    }

    /// Rebuilds `resolved_breakpoints` from every tracked (file, line)
    /// pair. Idempotent and order-independent; lines with no mapping are
    /// simply omitted.
    pub fn rebuild_resolved_breakpoints(&mut self) {
        let mut resolved = HashSet::new();
        for (file, lines) in &self.source_breakpoints {
            for line in lines {
                if let BreakpointResolution::Resolved(address) =
                    self.symbols.resolve_breakpoint(file, *line)
                {
                    resolved.insert(address);
                }
            }
        }
        self.resolved_breakpoints = resolved;
    }

    #[must_use]
    pub fn breakpoint_hit(&self, address: u16) -> bool {
        self.resolved_breakpoints.contains(&address)
            || self.instruction_breakpoints.contains(&address)
    }

    #[must_use]
    pub fn resolved_breakpoints(&self) -> &HashSet<u16> {
        &self.resolved_breakpoints
    }

    /// Source position of the current program counter, if any table maps
    /// it.
    #[must_use]
    pub fn current_location(&self) -> Option<SourceLocation> {
        self.symbols.address_to_source(self.pc())
    }
}

impl Default for DebugSession {
    fn default() -> Self {
        Self::new()
    }
}
