//! Content inspection handlers.
//! - handle_source: cached file content or the synthetic disassembly
//!   listing
//! - handle_read_memory: hex dump of the address space
//! - handle_disassemble: structured instruction list
//!
//! The synthetic listing is bound to source reference 1 for the lifetime
//! of the session; reference 0 always re-reads from disk uncached.

use std::path::Path;

use tracing::debug;

use zdb_z80::dasm;

use crate::protocol::{
    DisassembleArguments, DisassembledInstruction, DisassembleResponseBody, ReadMemoryArguments,
    ReadMemoryResponseBody, Request, SourceArguments, SourceResponseBody,
};
use crate::session::{mime_type_for, DISASSEMBLY_REFERENCE};
use crate::symbols::SymbolQuery;

use super::super::util::{format_hex, parse_address};
use super::super::{DebugAdapter, DispatchOutcome};

/// Instruction cap for the synthetic listing.
const LISTING_INSTRUCTIONS: usize = 256;

const MSG_UNKNOWN_REFERENCE: &str = "Unknown sourceReference";

impl DebugAdapter {
    pub(in crate::adapter) fn handle_source(
        &mut self,
        request: &Request,
        args: &SourceArguments,
    ) -> DispatchOutcome {
        let reference = if args.source_reference != 0 {
            args.source_reference
        } else {
            args.source
                .as_ref()
                .and_then(|source| source.source_reference)
                .unwrap_or(0)
        };

        if reference == DISASSEMBLY_REFERENCE {
            let body = SourceResponseBody {
                content: self.disassembly_listing(),
                mime_type: Some("text/x-asm".to_string()),
            };
            return DispatchOutcome {
                responses: vec![self.ok_response(request, Some(body))],
                ..DispatchOutcome::default()
            };
        }

        if reference != 0 {
            let Some(cached) = self.session().sources.get(reference) else {
                return DispatchOutcome {
                    responses: vec![self.error_response(request, MSG_UNKNOWN_REFERENCE)],
                    ..DispatchOutcome::default()
                };
            };
            let body = SourceResponseBody {
                content: cached.content.clone(),
                mime_type: Some(cached.mime_type.clone()),
            };
            return DispatchOutcome {
                responses: vec![self.ok_response(request, Some(body))],
                ..DispatchOutcome::default()
            };
        }

        // Reference 0: serve by path, straight from disk, no caching.
        let Some(path) = args
            .source
            .as_ref()
            .and_then(|source| source.path.as_deref())
        else {
            return DispatchOutcome {
                responses: vec![self.error_response(request, MSG_UNKNOWN_REFERENCE)],
                ..DispatchOutcome::default()
            };
        };
        let resolved = self
            .session()
            .symbols
            .resolve_source_path(path)
            .unwrap_or_else(|| Path::new(path).to_path_buf());
        match std::fs::read_to_string(&resolved) {
            Ok(content) => {
                let body = SourceResponseBody {
                    content,
                    mime_type: Some(mime_type_for(&resolved).to_string()),
                };
                DispatchOutcome {
                    responses: vec![self.ok_response(request, Some(body))],
                    ..DispatchOutcome::default()
                }
            }
            Err(err) => DispatchOutcome {
                responses: vec![
                    self.error_response(request, &format!("Unable to read source: {err}"))
                ],
                ..DispatchOutcome::default()
            },
        }
    }

    pub(in crate::adapter) fn handle_read_memory(
        &mut self,
        request: &Request,
        args: &ReadMemoryArguments,
    ) -> DispatchOutcome {
        let Some(base) = parse_address(&args.memory_reference) else {
            return DispatchOutcome {
                responses: vec![self.error_response(request, "invalid memory reference")],
                ..DispatchOutcome::default()
            };
        };

        let start = i64::from(base).saturating_add(args.offset).clamp(0, 0xFFFF) as usize;
        let memory = self.session().memory().as_slice();
        let end = start.saturating_add(args.count as usize).min(memory.len());
        let mut data = String::with_capacity((end - start) * 2);
        for byte in &memory[start..end] {
            data.push_str(&format!("{byte:02x}"));
        }

        let body = ReadMemoryResponseBody {
            address: format_hex(start as u16, 4),
            data: Some(data),
            unreadable_bytes: Some(0),
        };
        DispatchOutcome {
            responses: vec![self.ok_response(request, Some(body))],
            ..DispatchOutcome::default()
        }
    }

    pub(in crate::adapter) fn handle_disassemble(
        &mut self,
        request: &Request,
        args: &DisassembleArguments,
    ) -> DispatchOutcome {
        let Some(base) = parse_address(&args.memory_reference) else {
            return DispatchOutcome {
                responses: vec![self.error_response(request, "invalid memory reference")],
                ..DispatchOutcome::default()
            };
        };
        if args.instruction_offset != 0 {
            // Variable-length encoding has no way to walk backwards; the
            // client gets the forward window instead.
            debug!(
                instruction_offset = args.instruction_offset,
                "instructionOffset ignored"
            );
        }

        let mut address = base.wrapping_add(args.offset as u16);
        let mut instructions = Vec::with_capacity(args.instruction_count as usize);
        for _ in 0..args.instruction_count {
            let session = self.session();
            let decoded = dasm::disassemble(session.memory(), address);
            let memory = session.memory().as_slice();
            let mut bytes = String::new();
            for i in 0..decoded.length {
                let index = usize::from(address.wrapping_add(u16::from(i)));
                bytes.push_str(&format!("{:02X}", memory[index]));
            }
            let symbol = session
                .symbols
                .nearest_symbol(address, SymbolQuery::Exact)
                .map(|symbol| symbol.name.to_string());
            instructions.push(DisassembledInstruction {
                address: format_hex(address, 4),
                instruction_bytes: Some(bytes),
                instruction: self.rewrite_operands(decoded.mnemonic),
                symbol,
            });
            address = address.wrapping_add(u16::from(decoded.length));
        }

        let body = DisassembleResponseBody { instructions };
        DispatchOutcome {
            responses: vec![self.ok_response(request, Some(body))],
            ..DispatchOutcome::default()
        }
    }

    /// Renders the synthetic listing: address, opcode bytes, T-states and
    /// mnemonic columns, with symbol label lines and operand addresses
    /// rewritten to symbol names where one matches exactly.
    pub(in crate::adapter) fn disassembly_listing(&self) -> String {
        let session = self.session();
        let memory = session.memory();
        let mut out = String::new();
        let mut address: u32 = 0;

        for _ in 0..LISTING_INSTRUCTIONS {
            if address > 0xFFFF {
                break;
            }
            let at = address as u16;
            if let Some(symbol) = session.symbols.nearest_symbol(at, SymbolQuery::Exact) {
                out.push_str(&format!("{}:\n", symbol.name));
            }

            let decoded = dasm::disassemble(memory, at);
            let mut line = format!("      {address:06X} ");
            let mut opcode_chars = 0;
            for i in 0..decoded.length {
                let index = usize::from(at.wrapping_add(u16::from(i)));
                line.push_str(&format!("{:02x} ", memory.as_slice()[index]));
                opcode_chars += 3;
            }
            while opcode_chars < 13 {
                line.push(' ');
                opcode_chars += 1;
            }
            line.push_str(&format!("[{:2}]   ", decoded.tstates));
            line.push_str(&self.rewrite_operands(decoded.mnemonic));
            line.push('\n');
            out.push_str(&line);

            address += u32::from(decoded.length);
        }

        out
    }

    /// Replaces `0xNNNN` operands with a symbol name when one sits at
    /// exactly that address.
    fn rewrite_operands(&self, mnemonic: String) -> String {
        let Some(map) = self.session().symbols.map.as_ref() else {
            return mnemonic;
        };
        if map.symbols.is_empty() {
            return mnemonic;
        }

        let mut out = String::with_capacity(mnemonic.len());
        let mut rest = mnemonic.as_str();
        while let Some(position) = rest.find("0x") {
            let (before, tail) = rest.split_at(position);
            out.push_str(before);
            let digits: String = tail[2..].chars().take_while(char::is_ascii_hexdigit).collect();
            let consumed = 2 + digits.len();
            if digits.len() == 4 {
                if let Ok(value) = u16::from_str_radix(&digits, 16) {
                    if let Some(symbol) = self
                        .session()
                        .symbols
                        .nearest_symbol(value, SymbolQuery::Exact)
                    {
                        out.push_str(&symbol.name);
                        rest = &tail[consumed..];
                        continue;
                    }
                }
            }
            out.push_str(&tail[..consumed]);
            rest = &tail[consumed..];
        }
        out.push_str(rest);
        out
    }
}
