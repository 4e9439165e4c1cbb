//! Stack trace request handling.
//! - handle_stack_trace: one synthetic frame at the program counter
//!
//! The Z80 has no frame chain the adapter could walk, so the trace is a
//! single frame: a resolved source line when a table maps the program
//! counter, the synthetic disassembly listing otherwise.

use tracing::debug;

use crate::protocol::{
    Request, Source, StackFrame, StackTraceArguments, StackTraceResponseBody,
};
use crate::session::DISASSEMBLY_REFERENCE;
use crate::symbols::SymbolQuery;

use super::super::util::format_hex;
use super::super::{DebugAdapter, DispatchOutcome};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_stack_trace(
        &mut self,
        request: &Request,
        _args: &StackTraceArguments,
    ) -> DispatchOutcome {
        let session = self.session_mut();
        let pc = session.pc();
        let name = session
            .symbols
            .nearest_symbol(pc, SymbolQuery::NearestBelow)
            .map_or_else(|| format_hex(pc, 4), |symbol| symbol.display());

        let frame = match session.current_location() {
            Some(location) => {
                // Resolved files get a cached reference so the client can
                // fetch content without resending the path; unresolved
                // ones keep the original path verbatim.
                let (path, reference) = match location.resolved.as_ref() {
                    Some(resolved) => {
                        let reference = match session.sources.ensure_reference(resolved) {
                            Ok(reference) => Some(reference),
                            Err(err) => {
                                debug!(path = %resolved.display(), error = %err, "source not cacheable");
                                None
                            }
                        };
                        (resolved.display().to_string(), reference)
                    }
                    None => (location.file.clone(), None),
                };
                StackFrame {
                    id: 0,
                    name,
                    source: Some(Source {
                        name: Some(basename(&location.file).to_string()),
                        path: Some(path),
                        source_reference: reference,
                    }),
                    line: location.line,
                    column: 1,
                    instruction_pointer_reference: Some(format_hex(pc, 4)),
                }
            }
            None => StackFrame {
                id: 0,
                name,
                source: Some(Source {
                    name: Some("Disassembly".to_string()),
                    path: None,
                    source_reference: Some(DISASSEMBLY_REFERENCE),
                }),
                line: 1,
                column: 1,
                instruction_pointer_reference: Some(format_hex(pc, 4)),
            },
        };

        let body = StackTraceResponseBody {
            stack_frames: vec![frame],
            total_frames: Some(1),
        };
        DispatchOutcome {
            responses: vec![self.ok_response(request, Some(body))],
            ..DispatchOutcome::default()
        }
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
