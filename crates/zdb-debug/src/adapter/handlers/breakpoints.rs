//! Breakpoint handlers.
//! - handle_set_breakpoints: replace one file's lines, report per-line
//!   verification
//! - handle_set_instruction_breakpoints: replace the address set wholesale
//! - handle_set_exception_breakpoints: acknowledged, nothing to configure

use std::collections::HashSet;

use crate::protocol::{
    Breakpoint, Request, SetBreakpointsArguments, SetBreakpointsResponseBody,
    SetInstructionBreakpointsArguments,
};
use crate::symbols::BreakpointResolution;

use super::super::util::{format_hex, parse_address};
use super::super::{DebugAdapter, DispatchOutcome};

const MSG_NO_TABLES: &str = "pending: no symbol tables loaded";
const MSG_NO_CODE: &str = "no code generated for this line";
const MSG_BAD_REFERENCE: &str = "invalid instruction reference";

impl DebugAdapter {
    pub(in crate::adapter) fn handle_set_breakpoints(
        &mut self,
        request: &Request,
        args: &SetBreakpointsArguments,
    ) -> DispatchOutcome {
        let Some(path) = args
            .source
            .path
            .clone()
            .or_else(|| args.source.name.clone())
        else {
            return DispatchOutcome {
                responses: vec![self.error_response(request, "source path not provided")],
                ..DispatchOutcome::default()
            };
        };

        let lines: Vec<u32> = if args.breakpoints.is_empty() {
            args.lines.clone()
        } else {
            args.breakpoints.iter().map(|bp| bp.line).collect()
        };

        let session = self.session_mut();
        session.set_source_breakpoints(&path, lines.clone());
        session.rebuild_resolved_breakpoints();

        let breakpoints = lines
            .iter()
            .map(|line| {
                let verification = session.symbols.resolve_breakpoint(&path, *line);
                match verification {
                    BreakpointResolution::Resolved(address) => Breakpoint {
                        verified: true,
                        message: None,
                        source: Some(args.source.clone()),
                        line: Some(*line),
                        instruction_reference: Some(format_hex(address, 4)),
                    },
                    BreakpointResolution::NoTables => Breakpoint {
                        verified: false,
                        message: Some(MSG_NO_TABLES.to_string()),
                        source: Some(args.source.clone()),
                        line: Some(*line),
                        instruction_reference: None,
                    },
                    BreakpointResolution::NoCode => Breakpoint {
                        verified: false,
                        message: Some(MSG_NO_CODE.to_string()),
                        source: Some(args.source.clone()),
                        line: Some(*line),
                        instruction_reference: None,
                    },
                }
            })
            .collect();

        let body = SetBreakpointsResponseBody { breakpoints };
        DispatchOutcome {
            responses: vec![self.ok_response(request, Some(body))],
            ..DispatchOutcome::default()
        }
    }

    pub(in crate::adapter) fn handle_set_instruction_breakpoints(
        &mut self,
        request: &Request,
        args: &SetInstructionBreakpointsArguments,
    ) -> DispatchOutcome {
        let mut addresses = HashSet::new();
        let mut breakpoints = Vec::new();

        for requested in &args.breakpoints {
            match parse_address(&requested.instruction_reference) {
                Some(base) => {
                    let address = base.wrapping_add(requested.offset as u16);
                    addresses.insert(address);
                    breakpoints.push(Breakpoint {
                        verified: true,
                        message: None,
                        source: None,
                        line: None,
                        instruction_reference: Some(requested.instruction_reference.clone()),
                    });
                }
                None => breakpoints.push(Breakpoint {
                    verified: false,
                    message: Some(MSG_BAD_REFERENCE.to_string()),
                    source: None,
                    line: None,
                    instruction_reference: Some(requested.instruction_reference.clone()),
                }),
            }
        }

        self.session_mut().set_instruction_breakpoints(addresses);

        let body = SetBreakpointsResponseBody { breakpoints };
        DispatchOutcome {
            responses: vec![self.ok_response(request, Some(body))],
            ..DispatchOutcome::default()
        }
    }

    pub(in crate::adapter) fn handle_set_exception_breakpoints(
        &mut self,
        request: &Request,
    ) -> DispatchOutcome {
        let body = SetBreakpointsResponseBody {
            breakpoints: Vec::new(),
        };
        DispatchOutcome {
            responses: vec![self.ok_response(request, Some(body))],
            ..DispatchOutcome::default()
        }
    }
}
