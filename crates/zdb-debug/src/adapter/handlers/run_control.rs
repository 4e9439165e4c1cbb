//! Continue/step handlers.
//! - handle_continue: run to the next breakpoint
//! - handle_next: step over to the next source line
//! - handle_step_in/handle_step_out: single instruction steps
//!
//! Every stop reply is written before its `stopped` event; the dispatch
//! outcome ordering enforces that, so none of these handlers defers work.

use tracing::debug;

use crate::protocol::{ContinueResponseBody, Request, ThreadExecutionArguments};

use super::super::{DebugAdapter, DispatchOutcome};

/// Safety valve for `continue` and `next`: guarantees termination with no
/// breakpoints set, it is not a designed execution budget.
const STEP_LIMIT: u32 = 1_000_000;

const MSG_NOT_LAUNCHED: &str = "no program launched";

impl DebugAdapter {
    pub(in crate::adapter) fn handle_continue(
        &mut self,
        request: &Request,
        _args: &ThreadExecutionArguments,
    ) -> DispatchOutcome {
        if !self.session().launched() {
            return DispatchOutcome {
                responses: vec![self.error_response(request, MSG_NOT_LAUNCHED)],
                ..DispatchOutcome::default()
            };
        }

        // Step before checking: a continue issued while already stopped on
        // a breakpoint address must make progress, not re-trigger at once.
        let session = self.session_mut();
        let mut hit = false;
        let mut steps = 0u32;
        while steps < STEP_LIMIT {
            session.step();
            steps += 1;
            if !session.launched() {
                break;
            }
            if session.breakpoint_hit(session.pc()) {
                hit = true;
                break;
            }
        }
        debug!(steps, hit, pc = session.pc(), "continue finished");

        let response = self.ok_response(
            request,
            Some(ContinueResponseBody {
                all_threads_continued: Some(true),
            }),
        );
        let events = if hit {
            vec![self.stopped_event("breakpoint")]
        } else {
            Vec::new()
        };

        DispatchOutcome {
            responses: vec![response],
            events,
            should_exit: false,
        }
    }

    pub(in crate::adapter) fn handle_next(
        &mut self,
        request: &Request,
        _args: &ThreadExecutionArguments,
    ) -> DispatchOutcome {
        if !self.session().launched() {
            return DispatchOutcome {
                responses: vec![self.error_response(request, MSG_NOT_LAUNCHED)],
                ..DispatchOutcome::default()
            };
        }

        let session = self.session_mut();
        match session.current_location() {
            Some(start) => {
                // Step over sub-line instructions until the mapped
                // (file, line) changes, not just one opcode.
                let mut steps = 0u32;
                while steps < STEP_LIMIT {
                    session.step();
                    steps += 1;
                    match session.current_location() {
                        Some(current)
                            if current.file == start.file && current.line == start.line => {}
                        Some(_) => break,
                        None => {}
                    }
                }
                debug!(steps, pc = session.pc(), "next finished");
            }
            None => {
                // No source mapping: disassembly-only stepping.
                session.step();
            }
        }

        self.single_step_outcome(request)
    }

    pub(in crate::adapter) fn handle_step_in(
        &mut self,
        request: &Request,
        _args: &ThreadExecutionArguments,
    ) -> DispatchOutcome {
        if !self.session().launched() {
            return DispatchOutcome {
                responses: vec![self.error_response(request, MSG_NOT_LAUNCHED)],
                ..DispatchOutcome::default()
            };
        }
        // Intentionally unrefined: one instruction, no call awareness.
        self.session_mut().step();
        self.single_step_outcome(request)
    }

    pub(in crate::adapter) fn handle_step_out(
        &mut self,
        request: &Request,
        _args: &ThreadExecutionArguments,
    ) -> DispatchOutcome {
        if !self.session().launched() {
            return DispatchOutcome {
                responses: vec![self.error_response(request, MSG_NOT_LAUNCHED)],
                ..DispatchOutcome::default()
            };
        }
        // Intentionally unrefined: one instruction, no return awareness.
        self.session_mut().step();
        self.single_step_outcome(request)
    }

    fn single_step_outcome(&mut self, request: &Request) -> DispatchOutcome {
        let response = self.ok_response(
            request,
            Some(ContinueResponseBody {
                all_threads_continued: Some(true),
            }),
        );
        let stopped = self.stopped_event("step");
        DispatchOutcome {
            responses: vec![response],
            events: vec![stopped],
            should_exit: false,
        }
    }
}
