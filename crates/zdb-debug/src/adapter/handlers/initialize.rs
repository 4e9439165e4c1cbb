//! Initialize handler.
//! - handle_initialize: advertise capabilities, then raise `initialized`

use serde_json::Value;

use crate::protocol::{Capabilities, InitializeArguments, Request};

use super::super::{DebugAdapter, DispatchOutcome};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_initialize(
        &mut self,
        request: &Request,
        _args: &InitializeArguments,
    ) -> DispatchOutcome {
        let capabilities = Capabilities {
            supports_configuration_done_request: Some(true),
            supports_disassemble_request: Some(true),
            supports_read_memory_request: Some(true),
            supports_instruction_breakpoints: Some(true),
            supports_memory_references: Some(true),
            supports_stepping_granularity: Some(true),
            supports_evaluate_for_hovers: Some(false),
            supports_set_variable: Some(false),
            supports_step_back: Some(false),
            supports_restart_frame: Some(false),
            supports_terminate_debuggee: Some(false),
        };

        let response = self.ok_response(request, Some(capabilities));
        let initialized = self.event("initialized", Option::<Value>::None);

        DispatchOutcome {
            responses: vec![response],
            events: vec![initialized],
            should_exit: false,
        }
    }
}
