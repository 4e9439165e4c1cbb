//! Threads request handling.
//! - handle_threads: the model has exactly one execution thread

use crate::protocol::{Request, Thread, ThreadsResponseBody};
use crate::session::THREAD_ID;

use super::super::{DebugAdapter, DispatchOutcome};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_threads(&mut self, request: &Request) -> DispatchOutcome {
        let body = ThreadsResponseBody {
            threads: vec![Thread {
                id: THREAD_ID,
                name: "Z80 main".to_string(),
            }],
        };
        DispatchOutcome {
            responses: vec![self.ok_response(request, Some(body))],
            ..DispatchOutcome::default()
        }
    }
}
