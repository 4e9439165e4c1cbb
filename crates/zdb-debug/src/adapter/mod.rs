//! Debug adapter module map.
//! - core: connection loop, request dispatch, response/event builders
//! - handlers: DAP request handlers by area
//! - protocol_io: Content-Length message framing
//! - util: small shared helpers
//! - tests: adapter unit tests

mod core;
mod handlers;
mod protocol_io;
mod util;

#[cfg(test)]
mod tests;

use serde_json::Value;

use crate::session::DebugSession;

/// Everything one dispatched request produced. The run loop writes all
/// responses first, then all events; that ordering is what guarantees the
/// DAP rule "response before the event it provokes" without any timing
/// assumptions.
#[derive(Debug, Default)]
pub(crate) struct DispatchOutcome {
    pub(crate) responses: Vec<Value>,
    pub(crate) events: Vec<Value>,
    pub(crate) should_exit: bool,
}

/// DAP adapter for one client connection.
///
/// Owns the session exclusively; the connection's sequential read ->
/// dispatch -> write loop is the mutual exclusion around all state. Both
/// sequence counters are connection-scoped so concurrent server sessions
/// can never observe each other's numbering.
pub struct DebugAdapter {
    session: DebugSession,
    next_seq: u32,
    event_seq: u32,
}
