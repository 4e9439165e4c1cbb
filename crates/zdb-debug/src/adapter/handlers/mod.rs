//! DAP request handlers grouped by area.
//! - initialize: capability negotiation
//! - lifecycle: launch/configurationDone/disconnect
//! - breakpoints: source, instruction and exception breakpoints
//! - run_control: continue and the stepping commands
//! - threads / stack_trace / scopes: inspection of the stopped target
//! - inspect: source content, memory reads, disassembly

mod breakpoints;
mod initialize;
mod inspect;
mod lifecycle;
mod run_control;
mod scopes;
mod stack_trace;
mod threads;
