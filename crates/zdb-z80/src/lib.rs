//! Z80 CPU core and disassembler.
//!
//! The CPU is separated from memory via the [`Bus`] trait so the same core
//! can run against a flat test buffer or the debug session's address space.
//! Execution is instruction-granular: [`Z80::step`] fetches, decodes and
//! executes exactly one instruction and returns its T-state cost.
//!
//! The core implements the unprefixed main block, the CB bit/rotate block,
//! the common ED block and the DD/FD indexed forms. Opcodes outside that
//! set decode to their documented length and execute as no-ops, so stepping
//! never gets stuck on an image the core does not fully model.

pub mod bus;
pub mod cpu;
pub mod dasm;

pub use bus::{Bus, FlatMemory, MEMORY_SIZE};
pub use cpu::{Reg, Z80};
pub use dasm::{disassemble, Disassembled};
