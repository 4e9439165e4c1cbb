//! Debug Adapter Protocol (DAP) server for SDCC-compiled Z80 targets.
//!
//! The adapter speaks Content-Length framed JSON over a byte stream and
//! drives an in-process Z80 emulator: breakpoints are reconciled against
//! SDCC CDB debug info and the linker map, execution control steps the CPU
//! oracle, and inspection requests read registers, memory and synthetic
//! disassembly.

mod adapter;
mod image;
mod protocol;
mod session;
mod symbols;

pub use adapter::DebugAdapter;
pub use image::{companion_path, load_binary, load_ihx, load_program, ImageError, LoadedImage};
pub use protocol::{
    Breakpoint, Capabilities, Command, ContinueResponseBody, DisassembleArguments,
    DisassembledInstruction, DisassembleResponseBody, DisconnectArguments, Event,
    InitializeArguments, InstructionBreakpoint, LaunchArguments, MessageType, OutputEventBody,
    ProtocolError, ReadMemoryArguments, ReadMemoryResponseBody, Request, Response,
    ResponseBuilder, Scope, ScopesArguments, ScopesResponseBody, SetBreakpointsArguments,
    SetBreakpointsResponseBody, SetInstructionBreakpointsArguments, Source, SourceArguments,
    SourceBreakpoint, SourceResponseBody, StackFrame, StackTraceArguments,
    StackTraceResponseBody, StoppedEventBody, Thread, ThreadExecutionArguments,
    ThreadsResponseBody, Variable, VariablesArguments, VariablesResponseBody,
};
pub use session::{CachedSource, DebugSession, SourceCache, DISASSEMBLY_REFERENCE, THREAD_ID};
pub use symbols::{
    BreakpointResolution, NearestSymbol, SourceLocation, SymbolQuery, SymbolTables,
};
