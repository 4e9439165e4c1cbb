use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// DAP envelope message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
    Response,
    Event,
}

/// Errors crossing the protocol boundary.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Unparseable JSON or a missing envelope field.
    #[error("Malformed request")]
    MalformedRequest(#[source] serde_json::Error),
}

/// Generic DAP request message. Parsed once per inbound frame; command
/// arguments stay dynamic here and are decoded into [`Command`] exactly
/// once before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub seq: u32,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl Request {
    /// Parses one frame payload. Never panics: bad input is a typed
    /// failure the dispatcher turns into a `success:false` response.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::MalformedRequest)
    }
}

/// Generic DAP response message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub seq: u32,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(rename = "request_seq", alias = "requestSeq")]
    pub request_seq: u32,
    pub success: bool,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Fluent response accumulator. Every setter is last-write-wins, so call
/// order never matters; `finish` seals the message with its wire seq.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    request_seq: u32,
    command: String,
    success: bool,
    message: Option<String>,
    body: Option<Value>,
}

impl ResponseBuilder {
    #[must_use]
    pub fn new(request_seq: u32, command: impl Into<String>) -> Self {
        Self {
            request_seq,
            command: command.into(),
            success: true,
            message: None,
            body: None,
        }
    }

    #[must_use]
    pub fn success(mut self, ok: bool) -> Self {
        self.success = ok;
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn finish(self, seq: u32) -> Response {
        Response {
            seq,
            message_type: MessageType::Response,
            request_seq: self.request_seq,
            success: self.success,
            command: self.command,
            message: self.message,
            body: self.body,
        }
    }
}

/// Generic DAP event message. Events carry their own sequence counter,
/// independent of responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub seq: u32,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Stopped event body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoppedEventBody {
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_threads_stopped: Option<bool>,
}

/// Output event body for console messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutputEventBody {
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// DAP source descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<u32>,
}

/// Capabilities advertised by the adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_configuration_done_request: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_disassemble_request: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_read_memory_request: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_instruction_breakpoints: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_memory_references: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_stepping_granularity: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_evaluate_for_hovers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_set_variable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_step_back: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_restart_frame: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_terminate_debuggee: Option<bool>,
}

/// Arguments for `initialize`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct InitializeArguments {
    pub client_id: Option<String>,
    pub adapter_id: Option<String>,
    pub lines_start_at1: Option<bool>,
    pub columns_start_at1: Option<bool>,
    pub path_format: Option<String>,
}

/// Arguments for `launch`. Defaults make the decode total: a launch with
/// no arguments is a launch of nothing, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchArguments {
    /// Program image to load: flat binary or Intel HEX by extension.
    pub program: Option<String>,
    /// Suppress symbol-table loading entirely.
    pub no_debug: bool,
    /// Compiler debug info; defaults to `<program>.cdb` next to the image.
    pub cdb_file: Option<String>,
    /// Linker map; defaults to `<program>.map` next to the image.
    pub map_file: Option<String>,
    /// Extra directories to try when resolving source paths.
    pub source_roots: Vec<String>,
}

/// One requested source breakpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceBreakpoint {
    pub line: u32,
    pub column: Option<u32>,
    pub condition: Option<String>,
}

impl Default for SourceBreakpoint {
    fn default() -> Self {
        Self {
            line: 1,
            column: None,
            condition: None,
        }
    }
}

/// Arguments for `setBreakpoints`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SetBreakpointsArguments {
    pub source: Source,
    pub breakpoints: Vec<SourceBreakpoint>,
    /// Deprecated client shape carrying bare line numbers.
    pub lines: Vec<u32>,
}

/// One requested instruction breakpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct InstructionBreakpoint {
    pub instruction_reference: String,
    pub offset: i64,
}

/// Arguments for `setInstructionBreakpoints`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SetInstructionBreakpointsArguments {
    pub breakpoints: Vec<InstructionBreakpoint>,
}

/// Breakpoint verification result sent back to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction_reference: Option<String>,
}

/// Response body for `setBreakpoints` and `setInstructionBreakpoints`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointsResponseBody {
    pub breakpoints: Vec<Breakpoint>,
}

/// Arguments for `continue`, `next`, `stepIn` and `stepOut`. The model has
/// exactly one thread, so the id is accepted and otherwise ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreadExecutionArguments {
    pub thread_id: u32,
    pub granularity: Option<String>,
}

/// Response body for `continue`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContinueResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_threads_continued: Option<bool>,
}

/// DAP thread description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: u32,
    pub name: String,
}

/// Response body for `threads`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThreadsResponseBody {
    pub threads: Vec<Thread>,
}

/// Arguments for `stackTrace`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StackTraceArguments {
    pub thread_id: u32,
    pub start_frame: Option<u32>,
    pub levels: Option<u32>,
}

/// DAP stack frame description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub id: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    pub line: u32,
    pub column: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction_pointer_reference: Option<String>,
}

/// Response body for `stackTrace`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StackTraceResponseBody {
    pub stack_frames: Vec<StackFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_frames: Option<u32>,
}

/// Arguments for `scopes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ScopesArguments {
    pub frame_id: u32,
}

/// DAP scope description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub name: String,
    pub variables_reference: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_hint: Option<String>,
    pub expensive: bool,
}

/// Response body for `scopes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScopesResponseBody {
    pub scopes: Vec<Scope>,
}

/// Arguments for `variables`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VariablesArguments {
    pub variables_reference: u32,
}

/// DAP variable description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    pub value: String,
    pub variables_reference: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_reference: Option<String>,
}

/// Response body for `variables`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VariablesResponseBody {
    pub variables: Vec<Variable>,
}

/// Arguments for `source`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceArguments {
    pub source: Option<Source>,
    pub source_reference: u32,
}

/// Response body for `source`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceResponseBody {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Arguments for `readMemory`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadMemoryArguments {
    pub memory_reference: String,
    pub offset: i64,
    pub count: u64,
}

/// Response body for `readMemory`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadMemoryResponseBody {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unreadable_bytes: Option<u64>,
}

fn default_instruction_count() -> u32 {
    10
}

/// Arguments for `disassemble`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DisassembleArguments {
    pub memory_reference: String,
    pub offset: i64,
    pub instruction_offset: i64,
    #[serde(default = "default_instruction_count")]
    pub instruction_count: u32,
}

impl Default for DisassembleArguments {
    fn default() -> Self {
        Self {
            memory_reference: String::new(),
            offset: 0,
            instruction_offset: 0,
            instruction_count: default_instruction_count(),
        }
    }
}

/// One disassembled instruction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DisassembledInstruction {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction_bytes: Option<String>,
    pub instruction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// Response body for `disassemble`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DisassembleResponseBody {
    pub instructions: Vec<DisassembledInstruction>,
}

/// Arguments for `disconnect`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DisconnectArguments {
    pub restart: bool,
    pub terminate_debuggee: Option<bool>,
}

/// The closed set of commands the adapter understands, decoded exactly
/// once at the protocol boundary. Decoding is total: missing or malformed
/// arguments fall back to the documented defaults, and a command outside
/// the set becomes [`Command::Unknown`] carrying the raw name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Initialize(InitializeArguments),
    Launch(LaunchArguments),
    SetBreakpoints(SetBreakpointsArguments),
    SetInstructionBreakpoints(SetInstructionBreakpointsArguments),
    SetExceptionBreakpoints,
    ConfigurationDone,
    Threads,
    StackTrace(StackTraceArguments),
    Scopes(ScopesArguments),
    Variables(VariablesArguments),
    Continue(ThreadExecutionArguments),
    Next(ThreadExecutionArguments),
    StepIn(ThreadExecutionArguments),
    StepOut(ThreadExecutionArguments),
    Source(SourceArguments),
    ReadMemory(ReadMemoryArguments),
    Disassemble(DisassembleArguments),
    Disconnect(DisconnectArguments),
    Unknown(String),
}

fn decode_arguments<T>(request: &Request) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    request
        .arguments
        .clone()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default()
}

impl Command {
    #[must_use]
    pub fn decode(request: &Request) -> Self {
        match request.command.as_str() {
            "initialize" => Self::Initialize(decode_arguments(request)),
            "launch" => Self::Launch(decode_arguments(request)),
            "setBreakpoints" => Self::SetBreakpoints(decode_arguments(request)),
            "setInstructionBreakpoints" => {
                Self::SetInstructionBreakpoints(decode_arguments(request))
            }
            "setExceptionBreakpoints" => Self::SetExceptionBreakpoints,
            "configurationDone" => Self::ConfigurationDone,
            "threads" => Self::Threads,
            "stackTrace" => Self::StackTrace(decode_arguments(request)),
            "scopes" => Self::Scopes(decode_arguments(request)),
            "variables" => Self::Variables(decode_arguments(request)),
            "continue" => Self::Continue(decode_arguments(request)),
            "next" => Self::Next(decode_arguments(request)),
            "stepIn" => Self::StepIn(decode_arguments(request)),
            "stepOut" => Self::StepOut(decode_arguments(request)),
            "source" => Self::Source(decode_arguments(request)),
            "readMemory" => Self::ReadMemory(decode_arguments(request)),
            "disassemble" => Self::Disassemble(decode_arguments(request)),
            "disconnect" => Self::Disconnect(decode_arguments(request)),
            other => Self::Unknown(other.to_string()),
        }
    }
}
