//! Adapter unit tests.
//! - framing roundtrips
//! - request dispatch and event ordering
//! - breakpoint verification and execution control

use std::io::BufReader;

use serde_json::{json, Value};

use super::protocol_io::{read_message, write_message};
use super::DebugAdapter;
use crate::protocol::{
    Breakpoint, Capabilities, ContinueResponseBody, DisassembleResponseBody, Event,
    ReadMemoryResponseBody, Request, Response, ScopesResponseBody, SetBreakpointsResponseBody,
    SourceResponseBody, StackTraceResponseBody, ThreadsResponseBody, VariablesResponseBody,
};
use crate::session::DISASSEMBLY_REFERENCE;
use zdb_sdcc::{CdbParser, MapParser};
use zdb_z80::Bus;

fn dispatch(adapter: &mut DebugAdapter, payload: Value) -> super::DispatchOutcome {
    let request = Request::parse(&payload.to_string()).expect("request");
    adapter.dispatch_request(request)
}

fn response<T: serde::de::DeserializeOwned>(outcome: &super::DispatchOutcome) -> (Response, T) {
    let response: Response =
        serde_json::from_value(outcome.responses[0].clone()).expect("response");
    let body = serde_json::from_value(response.body.clone().expect("body")).expect("typed body");
    (response, body)
}

fn event(value: &Value) -> Event {
    serde_json::from_value(value.clone()).expect("event")
}

fn launch_empty(adapter: &mut DebugAdapter) {
    let outcome = dispatch(
        adapter,
        json!({"seq": 90, "type": "request", "command": "launch", "arguments": {}}),
    );
    assert_eq!(outcome.responses.len(), 1);
}

const TEST_CDB: &str = "M:clock\nL:C$clock.c$18$1$1:116\nL:C$clock.c$21$1$1:11C\n";
const TEST_MAP: &str = "\
_CODE                          00000100    000025FF =        9727. bytes (REL,CON)
   00000100  _main                              clock
   00000116  C$clock.c$18$0_0$36                clock
";

fn load_test_tables(adapter: &mut DebugAdapter) {
    let session = adapter.session_mut();
    session.symbols.debug_info = Some(CdbParser::new().parse_str(TEST_CDB));
    session.symbols.map = Some(MapParser::new().parse_str(TEST_MAP));
    session.rebuild_resolved_breakpoints();
}

#[test]
fn framing_roundtrip() {
    let payload = r#"{"seq":1,"type":"request","command":"initialize"}"#;
    let mut buffer = Vec::new();
    write_message(&mut buffer, payload).expect("write");

    let mut reader = BufReader::new(&buffer[..]);
    let read = read_message(&mut reader).expect("read").expect("payload");
    assert_eq!(read, payload);
}

#[test]
fn framing_eof_and_bad_header_are_no_more_messages() {
    let mut reader = BufReader::new(&b""[..]);
    assert!(read_message(&mut reader).expect("read").is_none());

    let mut reader = BufReader::new(&b"X-Unknown: 3\r\n\r\nabc"[..]);
    assert!(read_message(&mut reader).expect("read").is_none());
}

#[test]
fn initialize_reports_capabilities_and_raises_initialized() {
    let mut adapter = DebugAdapter::new();
    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 1, "command": "initialize", "type": "request", "arguments": {}}),
    );

    let (response, capabilities) = response::<Capabilities>(&outcome);
    assert!(response.success);
    assert_eq!(response.command, "initialize");
    assert_eq!(response.request_seq, 1);
    assert_eq!(capabilities.supports_configuration_done_request, Some(true));

    assert_eq!(outcome.events.len(), 1);
    assert_eq!(event(&outcome.events[0]).event, "initialized");
}

#[test]
fn unknown_command_echoes_name() {
    let mut adapter = DebugAdapter::new();
    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 4, "type": "request", "command": "gotoTargets"}),
    );
    let response: Response =
        serde_json::from_value(outcome.responses[0].clone()).expect("response");
    assert!(!response.success);
    assert_eq!(response.command, "gotoTargets");
    assert_eq!(response.request_seq, 4);
    assert_eq!(
        response.message.as_deref(),
        Some("Unknown command: gotoTargets")
    );
}

#[test]
fn malformed_payload_yields_failure_with_seq_zero() {
    let mut input = Vec::new();
    write_message(&mut input, "{ this is not json").expect("write");
    let mut reader = BufReader::new(&input[..]);
    let mut output = Vec::new();

    let mut adapter = DebugAdapter::new();
    adapter.run(&mut reader, &mut output).expect("run");

    let mut reader = BufReader::new(&output[..]);
    let payload = read_message(&mut reader).expect("read").expect("payload");
    let response: Response = serde_json::from_str(&payload).expect("response");
    assert!(!response.success);
    assert_eq!(response.request_seq, 0);
    assert_eq!(response.message.as_deref(), Some("Malformed request"));
}

#[test]
fn responses_are_written_before_their_events() {
    let mut input = Vec::new();
    for payload in [
        json!({"seq": 1, "type": "request", "command": "initialize", "arguments": {}}),
        json!({"seq": 2, "type": "request", "command": "launch", "arguments": {}}),
        json!({"seq": 3, "type": "request", "command": "configurationDone"}),
    ] {
        write_message(&mut input, &payload.to_string()).expect("write");
    }
    let mut reader = BufReader::new(&input[..]);
    let mut output = Vec::new();

    let mut adapter = DebugAdapter::new();
    adapter.run(&mut reader, &mut output).expect("run");

    let mut reader = BufReader::new(&output[..]);
    let mut kinds = Vec::new();
    while let Some(payload) = read_message(&mut reader).expect("read") {
        let value: Value = serde_json::from_str(&payload).expect("json");
        let kind = value["type"].as_str().expect("type").to_string();
        let label = if kind == "event" {
            format!("event:{}", value["event"].as_str().unwrap_or(""))
        } else {
            format!("response:{}", value["command"].as_str().unwrap_or(""))
        };
        kinds.push(label);
    }
    assert_eq!(
        kinds,
        vec![
            "response:initialize",
            "event:initialized",
            "response:launch",
            "response:configurationDone",
            "event:stopped",
        ]
    );
}

#[test]
fn entry_stop_is_deferred_to_configuration_done_once() {
    let mut adapter = DebugAdapter::new();
    let launch = dispatch(
        &mut adapter,
        json!({"seq": 1, "type": "request", "command": "launch", "arguments": {}}),
    );
    assert!(launch.events.is_empty());

    let first = dispatch(
        &mut adapter,
        json!({"seq": 2, "type": "request", "command": "configurationDone"}),
    );
    assert_eq!(first.events.len(), 1);
    let stopped = event(&first.events[0]);
    assert_eq!(stopped.event, "stopped");
    assert_eq!(stopped.body.expect("body")["reason"], "entry");

    let second = dispatch(
        &mut adapter,
        json!({"seq": 3, "type": "request", "command": "configurationDone"}),
    );
    assert!(second.events.is_empty());
}

#[test]
fn set_breakpoints_without_tables_is_unverified_pending() {
    let mut adapter = DebugAdapter::new();
    let outcome = dispatch(
        &mut adapter,
        json!({
            "seq": 5,
            "type": "request",
            "command": "setBreakpoints",
            "arguments": {
                "source": {"path": "main.c"},
                "breakpoints": [{"line": 10}]
            }
        }),
    );
    let (_, body) = response::<SetBreakpointsResponseBody>(&outcome);
    assert_eq!(body.breakpoints.len(), 1);
    let breakpoint: &Breakpoint = &body.breakpoints[0];
    assert!(!breakpoint.verified);
    assert!(breakpoint
        .message
        .as_deref()
        .expect("message")
        .contains("pending"));
}

#[test]
fn set_breakpoints_with_tables_distinguishes_unmapped_lines() {
    let mut adapter = DebugAdapter::new();
    load_test_tables(&mut adapter);
    let outcome = dispatch(
        &mut adapter,
        json!({
            "seq": 5,
            "type": "request",
            "command": "setBreakpoints",
            "arguments": {
                "source": {"path": "/work/project/clock.c"},
                "breakpoints": [{"line": 18}, {"line": 99}]
            }
        }),
    );
    let (_, body) = response::<SetBreakpointsResponseBody>(&outcome);
    assert!(body.breakpoints[0].verified);
    assert_eq!(
        body.breakpoints[0].instruction_reference.as_deref(),
        Some("0x0116")
    );
    assert!(!body.breakpoints[1].verified);
    assert!(body.breakpoints[1]
        .message
        .as_deref()
        .expect("message")
        .contains("no code"));
}

#[test]
fn rebuild_after_table_load_requires_no_resend() {
    let mut adapter = DebugAdapter::new();
    dispatch(
        &mut adapter,
        json!({
            "seq": 1,
            "type": "request",
            "command": "setBreakpoints",
            "arguments": {"source": {"path": "clock.c"}, "breakpoints": [{"line": 18}]}
        }),
    );
    assert!(!adapter.session().breakpoint_hit(0x116));

    // Loading tables alone changes nothing until the explicit rebuild.
    load_test_tables(&mut adapter);
    assert!(adapter.session().breakpoint_hit(0x116));
}

#[test]
fn replacing_a_files_breakpoints_never_merges() {
    let mut adapter = DebugAdapter::new();
    load_test_tables(&mut adapter);
    for lines in [vec![18u32], vec![21u32]] {
        let breakpoints: Vec<Value> = lines.iter().map(|line| json!({"line": line})).collect();
        dispatch(
            &mut adapter,
            json!({
                "seq": 1,
                "type": "request",
                "command": "setBreakpoints",
                "arguments": {"source": {"path": "clock.c"}, "breakpoints": breakpoints}
            }),
        );
    }
    assert!(!adapter.session().breakpoint_hit(0x116));
    assert!(adapter.session().breakpoint_hit(0x11C));
}

#[test]
fn instruction_breakpoints_replace_wholesale() {
    let mut adapter = DebugAdapter::new();
    let outcome = dispatch(
        &mut adapter,
        json!({
            "seq": 1,
            "type": "request",
            "command": "setInstructionBreakpoints",
            "arguments": {"breakpoints": [
                {"instructionReference": "0x0150"},
                {"instructionReference": "bogus"}
            ]}
        }),
    );
    let (_, body) = response::<SetBreakpointsResponseBody>(&outcome);
    assert!(body.breakpoints[0].verified);
    assert!(!body.breakpoints[1].verified);
    assert!(adapter.session().breakpoint_hit(0x150));

    dispatch(
        &mut adapter,
        json!({
            "seq": 2,
            "type": "request",
            "command": "setInstructionBreakpoints",
            "arguments": {"breakpoints": []}
        }),
    );
    assert!(!adapter.session().breakpoint_hit(0x150));
}

#[test]
fn continue_makes_progress_off_a_current_breakpoint() {
    let mut adapter = DebugAdapter::new();
    launch_empty(&mut adapter);
    // Memory is all NOPs; the PC starts at 0 which is itself a breakpoint.
    dispatch(
        &mut adapter,
        json!({
            "seq": 2,
            "type": "request",
            "command": "setInstructionBreakpoints",
            "arguments": {"breakpoints": [
                {"instructionReference": "0x0000"},
                {"instructionReference": "0x0002"}
            ]}
        }),
    );
    assert_eq!(adapter.session().pc(), 0);

    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 3, "type": "request", "command": "continue", "arguments": {"threadId": 1}}),
    );
    let (_, body) = response::<ContinueResponseBody>(&outcome);
    assert_eq!(body.all_threads_continued, Some(true));
    assert_eq!(adapter.session().pc(), 0x0002);

    assert_eq!(outcome.events.len(), 1);
    let stopped = event(&outcome.events[0]);
    assert_eq!(stopped.event, "stopped");
    assert_eq!(stopped.body.expect("body")["reason"], "breakpoint");
}

#[test]
fn execution_control_requires_launch() {
    let mut adapter = DebugAdapter::new();
    for command in ["continue", "next", "stepIn", "stepOut"] {
        let outcome = dispatch(
            &mut adapter,
            json!({"seq": 1, "type": "request", "command": command, "arguments": {}}),
        );
        let response: Response =
            serde_json::from_value(outcome.responses[0].clone()).expect("response");
        assert!(!response.success, "{command} should require launch");
    }
}

#[test]
fn step_emits_stopped_step_event() {
    let mut adapter = DebugAdapter::new();
    launch_empty(&mut adapter);
    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 2, "type": "request", "command": "stepIn", "arguments": {"threadId": 1}}),
    );
    assert_eq!(adapter.session().pc(), 1);
    let stopped = event(&outcome.events[0]);
    assert_eq!(stopped.body.expect("body")["reason"], "step");
}

#[test]
fn next_steps_over_a_whole_source_line() {
    let mut adapter = DebugAdapter::new();
    launch_empty(&mut adapter);
    // Line 18 covers 0x0116..0x011C; stepping from inside it must run to
    // the next mapped line, not just one opcode.
    load_test_tables(&mut adapter);
    adapter.session_mut().set_pc(0x0116);

    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 2, "type": "request", "command": "next", "arguments": {"threadId": 1}}),
    );
    assert_eq!(adapter.session().pc(), 0x011C);
    assert_eq!(outcome.events.len(), 1);
}

#[test]
fn threads_lists_the_single_thread() {
    let mut adapter = DebugAdapter::new();
    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 1, "type": "request", "command": "threads"}),
    );
    let (_, body) = response::<ThreadsResponseBody>(&outcome);
    assert_eq!(body.threads.len(), 1);
    assert_eq!(body.threads[0].id, 1);
}

#[test]
fn stack_trace_names_the_disassembly_when_unmapped() {
    let mut adapter = DebugAdapter::new();
    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 1, "type": "request", "command": "stackTrace", "arguments": {"threadId": 1}}),
    );
    let (_, body) = response::<StackTraceResponseBody>(&outcome);
    assert_eq!(body.stack_frames.len(), 1);
    let frame = &body.stack_frames[0];
    let source = frame.source.as_ref().expect("source");
    assert_eq!(source.source_reference, Some(DISASSEMBLY_REFERENCE));
    assert_eq!(frame.instruction_pointer_reference.as_deref(), Some("0x0000"));
}

#[test]
fn stack_trace_resolves_source_lines_when_mapped() {
    let mut adapter = DebugAdapter::new();
    load_test_tables(&mut adapter);
    adapter.session_mut().set_pc(0x0116);
    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 1, "type": "request", "command": "stackTrace", "arguments": {"threadId": 1}}),
    );
    let (_, body) = response::<StackTraceResponseBody>(&outcome);
    let frame = &body.stack_frames[0];
    assert_eq!(frame.line, 18);
    let source = frame.source.as_ref().expect("source");
    assert_eq!(source.name.as_deref(), Some("clock.c"));
}

#[test]
fn stack_trace_hands_out_cached_source_references() {
    let dir = std::env::temp_dir().join(format!("zdb-stack-source-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("dir");
    std::fs::write(dir.join("clock.c"), "/* tick */\n").expect("write");

    let mut adapter = DebugAdapter::new();
    load_test_tables(&mut adapter);
    adapter.session_mut().symbols.source_roots.push(dir.clone());
    adapter.session_mut().set_pc(0x0116);

    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 1, "type": "request", "command": "stackTrace", "arguments": {"threadId": 1}}),
    );
    let (_, body) = response::<StackTraceResponseBody>(&outcome);
    let source = body.stack_frames[0].source.as_ref().expect("source");
    let reference = source.source_reference.expect("reference");
    assert!(reference >= 1000);

    // The reference serves the cached content without touching the path.
    let outcome = dispatch(
        &mut adapter,
        json!({
            "seq": 2,
            "type": "request",
            "command": "source",
            "arguments": {"sourceReference": reference}
        }),
    );
    let (_, body) = response::<SourceResponseBody>(&outcome);
    assert!(body.content.contains("tick"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn scopes_grow_browsing_nodes_with_a_map() {
    let mut adapter = DebugAdapter::new();
    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 1, "type": "request", "command": "scopes", "arguments": {"frameId": 0}}),
    );
    let (_, body) = response::<ScopesResponseBody>(&outcome);
    assert_eq!(body.scopes.len(), 1);
    assert_eq!(body.scopes[0].name, "Registers");

    load_test_tables(&mut adapter);
    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 2, "type": "request", "command": "scopes", "arguments": {"frameId": 0}}),
    );
    let (_, body) = response::<ScopesResponseBody>(&outcome);
    let names: Vec<&str> = body.scopes.iter().map(|scope| scope.name.as_str()).collect();
    assert_eq!(names, vec!["Registers", "Segments", "Symbols"]);
}

#[test]
fn variables_render_registers_as_hex() {
    let mut adapter = DebugAdapter::new();
    adapter.session_mut().set_pc(0x1234);
    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 1, "type": "request", "command": "variables", "arguments": {"variablesReference": 100}}),
    );
    let (_, body) = response::<VariablesResponseBody>(&outcome);
    let pc = body
        .variables
        .iter()
        .find(|variable| variable.name == "PC")
        .expect("PC");
    assert_eq!(pc.value, "0x1234");
    assert!(body.variables.iter().any(|variable| variable.name == "F"));
}

#[test]
fn segment_and_symbol_scopes_list_map_entries() {
    let mut adapter = DebugAdapter::new();
    load_test_tables(&mut adapter);
    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 1, "type": "request", "command": "variables", "arguments": {"variablesReference": 200}}),
    );
    let (_, body) = response::<VariablesResponseBody>(&outcome);
    assert_eq!(body.variables[0].name, "_CODE");

    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 2, "type": "request", "command": "variables", "arguments": {"variablesReference": 300}}),
    );
    let (_, body) = response::<VariablesResponseBody>(&outcome);
    // Line markers are encodings, not symbols; only _main remains.
    assert_eq!(body.variables.len(), 1);
    assert_eq!(body.variables[0].name, "_main");
}

#[test]
fn read_memory_returns_hex_data() {
    let mut adapter = DebugAdapter::new();
    for (i, byte) in [0xDEu8, 0xAD, 0xBE, 0xEF].iter().enumerate() {
        adapter.session_mut().memory_mut().write(0x0100 + i as u16, *byte);
    }
    let outcome = dispatch(
        &mut adapter,
        json!({
            "seq": 1,
            "type": "request",
            "command": "readMemory",
            "arguments": {"memoryReference": "0x0100", "count": 4}
        }),
    );
    let (_, body) = response::<ReadMemoryResponseBody>(&outcome);
    assert_eq!(body.address, "0x0100");
    assert_eq!(body.data.as_deref(), Some("deadbeef"));
    assert_eq!(body.unreadable_bytes, Some(0));
}

#[test]
fn read_memory_clamps_at_end_of_address_space() {
    let mut adapter = DebugAdapter::new();
    let outcome = dispatch(
        &mut adapter,
        json!({
            "seq": 1,
            "type": "request",
            "command": "readMemory",
            "arguments": {"memoryReference": "0xFFFE", "count": 16}
        }),
    );
    let (_, body) = response::<ReadMemoryResponseBody>(&outcome);
    assert_eq!(body.data.as_deref().map(str::len), Some(4));
}

#[test]
fn disassemble_returns_structured_instructions() {
    let mut adapter = DebugAdapter::new();
    let memory = adapter.session_mut().memory_mut();
    // LD A,0x10 ; LD B,0x22 ; ADD A,B
    for (i, byte) in [0x3Eu8, 0x10, 0x06, 0x22, 0x80].iter().enumerate() {
        memory.write(i as u16, *byte);
    }
    let outcome = dispatch(
        &mut adapter,
        json!({
            "seq": 1,
            "type": "request",
            "command": "disassemble",
            "arguments": {"memoryReference": "0x0000", "instructionCount": 3}
        }),
    );
    let (_, body) = response::<DisassembleResponseBody>(&outcome);
    assert_eq!(body.instructions.len(), 3);
    assert_eq!(body.instructions[0].instruction, "LD A,0x10");
    assert_eq!(body.instructions[0].instruction_bytes.as_deref(), Some("3E10"));
    assert_eq!(body.instructions[1].address, "0x0002");
    assert_eq!(body.instructions[2].instruction, "ADD A,B");
}

#[test]
fn disassemble_annotates_exact_symbols() {
    let mut adapter = DebugAdapter::new();
    load_test_tables(&mut adapter);
    let outcome = dispatch(
        &mut adapter,
        json!({
            "seq": 1,
            "type": "request",
            "command": "disassemble",
            "arguments": {"memoryReference": "0x0100", "instructionCount": 1}
        }),
    );
    let (_, body) = response::<DisassembleResponseBody>(&outcome);
    assert_eq!(body.instructions[0].symbol.as_deref(), Some("_main"));
}

#[test]
fn source_serves_the_synthetic_listing() {
    let mut adapter = DebugAdapter::new();
    let outcome = dispatch(
        &mut adapter,
        json!({
            "seq": 1,
            "type": "request",
            "command": "source",
            "arguments": {"sourceReference": 1}
        }),
    );
    let (_, body) = response::<SourceResponseBody>(&outcome);
    assert_eq!(body.mime_type.as_deref(), Some("text/x-asm"));
    assert!(body.content.contains("NOP"));
}

#[test]
fn listing_rewrites_operands_to_symbol_names() {
    let mut adapter = DebugAdapter::new();
    load_test_tables(&mut adapter);
    // JP 0x0100 at address 0; 0x0100 is _main.
    let memory = adapter.session_mut().memory_mut();
    for (i, byte) in [0xC3u8, 0x00, 0x01].iter().enumerate() {
        memory.write(i as u16, *byte);
    }
    let listing = adapter.disassembly_listing();
    assert!(listing.contains("JP _main"));
    assert!(listing.contains("_main:"));
}

#[test]
fn source_with_unknown_reference_fails() {
    let mut adapter = DebugAdapter::new();
    let outcome = dispatch(
        &mut adapter,
        json!({
            "seq": 1,
            "type": "request",
            "command": "source",
            "arguments": {"sourceReference": 4242}
        }),
    );
    let response: Response =
        serde_json::from_value(outcome.responses[0].clone()).expect("response");
    assert!(!response.success);
    assert_eq!(response.message.as_deref(), Some("Unknown sourceReference"));
}

#[test]
fn source_reference_zero_reads_from_disk() {
    let path = std::env::temp_dir().join(format!("zdb-source-test-{}.c", std::process::id()));
    std::fs::write(&path, "void main(void) {}\n").expect("write");

    let mut adapter = DebugAdapter::new();
    let outcome = dispatch(
        &mut adapter,
        json!({
            "seq": 1,
            "type": "request",
            "command": "source",
            "arguments": {"source": {"path": path.to_str().expect("utf8 path")}}
        }),
    );
    let (_, body) = response::<SourceResponseBody>(&outcome);
    assert!(body.content.contains("main"));
    assert_eq!(body.mime_type.as_deref(), Some("text/x-c"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn disconnect_clears_launched_and_exits_loop() {
    let mut adapter = DebugAdapter::new();
    launch_empty(&mut adapter);
    assert!(adapter.session().launched());

    let outcome = dispatch(
        &mut adapter,
        json!({"seq": 2, "type": "request", "command": "disconnect"}),
    );
    assert!(outcome.should_exit);
    assert!(!adapter.session().launched());
}

#[test]
fn sessions_are_independent_between_adapters() {
    let mut first = DebugAdapter::new();
    let mut second = DebugAdapter::new();
    launch_empty(&mut first);
    launch_empty(&mut second);

    dispatch(
        &mut first,
        json!({
            "seq": 2,
            "type": "request",
            "command": "setInstructionBreakpoints",
            "arguments": {"breakpoints": [{"instructionReference": "0x0002"}]}
        }),
    );
    first
        .session_mut()
        .memory_mut()
        .write(0x4000, 0x99);

    dispatch(
        &mut second,
        json!({"seq": 2, "type": "request", "command": "continue", "arguments": {"threadId": 1}}),
    );
    // The second session saw neither the breakpoint nor the memory write.
    assert_eq!(second.session().memory().read(0x4000), 0);
    assert_ne!(second.session().pc(), 0x0002);
    assert_eq!(first.session().pc(), 0);
}

#[test]
fn launch_loads_image_and_companion_tables() {
    let dir = std::env::temp_dir().join(format!("zdb-launch-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("dir");
    let program = dir.join("clock.ihx");
    // One 3-byte data record at 0x0100.
    std::fs::write(&program, ":03010000000000FC\n:00000001FF\n").expect("ihx");
    std::fs::write(dir.join("clock.cdb"), TEST_CDB).expect("cdb");
    std::fs::write(dir.join("clock.map"), TEST_MAP).expect("map");

    let mut adapter = DebugAdapter::new();
    let outcome = dispatch(
        &mut adapter,
        json!({
            "seq": 1,
            "type": "request",
            "command": "launch",
            "arguments": {"program": program.to_str().expect("utf8 path")}
        }),
    );
    let launch_response: Response =
        serde_json::from_value(outcome.responses[0].clone()).expect("response");
    assert!(launch_response.success);
    assert_eq!(adapter.session().pc(), 0x0100);
    assert!(adapter.session().symbols.any_loaded());

    let outcome = dispatch(
        &mut adapter,
        json!({
            "seq": 2,
            "type": "request",
            "command": "setBreakpoints",
            "arguments": {"source": {"path": "clock.c"}, "breakpoints": [{"line": 18}]}
        }),
    );
    let (_, body) = response::<SetBreakpointsResponseBody>(&outcome);
    assert!(body.breakpoints[0].verified);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn event_sequence_is_independent_of_response_sequence() {
    let mut adapter = DebugAdapter::new();
    let first = dispatch(
        &mut adapter,
        json!({"seq": 1, "type": "request", "command": "initialize", "arguments": {}}),
    );
    let second = dispatch(
        &mut adapter,
        json!({"seq": 2, "type": "request", "command": "threads"}),
    );

    let initialize: Response =
        serde_json::from_value(first.responses[0].clone()).expect("response");
    let threads: Response = serde_json::from_value(second.responses[0].clone()).expect("response");
    assert_eq!(initialize.seq, 1);
    assert_eq!(threads.seq, 2);
    // The lone event so far carries the first event seq, not the third
    // overall number.
    assert_eq!(event(&first.events[0]).seq, 1);
}
