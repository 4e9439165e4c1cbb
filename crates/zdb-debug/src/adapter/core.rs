//! Adapter core loop + request dispatch.
//! - DebugAdapter::new/session accessors
//! - run: blocking protocol loop over one connection
//! - dispatch_request: route the decoded command union
//! - response/event builders shared by every handler

use std::io::{self, BufRead, Write};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::protocol::{
    Command, Event, MessageType, Request, ResponseBuilder, StoppedEventBody,
};
use crate::session::{DebugSession, THREAD_ID};

use super::protocol_io::{read_message, write_message};
use super::{DebugAdapter, DispatchOutcome};

impl DebugAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: DebugSession::new(),
            next_seq: 1,
            event_seq: 1,
        }
    }

    #[must_use]
    pub fn session(&self) -> &DebugSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut DebugSession {
        &mut self.session
    }

    /// Runs the blocking request loop until EOF, a framing failure or a
    /// `disconnect`. Per-request failures never leave this loop; only
    /// transport errors do.
    pub fn run<R, W>(&mut self, reader: &mut R, writer: &mut W) -> io::Result<()>
    where
        R: BufRead,
        W: Write,
    {
        loop {
            let Some(payload) = read_message(reader)? else {
                debug!("transport closed");
                break;
            };

            let request = match Request::parse(&payload) {
                Ok(request) => request,
                Err(err) => {
                    warn!(error = %err, "dropping malformed request");
                    let response = self.malformed_response();
                    write_message(writer, &response.to_string())?;
                    continue;
                }
            };

            debug!(seq = request.seq, command = %request.command, "dispatch");
            let outcome = self.dispatch_request(request);
            for response in &outcome.responses {
                write_message(writer, &response.to_string())?;
            }
            for event in &outcome.events {
                write_message(writer, &event.to_string())?;
            }
            if outcome.should_exit {
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn dispatch_request(&mut self, request: Request) -> DispatchOutcome {
        if request.message_type != MessageType::Request {
            return DispatchOutcome::default();
        }

        match Command::decode(&request) {
            Command::Initialize(args) => self.handle_initialize(&request, &args),
            Command::Launch(args) => self.handle_launch(&request, &args),
            Command::ConfigurationDone => self.handle_configuration_done(&request),
            Command::Disconnect(args) => self.handle_disconnect(&request, &args),
            Command::SetBreakpoints(args) => self.handle_set_breakpoints(&request, &args),
            Command::SetInstructionBreakpoints(args) => {
                self.handle_set_instruction_breakpoints(&request, &args)
            }
            Command::SetExceptionBreakpoints => self.handle_set_exception_breakpoints(&request),
            Command::Threads => self.handle_threads(&request),
            Command::StackTrace(args) => self.handle_stack_trace(&request, &args),
            Command::Scopes(args) => self.handle_scopes(&request, &args),
            Command::Variables(args) => self.handle_variables(&request, &args),
            Command::Continue(args) => self.handle_continue(&request, &args),
            Command::Next(args) => self.handle_next(&request, &args),
            Command::StepIn(args) => self.handle_step_in(&request, &args),
            Command::StepOut(args) => self.handle_step_out(&request, &args),
            Command::Source(args) => self.handle_source(&request, &args),
            Command::ReadMemory(args) => self.handle_read_memory(&request, &args),
            Command::Disassemble(args) => self.handle_disassemble(&request, &args),
            Command::Unknown(name) => DispatchOutcome {
                responses: vec![
                    self.error_response(&request, &format!("Unknown command: {name}"))
                ],
                ..DispatchOutcome::default()
            },
        }
    }

    fn next_seq(&mut self) -> u32 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn next_event_seq(&mut self) -> u32 {
        let seq = self.event_seq;
        self.event_seq += 1;
        seq
    }

    pub(super) fn ok_response<T>(&mut self, request: &Request, body: Option<T>) -> Value
    where
        T: Serialize,
    {
        let body = body
            .map(|payload| serde_json::to_value(payload))
            .transpose()
            .unwrap_or(None);
        let mut builder = ResponseBuilder::new(request.seq, request.command.clone()).success(true);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let seq = self.next_seq();
        serde_json::to_value(builder.finish(seq)).unwrap_or(Value::Null)
    }

    pub(super) fn error_response(&mut self, request: &Request, message: &str) -> Value {
        let builder = ResponseBuilder::new(request.seq, request.command.clone())
            .success(false)
            .message(message);
        let seq = self.next_seq();
        serde_json::to_value(builder.finish(seq)).unwrap_or(Value::Null)
    }

    /// Failure response for input that never yielded a request; there is
    /// no recoverable sequence number, so `request_seq` is zero.
    pub(super) fn malformed_response(&mut self) -> Value {
        let builder = ResponseBuilder::new(0, "")
            .success(false)
            .message("Malformed request");
        let seq = self.next_seq();
        serde_json::to_value(builder.finish(seq)).unwrap_or(Value::Null)
    }

    pub(super) fn event<T>(&mut self, name: &str, body: Option<T>) -> Value
    where
        T: Serialize,
    {
        let body = body
            .map(|payload| serde_json::to_value(payload))
            .transpose()
            .unwrap_or(None);
        let event = Event {
            seq: self.next_event_seq(),
            message_type: MessageType::Event,
            event: name.to_string(),
            body,
        };
        serde_json::to_value(event).unwrap_or(Value::Null)
    }

    pub(super) fn stopped_event(&mut self, reason: &str) -> Value {
        self.event(
            "stopped",
            Some(StoppedEventBody {
                reason: reason.to_string(),
                thread_id: Some(THREAD_ID),
                all_threads_stopped: Some(true),
            }),
        )
    }
}

impl Default for DebugAdapter {
    fn default() -> Self {
        Self::new()
    }
}
