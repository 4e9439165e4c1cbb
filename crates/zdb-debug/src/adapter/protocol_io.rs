//! DAP protocol framing.
//! - read_message: parse one Content-Length delimited payload
//! - write_message: emit one payload with its header
//!
//! The framing is symmetric for requests, responses and events; no
//! message-type distinction exists at this layer.

use std::io::{self, BufRead, Write};

const CONTENT_LENGTH: &str = "Content-Length";

/// Reads one message payload. `Ok(None)` covers both EOF and an
/// unparseable header block: either way there are no more messages and the
/// connection loop winds down cleanly.
pub(crate) fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut content_length = None;
    let mut line = String::new();

    loop {
        line.clear();
        let bytes = reader.read_line(&mut line)?;
        if bytes == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some((name, value)) = trimmed.split_once(':') {
            if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
                if let Ok(length) = value.trim().parse::<usize>() {
                    content_length = Some(length);
                }
            }
        }
    }

    let Some(length) = content_length else {
        return Ok(None);
    };

    let mut buffer = vec![0u8; length];
    reader.read_exact(&mut buffer)?;
    match String::from_utf8(buffer) {
        Ok(payload) => Ok(Some(payload)),
        Err(_) => Ok(None),
    }
}

/// Writes one message payload with its Content-Length header and flushes.
pub(crate) fn write_message<W: Write>(writer: &mut W, payload: &str) -> io::Result<()> {
    let length = payload.len();
    write!(writer, "{CONTENT_LENGTH}: {length}\r\n\r\n")?;
    writer.write_all(payload.as_bytes())?;
    writer.flush()
}
