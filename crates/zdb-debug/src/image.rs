//! Program image loading.
//!
//! Two image formats reach the adapter: flat binaries (copied to address
//! zero) and Intel HEX `.ihx`/`.hex` record streams as emitted by the SDCC
//! linker. The entry point comes from an explicit start-address record
//! when the stream carries one; otherwise the lowest loaded address is the
//! best available guess.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use zdb_z80::{Bus, FlatMemory, MEMORY_SIZE};

/// Image loading failures. All of them degrade the session rather than
/// terminate it; the launch handler logs and continues.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read program image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid intel hex record at line {line}")]
    InvalidRecord { line: usize },
}

/// A successfully loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedImage {
    /// Initial program counter.
    pub entry: u16,
    /// Number of bytes copied into memory.
    pub loaded: usize,
}

/// Loads `path` into `memory`, picking the format by extension:
/// `.ihx`/`.hex` parse as Intel HEX, anything else copies as a flat
/// binary at address zero.
pub fn load_program(path: &Path, memory: &mut FlatMemory) -> Result<LoadedImage, ImageError> {
    let is_hex = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ihx") || ext.eq_ignore_ascii_case("hex"));
    if is_hex {
        let text = fs::read_to_string(path).map_err(|source| ImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        load_ihx(&text, memory)
    } else {
        let bytes = fs::read(path).map_err(|source| ImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(load_binary(&bytes, memory))
    }
}

/// Copies a flat binary to address zero, truncating at the end of the
/// address space.
pub fn load_binary(bytes: &[u8], memory: &mut FlatMemory) -> LoadedImage {
    let count = bytes.len().min(MEMORY_SIZE);
    memory.as_mut_slice()[..count].copy_from_slice(&bytes[..count]);
    LoadedImage {
        entry: 0,
        loaded: count,
    }
}

/// Parses an Intel HEX record stream into `memory`.
///
/// Supported record types: 00 data, 01 end-of-file, 02 extended segment
/// address, 03 start segment address, 04 extended linear address, 05 start
/// linear address. Extended-address records shift the base applied to
/// subsequent data records; start-address records fix the entry point and
/// win over the lowest-data-address heuristic.
pub fn load_ihx(text: &str, memory: &mut FlatMemory) -> Result<LoadedImage, ImageError> {
    let mut base: u32 = 0;
    let mut loaded = 0usize;
    let mut lowest: Option<u32> = None;
    let mut start: Option<u32> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let record = line
            .strip_prefix(':')
            .ok_or(ImageError::InvalidRecord { line: line_number })?;
        let bytes = decode_hex(record).ok_or(ImageError::InvalidRecord { line: line_number })?;
        if bytes.len() < 5 {
            return Err(ImageError::InvalidRecord { line: line_number });
        }
        let length = usize::from(bytes[0]);
        if bytes.len() != length + 5 {
            return Err(ImageError::InvalidRecord { line: line_number });
        }
        let checksum: u8 = bytes.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte));
        if checksum != 0 {
            warn!(line = line_number, "intel hex checksum mismatch, record skipped");
            continue;
        }
        let offset = (u32::from(bytes[1]) << 8) | u32::from(bytes[2]);
        let data = &bytes[4..4 + length];
        match bytes[3] {
            0x00 => {
                for (i, byte) in data.iter().enumerate() {
                    let address = base + offset + i as u32;
                    if address < MEMORY_SIZE as u32 {
                        memory.write(address as u16, *byte);
                        loaded += 1;
                    }
                }
                if length > 0 {
                    let first = base + offset;
                    lowest = Some(lowest.map_or(first, |low: u32| low.min(first)));
                }
            }
            0x01 => break,
            0x02 => {
                if length == 2 {
                    base = ((u32::from(data[0]) << 8) | u32::from(data[1])) << 4;
                }
            }
            0x03 => {
                if length == 4 {
                    let segment = (u32::from(data[0]) << 8) | u32::from(data[1]);
                    let pointer = (u32::from(data[2]) << 8) | u32::from(data[3]);
                    start = Some(segment * 16 + pointer);
                }
            }
            0x04 => {
                if length == 2 {
                    base = ((u32::from(data[0]) << 8) | u32::from(data[1])) << 16;
                }
            }
            0x05 => {
                if length == 4 {
                    start = Some(
                        (u32::from(data[0]) << 24)
                            | (u32::from(data[1]) << 16)
                            | (u32::from(data[2]) << 8)
                            | u32::from(data[3]),
                    );
                }
            }
            other => {
                warn!(record_type = other, line = line_number, "unknown intel hex record type");
            }
        }
    }

    let entry = start.or(lowest).unwrap_or(0);
    Ok(LoadedImage {
        entry: (entry & 0xFFFF) as u16,
        loaded,
    })
}

/// Companion file next to the image: `firmware.ihx` -> `firmware.cdb`.
#[must_use]
pub fn companion_path(program: &Path, extension: &str) -> PathBuf {
    program.with_extension(extension)
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(text.get(i..i + 2)?, 16).ok())
        .collect()
}
