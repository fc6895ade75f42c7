use std::io::{self, Read, Write};
use std::path::Path;

use crate::engine::errors::WalError;
use crate::shared::storage_header::crc32;

/// Upper bound for a single framed record; anything larger is treated as corruption.
pub const MAX_RECORD_LEN_BYTES: u32 = 256 * 1024 * 1024;

/// Length prefix plus CRC.
pub const RECORD_OVERHEAD: u64 = 8;

#[derive(Debug, PartialEq)]
pub enum FrameRead {
    Record(Vec<u8>),
    EndOfStream,
}

/// Writes `[len: u32][crc32: u32][payload]`.
pub fn write_record<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_RECORD_LEN_BYTES)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("record of {} bytes exceeds limit", payload.len()),
            )
        })?;

    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&crc32(payload).to_le_bytes())?;
    writer.write_all(payload)
}

/// Fills `buf` as far as the stream allows and returns how many bytes were read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Reads one framed record starting at `*offset`, advancing it past the record.
///
/// End of stream is only reported when the stream ends exactly on a record boundary.
/// A truncated prefix or payload, an oversized length, or a CRC mismatch is corruption.
pub fn read_record<R: Read>(
    reader: &mut R,
    offset: &mut u64,
    path: &Path,
) -> Result<FrameRead, WalError> {
    let record_start = *offset;
    let corrupt = |reason: String| WalError::Corrupt {
        offset: record_start,
        reason,
    };

    let mut prefix = [0u8; RECORD_OVERHEAD as usize];
    let got = read_up_to(reader, &mut prefix).map_err(|e| WalError::io(path, e))?;
    if got == 0 {
        return Ok(FrameRead::EndOfStream);
    }
    if got < prefix.len() {
        return Err(corrupt(format!(
            "truncated record prefix ({} of {} bytes)",
            got,
            prefix.len()
        )));
    }

    let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
    let expected_crc = u32::from_le_bytes([prefix[4], prefix[5], prefix[6], prefix[7]]);
    if len > MAX_RECORD_LEN_BYTES {
        return Err(corrupt(format!("record length {} too large", len)));
    }

    let mut payload = vec![0u8; len as usize];
    let got = read_up_to(reader, &mut payload).map_err(|e| WalError::io(path, e))?;
    if got < payload.len() {
        return Err(corrupt(format!(
            "truncated record payload ({} of {} bytes)",
            got, len
        )));
    }

    let actual_crc = crc32(&payload);
    if actual_crc != expected_crc {
        return Err(corrupt(format!(
            "CRC mismatch (expected {}, got {})",
            expected_crc, actual_crc
        )));
    }

    *offset += RECORD_OVERHEAD + len as u64;
    Ok(FrameRead::Record(payload))
}
