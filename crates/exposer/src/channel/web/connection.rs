//! Reading one HTTP request from an accepted connection.

use std::io::{self, Read};

use crate::http::{content_length, header_end};

/// Largest request the web channel accepts, head and body included.
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024;

#[derive(Debug)]
pub(super) enum ReadFailure {
    TimedOut,
    TooLarge,
    Io(io::Error),
}

/// Reads until the head and the announced body are complete, or the peer
/// closes its side.
///
/// A peer that closes without sending anything leaves `buffer` empty.
pub(super) fn read_request(
    stream: &mut impl Read,
    buffer: &mut Vec<u8>,
) -> Result<(), ReadFailure> {
    let mut chunk = [0_u8; 4096];
    loop {
        let bytes_read = read_chunk_with_retry(stream, &mut chunk)?;
        if bytes_read == 0 {
            return Ok(());
        }
        buffer.extend_from_slice(chunk.get(..bytes_read).unwrap_or_default());
        enforce_request_limit(buffer.len())?;
        if request_complete(buffer) {
            return Ok(());
        }
    }
}

fn read_chunk_with_retry(stream: &mut impl Read, chunk: &mut [u8]) -> Result<usize, ReadFailure> {
    loop {
        match stream.read(chunk) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                return Err(ReadFailure::TimedOut);
            }
            Err(error) => return Err(ReadFailure::Io(error)),
        }
    }
}

fn request_complete(buffer: &[u8]) -> bool {
    header_end(buffer).is_some_and(|end| {
        let head = buffer.get(..end).unwrap_or_default();
        buffer.len() >= end.saturating_add(content_length(head))
    })
}

const fn enforce_request_limit(size: usize) -> Result<(), ReadFailure> {
    if size > MAX_REQUEST_BYTES {
        return Err(ReadFailure::TooLarge);
    }
    Ok(())
}
