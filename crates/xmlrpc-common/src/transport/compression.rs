//! Optional gzip wrapping of message bodies.

use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, BufRead, BufReader, Read, Write};

use crate::protocol::error::{Result, XmlRpcError};

/// Runs `write_body` against a sink, gzip-wrapped when `compress` is set.
///
/// The compressor is finished before the bytes are returned, so the caller
/// only learns the body length once the trailer has been written.
pub fn write_body<F>(compress: bool, write_body: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let mut body = Vec::new();
    write_body_into(compress, &mut body, write_body)?;
    Ok(body)
}

/// Like [`write_body`], appending to an existing buffer.
pub fn write_body_into<F>(compress: bool, body: &mut Vec<u8>, write_body: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    if compress {
        let mut encoder = GzEncoder::new(body, Compression::default());
        write_body(&mut encoder)?;
        encoder.finish()?;
    } else {
        write_body(body)?;
    }
    Ok(())
}

/// Runs `read_body` against `body`, inflating it first when `compressed` is set.
///
/// `compressed` must come from the framing signal actually received, never
/// from the reader's own configuration. With a `limit`, a body that is (or
/// inflates to) more than `limit` bytes fails with
/// [`XmlRpcError::BodyTooLarge`].
pub fn read_body<T, F>(
    body: &[u8],
    compressed: bool,
    limit: Option<usize>,
    read_body: F,
) -> Result<T>
where
    F: FnOnce(&mut dyn BufRead) -> Result<T>,
{
    if compressed {
        let mut reader = BufReader::new(Inflated {
            inner: GzDecoder::new(body),
            remaining: limit.map(|limit| limit as u64),
            exceeded: false,
        });
        let result = read_body(&mut reader);
        match limit {
            Some(limit) if reader.get_ref().exceeded => Err(XmlRpcError::BodyTooLarge(limit)),
            _ => result,
        }
    } else {
        if let Some(limit) = limit.filter(|&limit| body.len() > limit) {
            return Err(XmlRpcError::BodyTooLarge(limit));
        }
        let mut reader = body;
        read_body(&mut reader)
    }
}

/// Counts inflated bytes and stops once the budget is spent.
struct Inflated<R> {
    inner: R,
    remaining: Option<u64>,
    exceeded: bool,
}

impl<R: Read> Read for Inflated<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if let Some(remaining) = self.remaining.as_mut() {
            if n as u64 > *remaining {
                self.exceeded = true;
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "inflated body exceeds the size limit",
                ));
            }
            *remaining -= n as u64;
        }
        Ok(n)
    }
}
