//! Content-encoding decoding for log output.
//!
//! Decoding only ever feeds the logs. The bytes sent to the client are never
//! touched by this module.

use std::io::Read;

use flate2::read::{DeflateDecoder, GzDecoder};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to decode {encoding} body: {source}")]
pub struct DecodeError {
    pub encoding: &'static str,
    #[source]
    pub source: std::io::Error,
}

/// Decode `raw` according to a `Content-Encoding` token.
///
/// Tokens are matched case-sensitively. Unknown or absent tokens return the
/// input unchanged.
pub fn decode(encoding: Option<&str>, raw: &[u8]) -> Result<Vec<u8>, DecodeError> {
    match encoding {
        Some("gzip") => read_all("gzip", GzDecoder::new(raw)),
        Some("deflate") => read_all("deflate", DeflateDecoder::new(raw)),
        Some("br") => read_all("br", brotli::Decompressor::new(raw, 4096)),
        _ => Ok(raw.to_vec()),
    }
}

fn read_all(encoding: &'static str, mut reader: impl Read) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    reader
        .read_to_end(&mut out)
        .map_err(|source| DecodeError { encoding, source })?;
    Ok(out)
}
