//! gzip compression with base64 text encoding.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use minijinja::value::Value;

use super::failure;

/// Compresses a string or bytes, returning base64 text.
pub fn gzip(input: Value) -> Result<String, minijinja::Error> {
    let bytes = input
        .as_bytes()
        .ok_or_else(|| failure("cannot gzip", format!("expected string or bytes, got {}", input.kind())))?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(|e| failure("cannot gzip", e))?;
    let compressed = encoder.finish().map_err(|e| failure("cannot gzip", e))?;
    Ok(STANDARD.encode(compressed))
}

/// Inverts [`gzip`].
pub fn ungzip(input: &str) -> Result<String, minijinja::Error> {
    let compressed = STANDARD.decode(input.trim()).map_err(|e| failure("cannot decode base64", e))?;
    let mut decoded = String::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_string(&mut decoded)
        .map_err(|e| failure("cannot ungzip", e))?;
    Ok(decoded)
}
