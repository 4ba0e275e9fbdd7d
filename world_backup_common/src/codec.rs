/**
 * Backup Line Codec
 *
 * One `ObjectRecord` per line of JSON text. The encoded form is the only
 * thing a restore has to go on, so decoding rebuilds the full record from
 * the line alone.
 */
use thiserror::Error;

use crate::record::ObjectRecord;

/// Failure to turn a backup line back into a record
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode a record as a single JSON line, newline included
pub fn encode(record: &ObjectRecord) -> String {
    // Serializing a struct of integers and strings cannot fail
    let mut line = serde_json::to_string(record).unwrap_or_default();
    line.push('\n');
    line
}

/// Decode one line of text produced by [`encode`]
pub fn decode(line: &str) -> Result<ObjectRecord, CodecError> {
    decode_bytes(line.as_bytes())
}

/// Decode one raw line; invalid UTF-8 is reported as malformed
pub fn decode_bytes(line: &[u8]) -> Result<ObjectRecord, CodecError> {
    let line = trim_line_end(line);
    Ok(serde_json::from_slice(line)?)
}

fn trim_line_end(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\n' | b'\r'] = line {
        line = rest;
    }
    line
}
