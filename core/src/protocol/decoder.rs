use serde_json::Value;

use super::types::RpcRequest;
use crate::error::ProtocolError;

/// Largest incomplete value held back. Past this the buffer is dropped.
pub const MAX_PENDING_BYTES: usize = 1024 * 1024;

/// Accumulates raw input and yields each complete JSON value as a request.
///
/// Values need no line framing; an incomplete value stays buffered until more
/// bytes arrive. On a syntax error the input up to the next newline is dropped.
#[derive(Debug, Default)]
pub struct RequestDecoder {
    buf: Vec<u8>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes held back waiting for the rest of a value.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<RpcRequest, ProtocolError>> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();

        loop {
            let step = {
                let mut stream =
                    serde_json::Deserializer::from_slice(&self.buf).into_iter::<Value>();
                match stream.next() {
                    None => Step::Drained,
                    Some(Ok(value)) => Step::Value(value, stream.byte_offset()),
                    Some(Err(e)) if e.is_eof() => Step::Incomplete,
                    Some(Err(e)) => Step::Invalid(e.to_string()),
                }
            };

            match step {
                Step::Drained => {
                    // Only whitespace left.
                    self.buf.clear();
                    break;
                }
                Step::Incomplete => {
                    if self.buf.len() > MAX_PENDING_BYTES {
                        out.push(Err(ProtocolError::Parse(format!(
                            "incomplete request exceeds {MAX_PENDING_BYTES} bytes"
                        ))));
                        self.buf.clear();
                    }
                    break;
                }
                Step::Value(value, consumed) => {
                    self.buf.drain(..consumed);
                    out.push(into_request(value));
                }
                Step::Invalid(message) => {
                    out.push(Err(ProtocolError::Parse(message)));
                    let start = self
                        .buf
                        .iter()
                        .position(|b| !b.is_ascii_whitespace())
                        .unwrap_or(0);
                    match self.buf[start..].iter().position(|b| *b == b'\n') {
                        Some(pos) => {
                            self.buf.drain(..=start + pos);
                        }
                        None => self.buf.clear(),
                    }
                }
            }
        }

        out
    }
}

enum Step {
    Drained,
    Incomplete,
    Value(Value, usize),
    Invalid(String),
}

fn into_request(value: Value) -> Result<RpcRequest, ProtocolError> {
    if !value.is_object() {
        return Err(ProtocolError::InvalidRequest(
            "request must be a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| ProtocolError::InvalidRequest(e.to_string()))
}
