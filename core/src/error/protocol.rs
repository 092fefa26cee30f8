use thiserror::Error;

/// JSON-RPC 2.0 error codes used in error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum RpcErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    InvalidParams = -32602,
    InternalError = -32603,
}

impl RpcErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed JSON input: {0}")]
    Parse(String),

    #[error("invalid request envelope: {0}")]
    InvalidRequest(String),
}

impl ProtocolError {
    pub fn error_code(&self) -> RpcErrorCode {
        match self {
            Self::Parse(_) => RpcErrorCode::ParseError,
            Self::InvalidRequest(_) => RpcErrorCode::InvalidRequest,
        }
    }
}
