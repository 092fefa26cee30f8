//! Line-oriented JSON-RPC 2.0 over stdio.
//!
//! `RequestDecoder` turns raw input bytes into requests, `Dispatcher` maps each
//! request to at most one response.

mod decoder;
mod dispatcher;
pub mod tools;
mod types;

pub use decoder::{RequestDecoder, MAX_PENDING_BYTES};
pub use dispatcher::Dispatcher;
pub use types::{
    InitializeResult, RpcErrorObject, RpcRequest, RpcResponse, ServerMetadata, ToolCallResult,
    ToolContent, ToolDescriptor, ToolsListResult, JSONRPC_VERSION,
};
