//! Minimal JSON-RPC client for cryptocurrency daemons.
//!
//! Each call sends one `{"jsonrpc":"2.0","method":..,"params":[..],"id":1}`
//! envelope over HTTP POST with Basic credentials and returns the `result`
//! value. A daemon-reported error comes back as [`Error::Rpc`]; anything else
//! that goes wrong is one of the fatal [`Error`] variants.

pub mod blocking;
pub mod client;
pub mod error;
pub mod rpc;

pub use client::{call, Credentials, RpcClient};
pub use error::{DecodeError, Error, Result};
pub use rpc::{RpcError, RpcRequest, RpcResponse, JSONRPC_VERSION, REQUEST_ID};
