//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 surface of the Animagen job pipeline:
//! submission, status, artifact retrieval, listing and health.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use jsonrpsee::server::ServerHandle;
pub use server::{RpcServer, RpcServerConfig};
