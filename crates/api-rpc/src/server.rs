//! JSON-RPC Server
//!
//! JSON-RPC 2.0 over HTTP on a local TCP port. When the configured port is
//! taken the next ones are tried.

use crate::handler::RpcHandler;
use crate::types::{ArtifactRequest, StatusRequest, SubmitRequest};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::{ErrorObjectOwned, Params};
use jsonrpsee::RpcModule;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9527;
pub const DEFAULT_PORT_ATTEMPTS: u16 = 10;

// A full 8 MiB chunk is ~11 MiB once base64 encoded
const MAX_RESPONSE_BODY_BYTES: u32 = 16 * 1024 * 1024;

/// RPC Server Configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
    /// Consecutive ports tried starting at `port` (port 0 is tried once)
    pub port_attempts: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
            port_attempts: DEFAULT_PORT_ATTEMPTS,
        }
    }
}

impl RpcServerConfig {
    fn candidate_ports(&self) -> Vec<u16> {
        if self.port == 0 {
            return vec![0];
        }
        (0..self.port_attempts.max(1))
            .filter_map(|offset| self.port.checked_add(offset))
            .collect()
    }
}

/// Accept both named params (`{..}`) and a single positional object (`[{..}]`)
fn parse_params<T: DeserializeOwned>(params: Params<'_>) -> Result<T, ErrorObjectOwned> {
    if params.is_object() {
        return params.parse();
    }
    params.sequence().next()
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    fn module(&self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method("animation.submit.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: SubmitRequest = parse_params(params)?;
                    handler.submit(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("animation.status.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: StatusRequest = parse_params(params)?;
                    handler.status(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("animation.artifact.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ArtifactRequest = parse_params(params)?;
                    handler.artifact(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("animation.list.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.list().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("system.health.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.health().await }
            })
            .map_err(|e| e.to_string())?;

        Ok(module)
    }

    /// Start the JSON-RPC server, returning its handle and the bound address
    pub async fn start(self) -> Result<(ServerHandle, SocketAddr), String> {
        let module = self.module()?;

        let mut last_error = None;
        for port in self.config.candidate_ports() {
            let addr = format!("{}:{}", self.config.host, port);
            let server = match Server::builder()
                .max_response_body_size(MAX_RESPONSE_BODY_BYTES)
                .build(&addr)
                .await
            {
                Ok(server) => server,
                Err(e) => {
                    warn!(addr = %addr, error = %e, "Port unavailable, trying next");
                    last_error = Some(format!("Failed to build server on {}: {}", addr, e));
                    continue;
                }
            };

            let local_addr = server.local_addr().map_err(|e| e.to_string())?;
            if port != self.config.port {
                info!(
                    configured = self.config.port,
                    actual = local_addr.port(),
                    "Configured port busy, using fallback"
                );
            }
            info!(addr = %local_addr, "JSON-RPC server started");
            return Ok((server.start(module), local_addr));
        }

        Err(last_error.unwrap_or_else(|| "no candidate ports".to_string()))
    }
}
