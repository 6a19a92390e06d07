// Animagen Infrastructure - System Adapters
// Implements: RenderExecutor (renderer subprocess), SystemProbe

pub mod subprocess_executor;
pub mod system_probe_impl;

pub use subprocess_executor::{
    allowlisted_env, RendererConfig, SubprocessRenderExecutor, DEFAULT_ENV_ALLOWLIST,
};
pub use system_probe_impl::SystemProbeImpl;
