//! Daemon configuration
//!
//! Built once at startup from `ANIMAGEN_*` environment variables and handed
//! to constructors. Nothing below the daemon reads the environment.

use animagen_api_rpc::RpcServerConfig;
use animagen_core::application::{CodegenMode, PipelineConfig};
use animagen_core::domain::StorageLayout;
use animagen_infra_llm::GeminiConfig;
use animagen_infra_system::{allowlisted_env, RendererConfig, DEFAULT_ENV_ALLOWLIST};
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const ENV_PREFIX: &str = "ANIMAGEN_";
const DEFAULT_SCRATCH_ROOT: &str = "~/.animagen/temp";
const DEFAULT_MEDIA_ROOT: &str = "~/.animagen/media";

/// Console log format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Daily-rolling log file directory; console only when unset
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub layout: StorageLayout,
    pub renderer: RendererConfig,
    pub pipeline: PipelineConfig,
    pub codegen_mode: CodegenMode,
    /// None when no API key is configured
    pub gemini: Option<GeminiConfig>,
    pub rpc: RpcServerConfig,
    pub log: LogConfig,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |name: &str| {
            vars.get(&format!("{}{}", ENV_PREFIX, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let scratch_root = expand_path(get("SCRATCH_ROOT").as_deref().unwrap_or(DEFAULT_SCRATCH_ROOT));
        let media_root = expand_path(get("MEDIA_ROOT").as_deref().unwrap_or(DEFAULT_MEDIA_ROOT));
        let layout = StorageLayout::new(scratch_root, media_root.clone());

        let mut renderer = RendererConfig::manim(media_root);
        renderer.scene_name = layout.scene_name.clone();
        if let Some(program) = get("RENDERER_PROGRAM") {
            renderer.program = program;
        }
        if let Some(args) = get("RENDERER_ARGS") {
            renderer.base_args = args.split_whitespace().map(str::to_string).collect();
        }
        if let Some(secs) = parse_var::<u64>(&get, "RENDER_TIMEOUT_SECS")? {
            if secs == 0 {
                bail!("{}RENDER_TIMEOUT_SECS must be positive", ENV_PREFIX);
            }
            renderer.timeout = Duration::from_secs(secs);
        }
        let allowlist: Vec<String> = DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect();
        renderer.env = allowlisted_env(vars.clone(), &allowlist);

        let mut pipeline = PipelineConfig::default();
        if let Some(n) = parse_var::<usize>(&get, "MAX_CONCURRENT_RENDERS")? {
            if n == 0 {
                bail!("{}MAX_CONCURRENT_RENDERS must be positive", ENV_PREFIX);
            }
            pipeline.max_concurrent_renders = n;
        }

        let codegen_mode = match get("CODEGEN_MODE") {
            Some(raw) => CodegenMode::from_str(&raw)
                .with_context(|| format!("invalid {}CODEGEN_MODE", ENV_PREFIX))?,
            None => CodegenMode::default(),
        };

        let api_key = get("GEMINI_API_KEY").or_else(|| {
            vars.get("GEMINI_API_KEY")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        });
        let gemini = api_key.map(|key| {
            let mut config = GeminiConfig::new(key);
            if let Some(model) = get("GEMINI_MODEL") {
                config.model = model;
            }
            if let Some(endpoint) = get("GEMINI_ENDPOINT") {
                config.endpoint = endpoint.trim_end_matches('/').to_string();
            }
            config
        });
        if codegen_mode == CodegenMode::RemoteOnly && gemini.is_none() {
            bail!(
                "{}CODEGEN_MODE=remote_only requires {}GEMINI_API_KEY",
                ENV_PREFIX,
                ENV_PREFIX
            );
        }

        let mut rpc = RpcServerConfig::default();
        if let Some(host) = get("RPC_HOST") {
            rpc.host = host;
        }
        if let Some(port) = parse_var::<u16>(&get, "RPC_PORT")? {
            rpc.port = port;
        }

        let format = match get("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("unknown {}LOG_FORMAT '{}'", ENV_PREFIX, other),
        };
        let log = LogConfig {
            format,
            dir: get("LOG_DIR").map(|d| expand_path(&d)),
        };

        Ok(Self {
            layout,
            renderer,
            pipeline,
            codegen_mode,
            gemini,
            rpc,
            log,
        })
    }
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    get(name)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("invalid {}{}: '{}'", ENV_PREFIX, name, raw))
        })
        .transpose()
}
