// Subprocess render executor
// reason: tokio::process for async process management, nix for process-group signals
use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use animagen_core::application::constants::{
    DEFAULT_KILL_GRACE_PERIOD, DEFAULT_RENDER_TIMEOUT, MAX_CAPTURED_STDERR_BYTES,
};
use animagen_core::domain::layout::DEFAULT_SCENE_NAME;
use animagen_core::domain::JobId;
use animagen_core::port::{ArtifactLocator, RenderError, RenderExecutor};

/// How long output readers may lag behind process exit
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Variables passed through to the renderer by default
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "LANG",
    "LC_ALL",
    "TMPDIR",
    "PYTHONPATH",
    "VIRTUAL_ENV",
];

/// Keep only allowlisted variables
pub fn allowlisted_env<I>(vars: I, allowlist: &[String]) -> HashMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter(|(k, _)| allowlist.iter().any(|a| a == k))
        .collect()
}

/// Renderer invocation settings
///
/// Command line: `<program> <base_args..> <source> <scene_name> <quality_flag>
/// <media_dir_flag> <media_root>`
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub program: String,
    pub base_args: Vec<String>,
    pub scene_name: String,
    pub quality_flag: String,
    pub media_dir_flag: String,
    pub media_root: PathBuf,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
    /// Wait between SIGTERM and SIGKILL once `timeout` elapses. A renderer
    /// that ignores SIGTERM holds its caller for `timeout + kill_grace`.
    pub kill_grace: Duration,
    /// Complete child environment (the parent environment is not inherited)
    pub env: HashMap<String, String>,
}

impl RendererConfig {
    /// `python3 -m manim <source> ManimScene -ql --media_dir <media_root>`
    pub fn manim(media_root: impl Into<PathBuf>) -> Self {
        Self {
            program: "python3".to_string(),
            base_args: vec!["-m".to_string(), "manim".to_string()],
            scene_name: DEFAULT_SCENE_NAME.to_string(),
            quality_flag: "-ql".to_string(),
            media_dir_flag: "--media_dir".to_string(),
            media_root: media_root.into(),
            working_dir: None,
            timeout: DEFAULT_RENDER_TIMEOUT,
            kill_grace: DEFAULT_KILL_GRACE_PERIOD,
            env: HashMap::new(),
        }
    }

    pub fn command_args(&self, source_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.base_args.iter().map(OsString::from).collect();
        args.push(source_path.as_os_str().to_owned());
        args.push(OsString::from(&self.scene_name));
        args.push(OsString::from(&self.quality_flag));
        args.push(OsString::from(&self.media_dir_flag));
        args.push(self.media_root.as_os_str().to_owned());
        args
    }
}

/// Check whether a process exists (signal 0)
pub fn is_process_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        kill(Pid::from_raw(pid as i32), None).is_ok()
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        false
    }
}

#[cfg(unix)]
fn signal_group(pgid: u32, signal: nix::sys::signal::Signal) {
    use nix::errno::Errno;
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pgid as i32), signal) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pgid = pgid, signal = ?signal, error = %e, "Failed to signal process group"),
    }
}

/// Owns the renderer child; the process group never outlives it
struct ChildGuard {
    child: Child,
    pgid: Option<u32>,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        let pgid = child.id();
        Self {
            child,
            pgid,
            reaped: false,
        }
    }

    async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        let status = self.child.wait().await?;
        self.reaped = true;
        Ok(status)
    }

    /// SIGTERM the group, SIGKILL after `grace`, then reap
    async fn terminate(&mut self, grace: Duration) {
        if self.reaped {
            return;
        }

        #[cfg(unix)]
        if let Some(pgid) = self.pgid {
            use nix::sys::signal::Signal;

            info!(pgid = pgid, "Sending SIGTERM to renderer process group");
            signal_group(pgid, Signal::SIGTERM);
            match timeout(grace, self.child.wait()).await {
                Ok(Ok(_)) => self.reaped = true,
                _ => {
                    warn!(pgid = pgid, "Renderer ignored SIGTERM, sending SIGKILL");
                    signal_group(pgid, Signal::SIGKILL);
                }
            }
        }

        if !self.reaped {
            if let Err(e) = self.child.kill().await {
                warn!(error = %e, "Failed to kill renderer");
            }
            self.reaped = true;
        }

        // Stragglers that left the leader behind
        #[cfg(unix)]
        if let Some(pgid) = self.pgid {
            signal_group(pgid, nix::sys::signal::Signal::SIGKILL);
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        #[cfg(unix)]
        if let Some(pgid) = self.pgid {
            signal_group(pgid, nix::sys::signal::Signal::SIGKILL);
        }
        let _ = self.child.start_kill();
    }
}

fn spawn_reader<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    })
}

async fn drain_output(reader: JoinHandle<Vec<u8>>) -> Vec<u8> {
    let abort = reader.abort_handle();
    match timeout(OUTPUT_DRAIN_TIMEOUT, reader).await {
        Ok(Ok(buf)) => buf,
        Ok(Err(_)) => Vec::new(),
        Err(_) => {
            abort.abort();
            Vec::new()
        }
    }
}

/// Last `max` bytes of `bytes`, lossily decoded
fn tail_lossy(bytes: &[u8], max: usize) -> String {
    if bytes.len() <= max {
        return String::from_utf8_lossy(bytes).trim_end().to_string();
    }
    let tail = String::from_utf8_lossy(&bytes[bytes.len() - max..]);
    format!("[truncated] {}", tail.trim_end())
}

/// Render executor spawning the external renderer under a deadline
pub struct SubprocessRenderExecutor {
    config: RendererConfig,
    locator: Arc<dyn ArtifactLocator>,
}

impl SubprocessRenderExecutor {
    pub fn new(config: RendererConfig, locator: Arc<dyn ArtifactLocator>) -> Self {
        Self { config, locator }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    fn spawn(&self, source_path: &Path) -> Result<Child, RenderError> {
        let mut command = Command::new(&self.config.program);
        command
            .args(self.config.command_args(source_path))
            .env_clear()
            .envs(&self.config.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        command.process_group(0);

        command.spawn().map_err(|e| RenderError::ExecutionFailed {
            exit_code: None,
            stderr: format!("failed to spawn '{}': {}", self.config.program, e),
        })
    }

    async fn resolve_artifact(&self, job_id: &JobId) -> Result<PathBuf, RenderError> {
        let searched = self.locator.search_root(job_id).display().to_string();
        match self.locator.locate(job_id).await {
            Ok(Some(path)) => Ok(path),
            Ok(None) => Err(RenderError::ArtifactNotFound { searched }),
            Err(e) => Err(RenderError::ArtifactNotFound {
                searched: format!("{} ({})", searched, e),
            }),
        }
    }
}

#[async_trait]
impl RenderExecutor for SubprocessRenderExecutor {
    async fn execute(&self, source_path: &Path, job_id: &JobId) -> Result<PathBuf, RenderError> {
        let started = Instant::now();
        info!(
            job_id = %job_id,
            program = %self.config.program,
            source = %source_path.display(),
            timeout_secs = self.config.timeout.as_secs(),
            "Starting renderer"
        );

        let mut child = self.spawn(source_path)?;
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());
        let mut guard = ChildGuard::new(child);

        let status = match timeout(self.config.timeout, guard.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                guard.terminate(self.config.kill_grace).await;
                stdout.abort();
                stderr.abort();
                return Err(RenderError::ExecutionFailed {
                    exit_code: None,
                    stderr: format!("failed to wait for renderer: {}", e),
                });
            }
            Err(_) => {
                warn!(
                    job_id = %job_id,
                    timeout_secs = self.config.timeout.as_secs(),
                    "Renderer deadline expired, terminating"
                );
                guard.terminate(self.config.kill_grace).await;
                stdout.abort();
                stderr.abort();
                return Err(RenderError::Timeout {
                    timeout: self.config.timeout,
                });
            }
        };

        let stdout = drain_output(stdout).await;
        let stderr = drain_output(stderr).await;
        debug!(
            job_id = %job_id,
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            "Renderer output captured"
        );

        info!(
            job_id = %job_id,
            exit_code = ?status.code(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Renderer exited"
        );

        if !status.success() {
            return Err(RenderError::ExecutionFailed {
                exit_code: status.code(),
                stderr: tail_lossy(&stderr, MAX_CAPTURED_STDERR_BYTES),
            });
        }

        self.resolve_artifact(job_id).await
    }
}
