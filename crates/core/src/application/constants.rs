// Pipeline constants (no magic values)
use std::time::Duration;

/// Renderer wall-clock deadline (120s)
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(120);

/// Time between SIGTERM and SIGKILL when a render overruns its deadline
pub const DEFAULT_KILL_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Concurrent renderer processes admitted by the render gate
pub const DEFAULT_MAX_CONCURRENT_RENDERS: usize = 2;

/// Captured renderer stderr is truncated to its last N bytes
pub const MAX_CAPTURED_STDERR_BYTES: usize = 4000;

/// Default artifact chunk served per retrieval call (1 MiB)
pub const DEFAULT_ARTIFACT_CHUNK_BYTES: u64 = 1024 * 1024;

/// Upper bound for a single artifact chunk (8 MiB)
pub const MAX_ARTIFACT_CHUNK_BYTES: u64 = 8 * 1024 * 1024;

/// Route prefix under which artifacts are addressed
pub const ARTIFACT_URL_PREFIX: &str = "/video";
