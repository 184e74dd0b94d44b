use super::key::{available_processors_2n, round_down_pow2};

/// Default executor name prefix
pub const DEFAULT_NAME_PREFIX: &str = "RequestMessage";

/// Default coroutine stack size (64 KiB)
pub const DEFAULT_STACK_SIZE: usize = 0x10000;

/// How each executor is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutorMode {
    /// One named OS thread per executor
    #[default]
    Thread,
    /// One named `may` coroutine per executor
    Coroutine,
}

impl ExecutorMode {
    /// Parse an executor mode, case-insensitive.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "thread" => Some(Self::Thread),
            "coroutine" => Some(Self::Coroutine),
            _ => None,
        }
    }
}

/// Configuration for the affinity executors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffinityConfig {
    /// Requested executor count, rounded down to a power of two; 0 sizes the
    /// pool from hardware parallelism
    pub executor_count: usize,
    /// Executor names are `"{name_prefix}-{N}-{i}"`
    pub name_prefix: String,
    /// Leave executors running on drop instead of joining them
    pub detached: bool,
    /// Stack size for coroutine executors; thread executors only use it when
    /// it exceeds the platform default
    pub stack_size: usize,
    /// Thread or coroutine executors
    pub mode: ExecutorMode,
}

impl AffinityConfig {
    /// Create a custom configuration
    pub fn new(
        executor_count: usize,
        name_prefix: impl Into<String>,
        detached: bool,
        stack_size: usize,
        mode: ExecutorMode,
    ) -> Self {
        Self {
            executor_count,
            name_prefix: name_prefix.into(),
            detached,
            stack_size,
            mode,
        }
    }

    /// Load configuration from environment variables
    ///
    /// - `CMDR_EXECUTORS`: executor count (default: auto)
    /// - `CMDR_EXECUTOR_PREFIX`: name prefix (default: `RequestMessage`)
    /// - `CMDR_EXECUTOR_DETACHED`: `true`/`false` (default: `true`)
    /// - `CMDR_STACK_SIZE`: decimal or `0x` hex (default: 64 KiB)
    /// - `CMDR_EXECUTOR_MODE`: `thread` or `coroutine` (default: `thread`)
    pub fn from_env() -> Self {
        let executor_count = std::env::var("CMDR_EXECUTORS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0);

        let name_prefix = std::env::var("CMDR_EXECUTOR_PREFIX")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NAME_PREFIX.to_string());

        let detached = std::env::var("CMDR_EXECUTOR_DETACHED")
            .ok()
            .and_then(|s| parse_bool(&s))
            .unwrap_or(true);

        let stack_size = std::env::var("CMDR_STACK_SIZE")
            .ok()
            .and_then(|s| {
                if let Some(hex) = s.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).ok()
                } else {
                    s.parse().ok()
                }
            })
            .unwrap_or(DEFAULT_STACK_SIZE);

        let mode = std::env::var("CMDR_EXECUTOR_MODE")
            .ok()
            .and_then(|s| ExecutorMode::from_str(&s))
            .unwrap_or_default();

        Self {
            executor_count,
            name_prefix,
            detached,
            stack_size,
            mode,
        }
    }

    /// Executor count after applying auto sizing and power-of-two rounding.
    #[must_use]
    pub fn resolved_executor_count(&self) -> usize {
        if self.executor_count == 0 {
            available_processors_2n()
        } else {
            round_down_pow2(self.executor_count)
        }
    }

    /// Name of executor `index` (0-based) in a pool of `count`.
    #[must_use]
    pub fn executor_name(&self, count: usize, index: usize) -> String {
        format!("{}-{}-{}", self.name_prefix, count, index + 1)
    }
}

impl Default for AffinityConfig {
    fn default() -> Self {
        Self {
            executor_count: 0,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            detached: true,
            stack_size: DEFAULT_STACK_SIZE,
            mode: ExecutorMode::Thread,
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
