/*!
 * Kernel Configuration
 *
 * Runtime configuration for the process registry and tracing output
 */

use super::errors::KernelError;
use super::limits::{DEFAULT_MAX_PROCESSES, PID_MAX, PID_MIN};
use super::types::KernelResult;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the pid table capacity
pub const ENV_MAX_PROCESSES: &str = "KERNEL_MAX_PROCESSES";

/// Environment variable overriding the first allocatable pid
pub const ENV_PID_MIN: &str = "KERNEL_PID_MIN";

/// Environment variable selecting JSON trace output
pub const ENV_TRACE_JSON: &str = "KERNEL_TRACE_JSON";

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KernelConfig {
    /// Maximum number of concurrently allocated pids (boot process excluded)
    pub max_processes: usize,
    /// First pid handed out by the registry
    pub pid_min: u32,
    /// Emit JSON trace records instead of compact text
    pub trace_json: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_processes: DEFAULT_MAX_PROCESSES,
            pid_min: PID_MIN,
            trace_json: false,
        }
    }
}

impl KernelConfig {
    /// Small table for tests and embedded use
    pub const fn minimal() -> Self {
        Self {
            max_processes: 8,
            pid_min: PID_MIN,
            trace_json: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_max_processes(mut self, max_processes: usize) -> Self {
        self.max_processes = max_processes;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_pid_min(mut self, pid_min: u32) -> Self {
        self.pid_min = pid_min;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_trace_json(mut self, enabled: bool) -> Self {
        self.trace_json = enabled;
        self
    }

    /// Build configuration from `KERNEL_*` environment variables
    ///
    /// Unset variables keep their defaults; malformed ones are an error.
    pub fn from_env() -> KernelResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> KernelResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAX_PROCESSES) {
            config.max_processes = raw.trim().parse().map_err(|_| {
                KernelError::configuration(format!("{}={:?} is not a count", ENV_MAX_PROCESSES, raw))
            })?;
        }

        if let Some(raw) = lookup(ENV_PID_MIN) {
            config.pid_min = raw.trim().parse().map_err(|_| {
                KernelError::configuration(format!("{}={:?} is not a pid", ENV_PID_MIN, raw))
            })?;
        }

        if let Some(raw) = lookup(ENV_TRACE_JSON) {
            config.trace_json = matches!(raw.trim(), "1" | "true");
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the pid range fits below `PID_MAX`
    pub fn validate(&self) -> KernelResult<()> {
        if self.max_processes == 0 {
            return Err(KernelError::configuration("max_processes must be at least 1"));
        }
        if self.pid_min < PID_MIN {
            return Err(KernelError::configuration(format!(
                "pid_min {} collides with reserved pids (minimum {})",
                self.pid_min, PID_MIN
            )));
        }
        let last = u64::from(self.pid_min) + self.max_processes as u64 - 1;
        if last > u64::from(PID_MAX) {
            return Err(KernelError::configuration(format!(
                "pid range {}..={} exceeds PID_MAX {}",
                self.pid_min, last, PID_MAX
            )));
        }
        Ok(())
    }

    /// Last pid in the configured range
    #[inline]
    pub fn pid_max(&self) -> u32 {
        self.pid_min + (self.max_processes as u32).saturating_sub(1)
    }
}
