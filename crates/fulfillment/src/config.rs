//! Orchestrator timing configuration.

use std::time::Duration;

/// Timing limits for one order creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound for a single remote call.
    pub call_timeout: Duration,
    /// Upper bound for the whole invocation, measured from its start.
    pub deadline: Duration,
}

impl OrchestratorConfig {
    pub fn new(call_timeout: Duration, deadline: Duration) -> Self {
        Self {
            call_timeout,
            deadline,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            deadline: Duration::from_secs(30),
        }
    }
}
