//! Server configuration

use std::time::Duration;

/// Default deadline for a single bound invocation
pub const DEFAULT_INVOCATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime settings for the dispatch engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Deadline per invocation; `None` lets operations run indefinitely
    pub invocation_timeout: Option<Duration>,
    /// Forward raw failure text of uncategorized errors as error `data`
    pub expose_fault_messages: bool,
    /// Run batch items concurrently rather than one after another
    pub concurrent_batches: bool,
    /// Reject batches with more items than this
    pub max_batch_size: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            invocation_timeout: Some(DEFAULT_INVOCATION_TIMEOUT),
            expose_fault_messages: false,
            concurrent_batches: true,
            max_batch_size: None,
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for [`ServerConfig`]
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn invocation_timeout(mut self, timeout: Duration) -> Self {
        self.config.invocation_timeout = Some(timeout);
        self
    }

    pub fn no_invocation_timeout(mut self) -> Self {
        self.config.invocation_timeout = None;
        self
    }

    pub fn expose_fault_messages(mut self, expose: bool) -> Self {
        self.config.expose_fault_messages = expose;
        self
    }

    pub fn concurrent_batches(mut self, concurrent: bool) -> Self {
        self.config.concurrent_batches = concurrent;
        self
    }

    pub fn max_batch_size(mut self, limit: usize) -> Self {
        self.config.max_batch_size = Some(limit);
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
