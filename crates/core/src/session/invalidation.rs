//! Dependent state invalidators
//!
//! Business stores (auth store, tenant store, ...) register here so the
//! coordinator can reset them without knowing their shape.

use std::sync::Arc;

use async_trait::async_trait;
use dealroom_domain::Result;
use tracing::warn;

use crate::session_ports::DependentStateInvalidator;

/// Invalidator that does nothing; used when no dependent stores are wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInvalidator;

#[async_trait]
impl DependentStateInvalidator for NoopInvalidator {
    async fn notify_permanent_failure(&self) {}

    async fn reload_claims(&self) -> Result<()> {
        Ok(())
    }
}

/// Fans one notification out to several dependent stores.
#[derive(Clone, Default)]
pub struct InvalidatorSet {
    sinks: Vec<Arc<dyn DependentStateInvalidator>>,
}

impl InvalidatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register another store
    pub fn with(mut self, sink: Arc<dyn DependentStateInvalidator>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl DependentStateInvalidator for InvalidatorSet {
    async fn notify_permanent_failure(&self) {
        for sink in &self.sinks {
            sink.notify_permanent_failure().await;
        }
    }

    /// Reloads every store; the first failure is returned after all stores
    /// have been attempted.
    async fn reload_claims(&self) -> Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.reload_claims().await {
                warn!(error = %err, "dependent store failed to reload claims");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
