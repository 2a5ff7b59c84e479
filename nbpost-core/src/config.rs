use tracing::{debug, info};

use crate::contract::LifecycleState;

/// Run configuration passed explicitly to every pipeline step.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Dump remote payloads as JSON at debug level.
    pub debug: bool,
    /// Order in which lifecycle states are searched for an existing post.
    pub scan_order: Vec<LifecycleState>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            debug: false,
            scan_order: LifecycleState::PUBLISH_SCAN_ORDER.to_vec(),
        }
    }
}

impl PublishConfig {
    pub fn with_debug(debug: bool) -> Self {
        Self {
            debug,
            ..Self::default()
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            debug = self.debug,
            states = self.scan_order.len(),
            "Loaded PublishConfig"
        );
        debug!(?self, "PublishConfig loaded (full debug)");
    }
}
