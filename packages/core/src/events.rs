// ABOUTME: Explicit cache invalidation notifications
// ABOUTME: Storages publish the resources they mutated; subscribers refetch

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the invalidation channel; slow subscribers lag rather than block
const INVALIDATION_CHANNEL_CAPACITY: usize = 256;

/// A cached collection clients may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Types,
    Entries,
    Runs,
    Reports,
    Research,
}

/// One invalidation notice, covering every resource a single mutation touched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invalidation {
    pub resources: Vec<Resource>,
}

#[derive(Clone)]
pub struct InvalidationBus {
    sender: broadcast::Sender<Invalidation>,
}

impl Default for InvalidationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InvalidationBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Announce that `resources` changed. Having no subscribers is fine.
    pub fn invalidate(&self, resources: &[Resource]) {
        let receivers = self
            .sender
            .send(Invalidation {
                resources: resources.to_vec(),
            })
            .unwrap_or(0);
        trace!(?resources, receivers, "Published invalidation");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.sender.subscribe()
    }
}
