//! Explicit subscriber registry for pipeline changes.

use crate::model::Pipeline;
use std::fmt;

/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Emitted once per successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineChange {
    /// Monotonic version of the session, starting at 1 for the first edit.
    pub version: u64,
    pub pipeline: Pipeline,
}

type Callback = Box<dyn Fn(&PipelineChange) + Send + Sync>;

#[derive(Default)]
pub struct ChangeNotifier {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Callback)>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&PipelineChange) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Calls every subscriber in subscription order.
    pub fn notify(&self, change: &PipelineChange) {
        tracing::debug!(
            version = change.version,
            subscribers = self.subscribers.len(),
            "pipeline change emitted"
        );
        for (_, callback) in &self.subscribers {
            callback(change);
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
