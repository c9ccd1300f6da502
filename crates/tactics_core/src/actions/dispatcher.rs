use std::convert::Infallible;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use super::action::Action;
use crate::scene::ActorId;

pub const DEFAULT_DISPATCH_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Time between submission and resolution; stands in for a server round-trip.
    pub delay: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DISPATCH_DELAY,
        }
    }
}

/// A resolved action. Nothing in the world has changed yet; callers apply the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReceipt {
    pub sequence: u64,
    pub actor: ActorId,
    pub action: Action,
    pub submitted_at: Instant,
    pub resolved_at: Instant,
}

impl ActionReceipt {
    pub fn latency(&self) -> Duration {
        self.resolved_at.duration_since(self.submitted_at)
    }
}

/// Seam between input handling and whatever decides the outcome of an action.
///
/// Every submission completes independently; there is no cancellation or
/// de-duplication, so callers debounce if they need exactly-once behaviour.
pub trait ActionDispatcher {
    type Error: std::error::Error + Send + Sync + 'static;

    fn submit(
        &self,
        actor: &ActorId,
        action: Action,
    ) -> impl Future<Output = Result<ActionReceipt, Self::Error>> + Send;
}

/// In-process dispatcher: records the action and resolves after a fixed delay.
///
/// It cannot fail. A networked dispatcher will need its own error type with
/// timeout and retry handling.
#[derive(Debug, Default)]
pub struct LocalDispatcher {
    config: DispatcherConfig,
    next_sequence: AtomicU64,
}

impl LocalDispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            next_sequence: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> DispatcherConfig {
        self.config
    }

    pub fn submitted_count(&self) -> u64 {
        self.next_sequence.load(Ordering::Relaxed)
    }
}

impl ActionDispatcher for LocalDispatcher {
    type Error = Infallible;

    fn submit(
        &self,
        actor: &ActorId,
        action: Action,
    ) -> impl Future<Output = Result<ActionReceipt, Self::Error>> + Send {
        // Recorded at submission time, before the caller awaits.
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let submitted_at = Instant::now();
        info!(
            sequence,
            actor = %actor,
            kind = action.kind().as_str(),
            action = ?action,
            "action_submitted"
        );

        let actor = actor.clone();
        let delay = self.config.delay;
        async move {
            sleep(delay).await;
            let resolved_at = Instant::now();
            debug!(sequence, actor = %actor, "action_resolved");
            Ok(ActionReceipt {
                sequence,
                actor,
                action,
                submitted_at,
                resolved_at,
            })
        }
    }
}
