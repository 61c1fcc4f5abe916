//! Bounded FIFO of players waiting to join the active list.
//!
//! Any thread may push (game logic, network input); only the executive's
//! list maintenance drains it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use simexec_core::Player;

use crate::config::OverflowPolicy;

/// A queued insertion request.
#[derive(Clone, Debug)]
pub struct PendingPlayer {
    /// Name the player will be listed under.
    pub name: Arc<str>,
    /// The player itself.
    pub player: Arc<Player>,
}

/// Errors from [`NewPlayerQueue::push()`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The queue is at capacity.
    #[error("new-player queue full (capacity {capacity})")]
    Full {
        /// Configured capacity.
        capacity: usize,
    },
    /// The same player object is already queued.
    #[error("player {name:?} is already queued")]
    Duplicate {
        /// Name of the rejected request.
        name: String,
    },
    /// The executive is shutting down.
    #[error("executive is shutting down")]
    ShuttingDown,
}

/// Bounded new-player queue.
pub struct NewPlayerQueue {
    queue: Mutex<VecDeque<PendingPlayer>>,
    capacity: usize,
    policy: OverflowPolicy,
    closed: AtomicBool,
    rejections: AtomicU64,
}

impl NewPlayerQueue {
    /// Create a queue holding at most `capacity` requests.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            policy,
            closed: AtomicBool::new(false),
            rejections: AtomicU64::new(0),
        }
    }

    /// Enqueue `player` under `name`.
    pub fn push(&self, name: &str, player: Arc<Player>) -> Result<(), QueueError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueueError::ShuttingDown);
        }
        let mut q = self.queue.lock();
        if q.iter().any(|p| Arc::ptr_eq(&p.player, &player)) {
            self.rejections.fetch_add(1, Ordering::Relaxed);
            return Err(QueueError::Duplicate {
                name: name.to_string(),
            });
        }
        if q.len() >= self.capacity {
            self.rejections.fetch_add(1, Ordering::Relaxed);
            if self.policy == OverflowPolicy::Warn {
                tracing::warn!(name, capacity = self.capacity, "new-player queue full; request dropped");
            }
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }
        q.push_back(PendingPlayer {
            name: Arc::from(name),
            player,
        });
        Ok(())
    }

    /// Take every queued request in FIFO order.
    pub fn drain(&self) -> Vec<PendingPlayer> {
        self.queue.lock().drain(..).collect()
    }

    /// Number of queued requests.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cumulative refused pushes (full or duplicate).
    pub fn rejections(&self) -> u64 {
        self.rejections.load(Ordering::Relaxed)
    }

    /// Refuse further pushes and discard anything queued.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.queue.lock().clear();
    }

    /// Whether the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
