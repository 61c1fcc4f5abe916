//! Simulation executive for simexec.
//!
//! Provides the [`Simulation`] that advances players through
//! cycle/frame/phase time, fans each phase out over a partitioned
//! [`SyncPool`], and stages player-list mutations behind immutable
//! [`PlayerList`] snapshots.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod metrics;
pub mod new_player_queue;
pub mod partition;
pub mod player_list;
pub mod simulation;
pub mod sync_thread;
pub mod unique_id;

pub use clock::ExecClock;
pub use config::{max_threads, ConfigError, OverflowPolicy, SimulationConfig, StartTime, MAX_POOL_SIZE};
pub use metrics::FrameMetrics;
pub use new_player_queue::{NewPlayerQueue, PendingPlayer, QueueError};
pub use player_list::{InsertRefused, PlayerEntry, PlayerList};
pub use simulation::{Simulation, SimulationBuilder, FRAMES_PER_CYCLE};
pub use sync_thread::{SyncPool, SyncThread, WorkFn};
pub use unique_id::UniqueIds;
