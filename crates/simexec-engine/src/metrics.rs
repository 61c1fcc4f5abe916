//! Per-executive timing and list-maintenance counters.
//!
//! [`FrameMetrics`] is updated by the executive after every
//! time-critical frame and background pass; callers read a copy via
//! [`Simulation::metrics()`](crate::Simulation::metrics).

use simexec_core::Statistic;

/// Timing statistics and cumulative counters.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default)]
pub struct FrameMetrics {
    /// Wall-clock duration of each time-critical frame (all four phases).
    pub tc_frame_us: Statistic,
    /// Wall-clock duration of each background pass, maintenance included.
    pub bg_pass_us: Statistic,
    /// Time-critical frames executed since the last reset.
    pub frames: u64,
    /// Background passes executed since the last reset.
    pub background_passes: u64,
    /// Players inserted by list maintenance.
    pub players_added: u64,
    /// Players removed by list maintenance.
    pub players_removed: u64,
    /// Queued players refused at insertion (duplicate name or key).
    pub players_rejected: u64,
    /// Cumulative refused new-player queue pushes.
    pub queue_rejections: u64,
    /// Number of player-list swaps published.
    pub list_swaps: u64,
}

impl FrameMetrics {
    /// Clear timing statistics and counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
