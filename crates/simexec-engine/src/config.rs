//! Executive configuration, validation, and error types.
//!
//! [`SimulationConfig`] is the builder-input for constructing a
//! [`Simulation`](crate::Simulation). [`validate()`](SimulationConfig::validate)
//! checks structural invariants at startup; runtime setters on the
//! executive re-run the relevant check and keep the prior value on
//! failure.

use crate::clock::fixed_start;

/// Maximum number of pool worker threads per pool.
pub const MAX_POOL_SIZE: usize = 32;

// ── StartTime ──────────────────────────────────────────────────────

/// Initial simulated date and time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StartTime {
    /// Slave simulated time to the host's UTC clock. Simulated time then
    /// always advances, even when frozen.
    #[default]
    RealUtc,
    /// Start at a fixed UTC calendar date and time.
    Fixed {
        /// Calendar year.
        year: i32,
        /// Month, `1..=12`.
        month: u32,
        /// Day of month, `1..=31`.
        day: u32,
        /// Hour, `0..24`.
        hour: u32,
        /// Minute, `0..60`.
        minute: u32,
        /// Second, `0..60`.
        second: u32,
    },
}

impl StartTime {
    /// Check the calendar fields of a fixed start time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let StartTime::Fixed {
            year,
            month,
            day,
            hour,
            minute,
            second,
        } = *self
        else {
            return Ok(());
        };
        if chrono::NaiveDate::from_ymd_opt(year, month, day).is_none() {
            return Err(ConfigError::InvalidStartTime {
                reason: format!("{year}-{month:02}-{day:02} is not a calendar date"),
            });
        }
        if fixed_start(year, month, day, hour, minute, second).is_none() {
            return Err(ConfigError::InvalidStartTime {
                reason: format!("time {hour:02}:{minute:02}:{second:02} out of range"),
            });
        }
        Ok(())
    }
}

// ── OverflowPolicy ─────────────────────────────────────────────────

/// What to do when the new-player queue is full.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Refuse the request without logging.
    Silent,
    /// Refuse the request and log a warning.
    #[default]
    Warn,
}

// ── SimulationConfig ───────────────────────────────────────────────

/// Configuration for a [`Simulation`](crate::Simulation).
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Requested time-critical partitions (the calling thread supplies
    /// the last one). Default: 1.
    pub tc_threads: usize,
    /// Requested background partitions. Default: 1.
    pub bg_threads: usize,
    /// Initial simulated date/time. Default: [`StartTime::RealUtc`].
    pub start_time: StartTime,
    /// First ID handed out by the released-weapon generator. Default: 10001.
    pub first_weapon_id: u16,
    /// Capacity of the new-player queue. Default: 256.
    pub new_player_queue_capacity: usize,
    /// Behaviour when the new-player queue is full.
    pub queue_overflow: OverflowPolicy,
    /// Start with simulated time frozen. Default: false.
    pub freeze_sim_time: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tc_threads: 1,
            bg_threads: 1,
            start_time: StartTime::RealUtc,
            first_weapon_id: 10001,
            new_player_queue_capacity: 256,
            queue_overflow: OverflowPolicy::Warn,
            freeze_sim_time: false,
        }
    }
}

impl SimulationConfig {
    /// Check structural invariants.
    ///
    /// Thread counts above the host limit are not an error; they are
    /// clamped by [`resolve_threads()`] when the pools are built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threads(self.tc_threads)?;
        check_threads(self.bg_threads)?;
        self.start_time.validate()?;
        if self.first_weapon_id == 0 {
            return Err(ConfigError::InvalidWeaponIdFloor {
                value: self.first_weapon_id,
            });
        }
        if self.new_player_queue_capacity == 0 {
            return Err(ConfigError::QueueCapacityZero);
        }
        Ok(())
    }
}

pub(crate) fn check_threads(requested: usize) -> Result<(), ConfigError> {
    if requested == 0 {
        return Err(ConfigError::InvalidThreadCount { requested });
    }
    Ok(())
}

/// Largest partition count this host supports: `numCPUs - 1`, at least
/// one, and no more than [`MAX_POOL_SIZE`].
pub fn max_threads() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus.saturating_sub(1).clamp(1, MAX_POOL_SIZE)
}

/// Clamp a requested partition count to `[1, max_threads()]`.
pub fn resolve_threads(requested: usize) -> usize {
    requested.clamp(1, max_threads())
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while configuring an executive.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A thread-pool size of zero was requested.
    #[error("invalid thread count {requested}: at least one partition is required")]
    InvalidThreadCount {
        /// The rejected value.
        requested: usize,
    },
    /// The fixed start date or time is malformed.
    #[error("invalid start time: {reason}")]
    InvalidStartTime {
        /// Which field was out of range.
        reason: String,
    },
    /// The released-weapon ID floor is zero.
    #[error("invalid first weapon id {value}: must be non-zero")]
    InvalidWeaponIdFloor {
        /// The rejected value.
        value: u16,
    },
    /// The new-player queue capacity is zero.
    #[error("new-player queue capacity must be at least 1")]
    QueueCapacityZero,
    /// Two configured players share a name.
    #[error("duplicate player name {name:?}")]
    DuplicatePlayerName {
        /// The repeated name.
        name: String,
    },
    /// A pool worker thread could not be spawned.
    #[error("thread spawn failed: {reason}")]
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_threads_rejected() {
        let cfg = SimulationConfig {
            bg_threads: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidThreadCount { requested: 0 })
        );
    }

    #[test]
    fn zero_queue_rejected() {
        let cfg = SimulationConfig {
            new_player_queue_capacity: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::QueueCapacityZero));
    }

    #[test]
    fn zero_weapon_floor_rejected() {
        let cfg = SimulationConfig {
            first_weapon_id: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidWeaponIdFloor { value: 0 })
        ));
    }

    #[test]
    fn fixed_start_time_checks_calendar() {
        let ok = StartTime::Fixed {
            year: 2024,
            month: 2,
            day: 29,
            hour: 23,
            minute: 59,
            second: 59,
        };
        assert!(ok.validate().is_ok());
        let bad_day = StartTime::Fixed {
            year: 2023,
            month: 2,
            day: 29,
            hour: 0,
            minute: 0,
            second: 0,
        };
        assert!(matches!(
            bad_day.validate(),
            Err(ConfigError::InvalidStartTime { .. })
        ));
        let bad_hour = StartTime::Fixed {
            year: 2023,
            month: 1,
            day: 1,
            hour: 24,
            minute: 0,
            second: 0,
        };
        assert!(bad_hour.validate().is_err());
    }

    #[test]
    fn resolve_threads_clamps() {
        assert_eq!(resolve_threads(0), 1);
        assert!(resolve_threads(1_000) <= MAX_POOL_SIZE);
        assert!(resolve_threads(1_000) >= 1);
        assert_eq!(resolve_threads(1), 1);
    }
}
