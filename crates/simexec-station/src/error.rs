//! Station errors.

use simexec_engine::ConfigError;
use simexec_net::{NetConfigError, NetError};

/// Errors from building, starting or initialising a [`Station`](crate::Station).
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// Executive configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A network session configuration was rejected.
    #[error(transparent)]
    NetConfig(#[from] NetConfigError),
    /// A network session failed to initialise.
    #[error(transparent)]
    Net(#[from] NetError),
    /// A periodic rate is not finite or is below
    /// [`MIN_RATE_HZ`](crate::config::MIN_RATE_HZ).
    #[error("{what} must be finite and at least {min} Hz, got {value}", min = crate::config::MIN_RATE_HZ)]
    InvalidRate {
        /// Which rate.
        what: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// `start()` was called while the periodic threads were running.
    #[error("station already running")]
    AlreadyRunning,
    /// The station was shut down.
    #[error("station is shut down")]
    ShutDown,
    /// A periodic thread could not be spawned.
    #[error("failed to spawn {name}: {reason}")]
    ThreadSpawn {
        /// Thread name.
        name: &'static str,
        /// OS error text.
        reason: String,
    },
}
