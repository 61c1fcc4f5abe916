//! Error types for network sessions.

use simexec_core::{FederateName, PlayerId};

use crate::nib::IoType;

/// Errors from NIB tables, entity-type parsing and protocol bindings.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NetError {
    /// A NIB table is at capacity.
    #[error("{io:?} NIB table full (capacity {capacity})")]
    TableFull {
        /// Which table.
        io: IoType,
        /// Configured capacity.
        capacity: usize,
    },
    /// A NIB with the same key already exists.
    #[error("NIB ({federate},{player_id}) already exists")]
    Duplicate {
        /// Player ID of the rejected NIB.
        player_id: PlayerId,
        /// Federate of the rejected NIB.
        federate: FederateName,
    },
    /// No NIB with the given key.
    #[error("no NIB ({federate},{player_id})")]
    NotFound {
        /// Player ID searched for.
        player_id: PlayerId,
        /// Federate searched for.
        federate: FederateName,
    },
    /// The protocol binding reported a failure.
    #[error("binding error: {0}")]
    Binding(String),
    /// The requested direction is disabled for this session.
    #[error("{0:?} is disabled for this session")]
    Disabled(IoType),
    /// An entity-type string could not be parsed.
    #[error("invalid entity type {text:?}")]
    InvalidEntityType {
        /// The rejected text.
        text: String,
    },
}

/// Errors detected by [`NetIoConfig::validate()`](crate::NetIoConfig::validate).
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum NetConfigError {
    /// Network ID 0 is reserved for the local simulation.
    #[error("network id 0 is reserved for local players")]
    InvalidNetworkId,
    /// The federate name is empty.
    #[error("federate name must not be empty")]
    EmptyFederateName,
    /// A duration or distance is NaN, infinite or negative.
    #[error("{what} must be finite and positive, got {value}")]
    InvalidValue {
        /// Which setting.
        what: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A capacity or per-pass limit is zero.
    #[error("{what} must be at least 1")]
    ZeroLimit {
        /// Which setting.
        what: &'static str,
    },
}
