//! Network session configuration.

use simexec_core::NetworkId;

use crate::dead_reckoning::{DrAlgorithm, DrThresholds};
use crate::error::NetConfigError;

/// Configuration for one [`NetIo`](crate::NetIo) session.
#[derive(Clone, Debug, PartialEq)]
pub struct NetIoConfig {
    /// Session ID, `1..=255`. Players this session creates carry it.
    pub network_id: NetworkId,
    /// Federation (exercise) name.
    pub federation_name: String,
    /// Name this simulation publishes under.
    pub federate_name: String,
    /// Accept remote entities.
    pub input_enabled: bool,
    /// Publish local entities.
    pub output_enabled: bool,
    /// Also publish proxies owned by other sessions.
    pub relay_enabled: bool,
    /// Proxies farther than this from the ownship are not created
    /// (metres, `0.0` disables the filter).
    pub max_entity_range: f64,
    /// Input NIBs not updated for this long are dropped (seconds).
    pub max_age: f64,
    /// Cap on output NIBs created per pass.
    pub max_new_outgoing: usize,
    /// Input NIB table capacity.
    pub max_input_nibs: usize,
    /// Output NIB table capacity.
    pub max_output_nibs: usize,
    /// Output update thresholds.
    pub thresholds: DrThresholds,
    /// Algorithm published for local entities.
    pub output_dr_algorithm: DrAlgorithm,
}

impl Default for NetIoConfig {
    fn default() -> Self {
        Self {
            network_id: NetworkId(1),
            federation_name: "simexec".to_string(),
            federate_name: "simexec".to_string(),
            input_enabled: true,
            output_enabled: true,
            relay_enabled: false,
            max_entity_range: 0.0,
            max_age: 12.5,
            max_new_outgoing: 16,
            max_input_nibs: 1000,
            max_output_nibs: 1000,
            thresholds: DrThresholds::default(),
            output_dr_algorithm: DrAlgorithm::Rvw,
        }
    }
}

fn positive(what: &'static str, value: f64) -> Result<(), NetConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(NetConfigError::InvalidValue { what, value })
    }
}

fn nonzero(what: &'static str, value: usize) -> Result<(), NetConfigError> {
    if value == 0 {
        Err(NetConfigError::ZeroLimit { what })
    } else {
        Ok(())
    }
}

impl NetIoConfig {
    /// Check every field.
    pub fn validate(&self) -> Result<(), NetConfigError> {
        if self.network_id.is_local() {
            return Err(NetConfigError::InvalidNetworkId);
        }
        if self.federate_name.trim().is_empty() {
            return Err(NetConfigError::EmptyFederateName);
        }
        if !(self.max_entity_range.is_finite() && self.max_entity_range >= 0.0) {
            return Err(NetConfigError::InvalidValue {
                what: "max_entity_range",
                value: self.max_entity_range,
            });
        }
        positive("max_age", self.max_age)?;
        positive("max_position_error", self.thresholds.max_position_error)?;
        positive("max_orientation_error", self.thresholds.max_orientation_error)?;
        positive("max_time_dr", self.thresholds.max_time)?;
        nonzero("max_new_outgoing", self.max_new_outgoing)?;
        nonzero("max_input_nibs", self.max_input_nibs)?;
        nonzero("max_output_nibs", self.max_output_nibs)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(NetIoConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_local_network_id() {
        let cfg = NetIoConfig {
            network_id: NetworkId::LOCAL,
            ..NetIoConfig::default()
        };
        assert_eq!(cfg.validate(), Err(NetConfigError::InvalidNetworkId));
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = NetIoConfig {
            max_age: f64::NAN,
            ..NetIoConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(NetConfigError::InvalidValue { what: "max_age", .. })
        ));
        let cfg = NetIoConfig {
            max_new_outgoing: 0,
            ..NetIoConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(NetConfigError::ZeroLimit {
                what: "max_new_outgoing"
            })
        );
        let cfg = NetIoConfig {
            federate_name: " ".into(),
            ..NetIoConfig::default()
        };
        assert_eq!(cfg.validate(), Err(NetConfigError::EmptyFederateName));
    }
}
