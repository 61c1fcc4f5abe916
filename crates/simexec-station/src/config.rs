//! Station configuration.

use crate::error::StationError;

/// Slowest accepted periodic rate (Hz).
pub const MIN_RATE_HZ: f64 = 0.001;

fn rate_ok(hz: f64) -> bool {
    hz.is_finite() && hz >= MIN_RATE_HZ
}

/// Periodic rates and ownship selection.
#[derive(Clone, Debug, PartialEq)]
pub struct StationConfig {
    /// Time-critical frame rate (Hz).
    pub tc_rate_hz: f64,
    /// Background pass rate (Hz).
    pub bg_rate_hz: f64,
    /// Network pass rate (Hz).
    pub net_rate_hz: f64,
    /// Player name selected as ownship at start.
    pub ownship: Option<String>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            tc_rate_hz: 50.0,
            bg_rate_hz: 10.0,
            net_rate_hz: 20.0,
            ownship: None,
        }
    }
}

impl StationConfig {
    /// Defaults overridden by `SIMEXEC_TC_RATE`, `SIMEXEC_BG_RATE`,
    /// `SIMEXEC_NET_RATE` and `SIMEXEC_OWNSHIP`. Bad values are logged and
    /// ignored.
    pub fn load_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// [`load_or_default()`](StationConfig::load_or_default) with a custom
    /// variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let rates: [(&str, &mut f64); 3] = [
            ("SIMEXEC_TC_RATE", &mut config.tc_rate_hz),
            ("SIMEXEC_BG_RATE", &mut config.bg_rate_hz),
            ("SIMEXEC_NET_RATE", &mut config.net_rate_hz),
        ];
        for (key, slot) in rates {
            let Some(raw) = lookup(key) else { continue };
            match raw.trim().parse::<f64>() {
                Ok(hz) if rate_ok(hz) => *slot = hz,
                Ok(_) => tracing::warn!("{key} must be at least {MIN_RATE_HZ} Hz, using default"),
                Err(_) => tracing::warn!("Invalid {key} '{raw}', using default"),
            }
        }

        if let Some(name) = lookup("SIMEXEC_OWNSHIP") {
            let name = name.trim();
            if name.is_empty() {
                tracing::warn!("SIMEXEC_OWNSHIP is empty, ignoring");
            } else {
                config.ownship = Some(name.to_string());
            }
        }

        config
    }

    /// Check that every rate is finite and at least [`MIN_RATE_HZ`].
    pub fn validate(&self) -> Result<(), StationError> {
        for (what, value) in [
            ("tc_rate_hz", self.tc_rate_hz),
            ("bg_rate_hz", self.bg_rate_hz),
            ("net_rate_hz", self.net_rate_hz),
        ] {
            if !rate_ok(value) {
                return Err(StationError::InvalidRate { what, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn overrides_apply() {
        let cfg = StationConfig::from_lookup(lookup(&[
            ("SIMEXEC_TC_RATE", "60"),
            ("SIMEXEC_NET_RATE", " 30.5 "),
            ("SIMEXEC_OWNSHIP", "viper"),
        ]));
        assert_eq!(cfg.tc_rate_hz, 60.0);
        assert_eq!(cfg.bg_rate_hz, 10.0);
        assert_eq!(cfg.net_rate_hz, 30.5);
        assert_eq!(cfg.ownship.as_deref(), Some("viper"));
    }

    #[test]
    fn bad_values_keep_defaults() {
        let cfg = StationConfig::from_lookup(lookup(&[
            ("SIMEXEC_TC_RATE", "fast"),
            ("SIMEXEC_BG_RATE", "-1"),
            ("SIMEXEC_OWNSHIP", "  "),
        ]));
        assert_eq!(cfg, StationConfig::default());
    }

    #[test]
    fn validate_rejects_zero_rate() {
        let cfg = StationConfig {
            bg_rate_hz: 0.0,
            ..StationConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(StationError::InvalidRate { what: "bg_rate_hz", .. })
        ));
    }

    #[test]
    fn rates_below_the_floor_are_refused() {
        let cfg = StationConfig {
            net_rate_hz: 1e-20,
            ..StationConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(StationError::InvalidRate { what: "net_rate_hz", .. })
        ));

        let slowest = StationConfig {
            net_rate_hz: MIN_RATE_HZ,
            ..StationConfig::default()
        };
        assert!(slowest.validate().is_ok());

        let cfg = StationConfig::from_lookup(lookup(&[("SIMEXEC_TC_RATE", "1e-20")]));
        assert_eq!(cfg.tc_rate_hz, StationConfig::default().tc_rate_hz);
    }
}
