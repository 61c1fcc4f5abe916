//! Seven-level network entity-type codes.

use std::fmt;
use std::str::FromStr;

use crate::error::NetError;

/// An entity-type code: kind, domain, country, category, subcategory,
/// specific, extra.
///
/// A zero at any level is a wildcard when used as a mapping key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntityType {
    /// Entity kind (platform, munition, lifeform, ...).
    pub kind: u8,
    /// Domain (land, air, surface, ...).
    pub domain: u8,
    /// Country code.
    pub country: u16,
    /// Category.
    pub category: u8,
    /// Subcategory.
    pub subcategory: u8,
    /// Specific variant.
    pub specific: u8,
    /// Extra.
    pub extra: u8,
}

impl EntityType {
    /// Number of levels in a code.
    pub const LEVELS: usize = 7;

    /// Build a code from its seven levels.
    pub const fn new(
        kind: u8,
        domain: u8,
        country: u16,
        category: u8,
        subcategory: u8,
        specific: u8,
        extra: u8,
    ) -> Self {
        Self {
            kind,
            domain,
            country,
            category,
            subcategory,
            specific,
            extra,
        }
    }

    /// All levels, most significant first.
    pub fn levels(&self) -> [u16; Self::LEVELS] {
        [
            u16::from(self.kind),
            u16::from(self.domain),
            self.country,
            u16::from(self.category),
            u16::from(self.subcategory),
            u16::from(self.specific),
            u16::from(self.extra),
        ]
    }

    /// Whether every level is zero.
    pub fn is_unset(&self) -> bool {
        self.levels().iter().all(|&l| l == 0)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}.{}.{}",
            self.kind,
            self.domain,
            self.country,
            self.category,
            self.subcategory,
            self.specific,
            self.extra
        )
    }
}

impl FromStr for EntityType {
    type Err = NetError;

    /// Parse `"kind.domain.country.category.sub.specific.extra"`. Trailing levels may be omitted
    /// and default to zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || NetError::InvalidEntityType {
            text: s.to_string(),
        };
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.is_empty() || parts.len() > Self::LEVELS {
            return Err(bad());
        }
        let mut levels = [0u16; Self::LEVELS];
        for (slot, part) in levels.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| bad())?;
        }
        let narrow = |v: u16| u8::try_from(v).map_err(|_| bad());
        Ok(Self {
            kind: narrow(levels[0])?,
            domain: narrow(levels[1])?,
            country: levels[2],
            category: narrow(levels[3])?,
            subcategory: narrow(levels[4])?,
            specific: narrow(levels[5])?,
            extra: narrow(levels[6])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let et: EntityType = "1.2.225.1.3".parse().unwrap();
        assert_eq!(et, EntityType::new(1, 2, 225, 1, 3, 0, 0));
        assert_eq!(et.to_string(), "1.2.225.1.3.0.0");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("1.x".parse::<EntityType>().is_err());
        assert!("1.2.3.4.5.6.7.8".parse::<EntityType>().is_err());
        assert!("300.1".parse::<EntityType>().is_err());
    }

    #[test]
    fn unset() {
        assert!(EntityType::default().is_unset());
        assert!(!EntityType::new(1, 0, 0, 0, 0, 0, 0).is_unset());
    }
}
