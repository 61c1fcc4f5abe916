//! Player lifecycle modes and their lock-free storage.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle mode of a [`Player`](crate::Player).
///
/// ```text
/// INACTIVE ──> ACTIVE <──> PRE_RELEASE
///                │
///                ├──> KILLED | CRASHED | DETONATED | LAUNCHED
///  (any) ───────────────────────────────────────> DELETE_REQUEST
/// ```
///
/// `DeleteRequest` is terminal with respect to the player list: the next
/// maintenance pass removes the player and no other mode is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PlayerMode {
    /// Configured but not participating.
    Inactive = 0,
    /// Participating in time-critical and background updates.
    Active = 1,
    /// Destroyed by another player or by damage.
    Killed = 2,
    /// Crashed into terrain or collided.
    Crashed = 3,
    /// Weapon that has detonated.
    Detonated = 4,
    /// Carried weapon that has not been released yet.
    PreRelease = 5,
    /// Launched vehicle that has left the simulation.
    Launched = 6,
    /// Flagged for removal at the next player-list maintenance pass.
    DeleteRequest = 7,
}

impl PlayerMode {
    /// Decode a stored discriminant. Unknown values map to `Inactive`.
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Active,
            2 => Self::Killed,
            3 => Self::Crashed,
            4 => Self::Detonated,
            5 => Self::PreRelease,
            6 => Self::Launched,
            7 => Self::DeleteRequest,
            _ => Self::Inactive,
        }
    }

    /// Whether time-critical and background updates run in this mode.
    pub fn is_updatable(self) -> bool {
        matches!(self, Self::Active | Self::PreRelease)
    }
}

/// Atomic cell holding a [`PlayerMode`].
///
/// Game logic on any thread may request removal while the executive's
/// worker threads are reading the mode, so the mode lives outside the
/// player's state lock.
#[derive(Debug)]
pub(crate) struct AtomicMode(AtomicU8);

impl AtomicMode {
    pub(crate) fn new(mode: PlayerMode) -> Self {
        Self(AtomicU8::new(mode as u8))
    }

    pub(crate) fn load(&self) -> PlayerMode {
        PlayerMode::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Store `mode` unless the cell already holds `DeleteRequest`.
    /// Returns the previous mode on success.
    pub(crate) fn transition(&self, mode: PlayerMode) -> Result<PlayerMode, PlayerMode> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                if cur == PlayerMode::DeleteRequest as u8 {
                    None
                } else {
                    Some(mode as u8)
                }
            })
            .map(PlayerMode::from_u8)
            .map_err(PlayerMode::from_u8)
    }
}
