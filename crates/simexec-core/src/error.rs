//! Error types for player lifecycle operations.

use crate::id::PlayerKey;
use crate::mode::PlayerMode;

/// Errors from [`Player`](crate::Player) lifecycle operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    /// The player has been flagged for removal; no further mode change
    /// is accepted.
    #[error("player {key} is awaiting removal and cannot enter {requested:?}")]
    DeleteRequested {
        /// The player that refused the transition.
        key: PlayerKey,
        /// The mode that was requested.
        requested: PlayerMode,
    },
    /// The player is already attached to an executive and its ID is frozen.
    #[error("player {key} is attached; its ID can no longer change")]
    Attached {
        /// The attached player.
        key: PlayerKey,
    },
}
