//! Image-generator host contract.

use std::sync::Arc;

use simexec_core::Player;
use simexec_engine::PlayerList;

/// A visual system driven on the time-critical tick.
///
/// Called once per time-critical frame, after the executive's phases,
/// with the ownship and the list snapshot that frame ran against.
pub trait IgHost: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Render or forward one frame.
    fn update_tc(&self, ownship: Option<&Arc<Player>>, players: &PlayerList, dt: f64);

    /// Background work (model loading, database paging).
    fn update_data(&self, _dt: f64) {}
}
