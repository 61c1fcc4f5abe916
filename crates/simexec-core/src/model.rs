//! Player capability trait and per-frame context.
//!
//! A [`Player`] is composed of a list of [`PlayerModel`]s (dynamics,
//! sensors, onboard computers, ...). The executive calls every model of
//! every updatable player once per phase in the time-critical path and
//! once per background pass.

use std::fmt;
use std::sync::Arc;

use crate::id::{NetworkId, PlayerId};
use crate::player::Player;

/// One of the four fixed phases of a time-critical frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Phase {
    /// Dynamics integration.
    Dynamics = 0,
    /// Emission (e.g. sensor transmit).
    Transmit = 1,
    /// Reception (e.g. sensor receive).
    Receive = 2,
    /// Logic and processing.
    Process = 3,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 4] = [Phase::Dynamics, Phase::Transmit, Phase::Receive, Phase::Process];

    /// Number of phases per frame.
    pub const COUNT: u32 = 4;

    /// Phase from its index (`0..4`), wrapping out-of-range values.
    pub fn from_index(i: u32) -> Phase {
        Self::ALL[(i % Self::COUNT) as usize]
    }

    /// Index of this phase (`0..4`).
    pub fn index(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Read access to the player snapshot a frame is running against.
///
/// Implemented by the executive's player list. Models use it to find
/// the players they interact with (e.g. emitters during [`Phase::Receive`]).
pub trait PlayerLookup: Send + Sync {
    /// Number of players in the snapshot.
    fn len(&self) -> usize;

    /// Whether the snapshot is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Player at `index` in sort order.
    fn player_at(&self, index: usize) -> Option<&Arc<Player>>;

    /// Find a player by ID within a network scope.
    fn find(&self, id: PlayerId, network_id: NetworkId) -> Option<&Arc<Player>>;
}

/// Context handed to every model call.
pub struct FrameContext<'a> {
    /// Current phase. Background updates report [`Phase::Process`].
    pub phase: Phase,
    /// Delta time for this call (seconds). Time-critical calls receive
    /// the phase-scaled `dt / 4`.
    pub dt: f64,
    /// Executive phase counter (`cycle * 64 + frame * 4 + phase`).
    pub exec_counter: u64,
    /// The snapshot this pass is running against.
    pub players: &'a dyn PlayerLookup,
}

/// A capability attached to a player.
///
/// Models are only touched by the worker that owns the player's
/// partition for the current dispatch, so they take `&mut self`. A model
/// that reads *other* players' state must not hold its own player's
/// state guard while doing so.
pub trait PlayerModel: Send {
    /// Short name for diagnostics.
    fn name(&self) -> &str;

    /// Time-critical update for one phase.
    fn update_tc(&mut self, _player: &Player, _ctx: &FrameContext<'_>) {}

    /// Background update.
    fn update_data(&mut self, _player: &Player, _ctx: &FrameContext<'_>) {}

    /// Restore the model's initial state.
    fn reset(&mut self, _player: &Player) {}

    /// Clone into a fresh box (used when spawning proxies from templates).
    fn box_clone(&self) -> Box<dyn PlayerModel>;
}

/// Default dynamics: constant-acceleration integration during
/// [`Phase::Dynamics`].
#[derive(Clone, Debug, Default)]
pub struct KinematicDynamics;

impl PlayerModel for KinematicDynamics {
    fn name(&self) -> &str {
        "kinematic_dynamics"
    }

    fn update_tc(&mut self, player: &Player, ctx: &FrameContext<'_>) {
        if ctx.phase == Phase::Dynamics {
            player.state_mut().kinematics.integrate(ctx.dt);
        }
    }

    fn box_clone(&self) -> Box<dyn PlayerModel> {
        Box::new(self.clone())
    }
}
