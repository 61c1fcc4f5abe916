//! Network Interface Blocks.
//!
//! A [`Nib`] ties one player to one network session in one direction.
//! Identity (direction, session, player ID, federate) is fixed when the
//! NIB is created; everything the session updates per frame lives behind
//! one mutex. Bindings may attach their own per-entity data through
//! [`Nib::with_extension()`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use simexec_core::{FederateName, Kinematics, NetworkId, NetworkLink, Player, PlayerId, PlayerMode};

use crate::dead_reckoning::{self, DrAlgorithm, DrThresholds, UpdateReason};
use crate::entity_type::EntityType;

/// Direction of a NIB.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IoType {
    /// Remote entity mirrored by a local proxy player.
    Input,
    /// Local (or relayed) player published to the network.
    Output,
}

/// Everything a factory needs to build a NIB.
#[derive(Clone, Debug)]
pub struct NibInit {
    /// Direction.
    pub io_type: IoType,
    /// Owning session.
    pub network_id: NetworkId,
    /// Player ID on the network.
    pub player_id: PlayerId,
    /// Owning federate.
    pub federate: FederateName,
    /// Entity marking / display name.
    pub name: Arc<str>,
    /// Network entity type.
    pub entity_type: EntityType,
    /// Dead-reckoning algorithm.
    pub dr_algorithm: DrAlgorithm,
    /// Output update thresholds.
    pub thresholds: DrThresholds,
}

#[derive(Debug)]
struct NibState {
    mode: PlayerMode,
    player: Option<Arc<Player>>,
    checked: bool,
    entity_type: EntityType,
    entity_type_checked: bool,
    entity_type_valid: bool,
    dr_algorithm: DrAlgorithm,
    dr: Kinematics,
    dr_time: f64,
    ever_updated: bool,
    last_update: f64,
    timeout_enabled: bool,
    detonation_sent: bool,
    removal_sent: bool,
    thresholds: DrThresholds,
    updates: u64,
    proxy_queued_at: u64,
}

/// A Network Interface Block.
pub struct Nib {
    io_type: IoType,
    network_id: NetworkId,
    player_id: PlayerId,
    federate: FederateName,
    name: Arc<str>,
    state: Mutex<NibState>,
    extension: Option<Box<dyn Any + Send + Sync>>,
}

// Compile-time assertion: NIBs are shared between the network and
// background threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Nib>();
};

impl Nib {
    /// Build a NIB. It starts `Inactive`, unchecked, with no player.
    pub fn new(init: NibInit) -> Self {
        Self {
            io_type: init.io_type,
            network_id: init.network_id,
            player_id: init.player_id,
            federate: init.federate,
            name: init.name,
            state: Mutex::new(NibState {
                mode: PlayerMode::Inactive,
                player: None,
                checked: false,
                entity_type: init.entity_type,
                entity_type_checked: false,
                entity_type_valid: false,
                dr_algorithm: init.dr_algorithm,
                dr: Kinematics::default(),
                dr_time: 0.0,
                ever_updated: false,
                last_update: 0.0,
                timeout_enabled: init.io_type == IoType::Input,
                detonation_sent: false,
                removal_sent: false,
                thresholds: init.thresholds,
                updates: 0,
                proxy_queued_at: 0,
            }),
            extension: None,
        }
    }

    /// Attach binding-specific data.
    pub fn with_extension<T: Any + Send + Sync>(mut self, ext: T) -> Self {
        self.extension = Some(Box::new(ext));
        self
    }

    /// Binding-specific data, if present and of type `T`.
    pub fn extension<T: Any>(&self) -> Option<&T> {
        self.extension.as_ref().and_then(|e| e.downcast_ref::<T>())
    }

    /// Direction.
    pub fn io_type(&self) -> IoType {
        self.io_type
    }

    /// Owning session.
    pub fn network_id(&self) -> NetworkId {
        self.network_id
    }

    /// Player ID on the network.
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Owning federate.
    pub fn federate(&self) -> &FederateName {
        &self.federate
    }

    /// Entity marking.
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Table key: player ID, then federate name.
    pub fn key(&self) -> (PlayerId, &FederateName) {
        (self.player_id, &self.federate)
    }

    // ── Mode and player ────────────────────────────────────────────

    /// Current mode (an input NIB mirrors the remote mode; an output NIB
    /// holds the last published player mode).
    pub fn mode(&self) -> PlayerMode {
        self.state.lock().mode
    }

    /// Set the mode. Refused (returns `false`) once `DeleteRequest`.
    pub fn set_mode(&self, mode: PlayerMode) -> bool {
        let mut s = self.state.lock();
        if s.mode == PlayerMode::DeleteRequest {
            return mode == PlayerMode::DeleteRequest;
        }
        s.mode = mode;
        true
    }

    /// Flag the NIB for removal.
    pub fn request_delete(&self) {
        self.state.lock().mode = PlayerMode::DeleteRequest;
    }

    /// Whether the NIB is flagged for removal.
    pub fn is_removal_requested(&self) -> bool {
        self.mode() == PlayerMode::DeleteRequest
    }

    /// The associated player.
    pub fn player(&self) -> Option<Arc<Player>> {
        self.state.lock().player.clone()
    }

    /// Associate (or clear) the player.
    pub fn set_player(&self, player: Option<Arc<Player>>) {
        self.state.lock().player = player;
    }

    /// Remember the executive's maintenance-pass count read right after
    /// this NIB's proxy was queued.
    pub fn mark_proxy_queued(&self, maintenance_passes: u64) {
        self.state.lock().proxy_queued_at = maintenance_passes;
    }

    /// Maintenance-pass count recorded by
    /// [`mark_proxy_queued()`](Nib::mark_proxy_queued).
    pub fn proxy_queued_at(&self) -> u64 {
        self.state.lock().proxy_queued_at
    }

    // ── Reconciliation flags ───────────────────────────────────────

    /// Whether the current reconciliation pass has seen this NIB's player.
    pub fn is_checked(&self) -> bool {
        self.state.lock().checked
    }

    /// Set the reconciliation flag.
    pub fn set_checked(&self, checked: bool) {
        self.state.lock().checked = checked;
    }

    /// Network entity type.
    pub fn entity_type(&self) -> EntityType {
        self.state.lock().entity_type
    }

    /// Replace the entity type; clears the type check.
    pub fn set_entity_type(&self, et: EntityType) {
        let mut s = self.state.lock();
        if s.entity_type != et {
            s.entity_type = et;
            s.entity_type_checked = false;
            s.entity_type_valid = false;
        }
    }

    /// Whether the entity-type mapping has been attempted.
    pub fn is_entity_type_checked(&self) -> bool {
        self.state.lock().entity_type_checked
    }

    /// Whether the entity-type mapping succeeded.
    pub fn is_entity_type_valid(&self) -> bool {
        self.state.lock().entity_type_valid
    }

    /// Record the outcome of the entity-type mapping.
    pub fn set_entity_type_checked(&self, checked: bool, valid: bool) {
        let mut s = self.state.lock();
        s.entity_type_checked = checked;
        s.entity_type_valid = valid;
    }

    /// Whether a detonation notice has been emitted.
    pub fn detonation_sent(&self) -> bool {
        self.state.lock().detonation_sent
    }

    /// Mark the detonation notice as emitted.
    pub fn set_detonation_sent(&self) {
        self.state.lock().detonation_sent = true;
    }

    /// Returns `true` exactly once for a NIB flagged for removal, so the
    /// binding emits a single "entity removed" message.
    pub fn take_removal_notice(&self) -> bool {
        let mut s = self.state.lock();
        if s.mode != PlayerMode::DeleteRequest || s.removal_sent {
            return false;
        }
        s.removal_sent = true;
        true
    }

    // ── Timing ─────────────────────────────────────────────────────

    /// Whether age-based timeout applies (inputs default to `true`).
    pub fn is_timeout_enabled(&self) -> bool {
        self.state.lock().timeout_enabled
    }

    /// Enable or disable age-based timeout.
    pub fn set_timeout_enabled(&self, on: bool) {
        self.state.lock().timeout_enabled = on;
    }

    /// Executive time of the last received or sent update.
    pub fn last_update(&self) -> f64 {
        self.state.lock().last_update
    }

    /// Seconds since the last update at executive time `now`.
    pub fn age(&self, now: f64) -> f64 {
        now - self.last_update()
    }

    /// Whether the NIB has timed out at `now` given `max_age`.
    pub fn is_timed_out(&self, now: f64, max_age: f64) -> bool {
        let s = self.state.lock();
        s.timeout_enabled && now - s.last_update > max_age
    }

    /// Whether any update has been recorded. For an output NIB this means
    /// the entity has been announced on the network.
    pub fn was_published(&self) -> bool {
        self.state.lock().ever_updated
    }

    /// Number of updates received (input) or sent (output).
    pub fn update_count(&self) -> u64 {
        self.state.lock().updates
    }

    // ── Dead reckoning ─────────────────────────────────────────────

    /// Dead-reckoning algorithm.
    pub fn dr_algorithm(&self) -> DrAlgorithm {
        self.state.lock().dr_algorithm
    }

    /// State at the last update.
    pub fn dr_state(&self) -> Kinematics {
        self.state.lock().dr
    }

    /// Store a new reference state at executive time `now`. Used both for
    /// received (input) and sent (output) updates.
    pub fn record_update(&self, kinematics: Kinematics, algorithm: DrAlgorithm, now: f64) {
        let mut s = self.state.lock();
        s.dr = kinematics;
        s.dr_algorithm = algorithm;
        s.dr_time = now;
        s.last_update = now;
        s.ever_updated = true;
        s.updates += 1;
    }

    /// Touch the last-update time without changing the DR state. Output
    /// NIBs call this on creation so timeouts and heartbeats start fresh.
    pub fn touch(&self, now: f64) {
        self.state.lock().last_update = now;
    }

    /// Dead-reckoned state at executive time `now`.
    pub fn extrapolated(&self, now: f64) -> Kinematics {
        let s = self.state.lock();
        dead_reckoning::extrapolate(&s.dr, s.dr_algorithm, now - s.dr_time)
    }

    /// Whether an output update is due for `actual` at `now`. Always due
    /// before the first update.
    pub fn update_due(&self, actual: &Kinematics, now: f64) -> Option<UpdateReason> {
        let s = self.state.lock();
        if !s.ever_updated {
            return Some(UpdateReason::Heartbeat);
        }
        dead_reckoning::update_reason(&s.dr, s.dr_algorithm, now - s.dr_time, actual, &s.thresholds)
    }
}

impl NetworkLink for Nib {
    fn network_id(&self) -> NetworkId {
        self.network_id
    }

    fn is_input(&self) -> bool {
        self.io_type == IoType::Input
    }
}

impl fmt::Debug for Nib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nib")
            .field("io_type", &self.io_type)
            .field("network_id", &self.network_id)
            .field("player_id", &self.player_id)
            .field("federate", &self.federate)
            .field("mode", &self.mode())
            .finish()
    }
}
