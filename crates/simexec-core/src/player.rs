//! The simulated entity and its builder.
//!
//! A [`Player`] is shared (`Arc`) between the executive's player-list
//! snapshots and any NIBs that mirror it onto a network. Identity fields
//! are fixed at construction; the lifecycle mode is atomic so that any
//! thread can flag a removal; kinematic state sits behind a reader-writer
//! lock so that phase workers can read other players while the owning
//! partition integrates its own.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use smallvec::SmallVec;

use crate::error::PlayerError;
use crate::id::{FederateName, NetworkId, PlayerId, PlayerKey};
use crate::kinematics::Kinematics;
use crate::mode::{AtomicMode, PlayerMode};
use crate::model::{FrameContext, KinematicDynamics, PlayerModel};
use crate::recorder::{PlayerTag, RecorderEvent, RecorderSample, Services};

/// Broad category of a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerKind {
    /// Aircraft and other air vehicles.
    Air,
    /// Ground vehicles.
    Ground,
    /// Ships and submarines.
    Sea,
    /// Space vehicles.
    Space,
    /// Dismounted people and animals.
    Lifeform,
    /// Released or carried munitions.
    Weapon,
    /// Fixed structures.
    Building,
}

/// Mutable per-player simulation state.
#[derive(Clone, Debug, Default)]
pub struct PlayerState {
    /// Current kinematic state.
    pub kinematics: Kinematics,
    /// Damage level in `[0, 1]`; `1.0` is destroyed.
    pub damage: f64,
}

/// A network adapter that references a player without owning it.
///
/// Implemented by the network layer's NIB type. The player only ever
/// holds `Weak` handles to these.
pub trait NetworkLink: Send + Sync {
    /// Network session the link belongs to.
    fn network_id(&self) -> NetworkId;

    /// Whether this is an incoming (remote → proxy) link.
    fn is_input(&self) -> bool;
}

#[derive(Default)]
struct NetLinks {
    incoming: Option<Weak<dyn NetworkLink>>,
    outgoing: SmallVec<[(NetworkId, Weak<dyn NetworkLink>); 2]>,
}

/// A simulated entity.
pub struct Player {
    id: AtomicU16,
    name: RwLock<Arc<str>>,
    network_id: NetworkId,
    federate: Option<FederateName>,
    kind: PlayerKind,
    type_name: Arc<str>,
    mode: AtomicMode,
    init_mode: PlayerMode,
    initial: Kinematics,
    net_output_enabled: AtomicBool,
    kill_override: AtomicBool,
    crash_override: AtomicBool,
    state: RwLock<PlayerState>,
    models: Mutex<Vec<Box<dyn PlayerModel>>>,
    services: RwLock<Weak<Services>>,
    links: Mutex<NetLinks>,
}

// Compile-time assertion: Player must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Player>();
};

impl Player {
    /// Start building a local player.
    pub fn builder(name: impl AsRef<str>) -> PlayerBuilder {
        PlayerBuilder::new(name)
    }

    /// Player ID (`0` until assigned).
    pub fn id(&self) -> PlayerId {
        PlayerId(self.id.load(Ordering::Acquire))
    }

    /// Assign the player's ID. Refused once the player is attached to an
    /// executive, since the ID is part of the list's sort key.
    pub fn set_id(&self, id: PlayerId) -> Result<(), PlayerError> {
        if self.is_attached() {
            return Err(PlayerError::Attached { key: self.key() });
        }
        self.id.store(id.0, Ordering::Release);
        Ok(())
    }

    /// Sort key of this player.
    pub fn key(&self) -> PlayerKey {
        PlayerKey {
            network_id: self.network_id,
            federate: self.federate.clone(),
            id: self.id(),
        }
    }

    /// Display name.
    pub fn name(&self) -> Arc<str> {
        Arc::clone(&self.name.read())
    }

    /// Replace the display name.
    pub fn set_name(&self, name: impl AsRef<str>) {
        *self.name.write() = Arc::from(name.as_ref());
    }

    /// Owning network scope (`0` = local).
    pub fn network_id(&self) -> NetworkId {
        self.network_id
    }

    /// Owning federate for remote players.
    pub fn federate(&self) -> Option<&FederateName> {
        self.federate.as_ref()
    }

    /// Whether the player is owned by this simulation.
    pub fn is_local(&self) -> bool {
        self.network_id.is_local()
    }

    /// Whether the player mirrors a remote entity.
    pub fn is_proxy(&self) -> bool {
        !self.is_local()
    }

    /// Broad category.
    pub fn kind(&self) -> PlayerKind {
        self.kind
    }

    /// Model type name used for entity-type mapping (e.g. `"F-16C"`).
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether this player is a munition.
    pub fn is_weapon(&self) -> bool {
        self.kind == PlayerKind::Weapon
    }

    /// Current lifecycle mode.
    pub fn mode(&self) -> PlayerMode {
        self.mode.load()
    }

    /// Mode restored by [`reset()`](Player::reset).
    pub fn init_mode(&self) -> PlayerMode {
        self.init_mode
    }

    /// Change the lifecycle mode. Returns the previous mode.
    ///
    /// Fails once the player carries `DeleteRequest`.
    pub fn set_mode(&self, mode: PlayerMode) -> Result<PlayerMode, PlayerError> {
        self.mode.transition(mode).map_err(|_| {
            tracing::debug!(player = %self.key(), requested = ?mode, "mode change refused");
            PlayerError::DeleteRequested {
                key: self.key(),
                requested: mode,
            }
        })
    }

    /// Flag the player for removal at the next list maintenance pass.
    pub fn request_delete(&self) {
        // DeleteRequest -> DeleteRequest is the only refused case, and a
        // no-op.
        let _ = self.mode.transition(PlayerMode::DeleteRequest);
    }

    /// Whether the mode is `Active`.
    pub fn is_active(&self) -> bool {
        self.mode() == PlayerMode::Active
    }

    /// Whether the mode lets updates run (`Active` or `PreRelease`).
    pub fn is_updatable(&self) -> bool {
        self.mode().is_updatable()
    }

    /// Whether the player is flagged for removal.
    pub fn is_removal_requested(&self) -> bool {
        self.mode() == PlayerMode::DeleteRequest
    }

    /// Whether network sessions may publish this player.
    pub fn is_net_output_enabled(&self) -> bool {
        self.net_output_enabled.load(Ordering::Acquire)
    }

    /// Enable or disable network publication.
    pub fn set_net_output_enabled(&self, enabled: bool) {
        self.net_output_enabled.store(enabled, Ordering::Release);
    }

    /// Whether kill notifications leave the mode unchanged.
    pub fn kill_override(&self) -> bool {
        self.kill_override.load(Ordering::Acquire)
    }

    /// Set the kill override flag.
    pub fn set_kill_override(&self, on: bool) {
        self.kill_override.store(on, Ordering::Release);
    }

    /// Whether crash and collision notifications leave the mode unchanged.
    pub fn crash_override(&self) -> bool {
        self.crash_override.load(Ordering::Acquire)
    }

    /// Set the crash override flag.
    pub fn set_crash_override(&self, on: bool) {
        self.crash_override.store(on, Ordering::Release);
    }

    /// Shared read access to the simulation state.
    pub fn state(&self) -> RwLockReadGuard<'_, PlayerState> {
        self.state.read()
    }

    /// Exclusive access to the simulation state.
    pub fn state_mut(&self) -> RwLockWriteGuard<'_, PlayerState> {
        self.state.write()
    }

    /// Copy of the current kinematic state.
    pub fn kinematics(&self) -> Kinematics {
        self.state.read().kinematics
    }

    /// Overwrite the kinematic state.
    pub fn set_kinematics(&self, k: Kinematics) {
        self.state.write().kinematics = k;
    }

    /// Identity snapshot for recorder samples.
    pub fn tag(&self) -> PlayerTag {
        PlayerTag {
            id: self.id(),
            network_id: self.network_id,
            federate: self.federate.clone(),
            name: self.name(),
        }
    }

    // ── Executive attachment ────────────────────────────────────

    /// Attach to an executive's services.
    pub fn attach(&self, services: &Arc<Services>) {
        *self.services.write() = Arc::downgrade(services);
    }

    /// Drop the back-reference to the executive.
    pub fn detach(&self) {
        *self.services.write() = Weak::new();
    }

    /// Whether the player is attached to a live executive.
    pub fn is_attached(&self) -> bool {
        self.services.read().strong_count() > 0
    }

    /// The executive's services, if attached.
    pub fn services(&self) -> Option<Arc<Services>> {
        self.services.read().upgrade()
    }

    fn record(&self, sample: RecorderSample) {
        if let Some(services) = self.services() {
            services.record(sample);
        }
    }

    // ── Updates ─────────────────────────────────────────────────

    /// Time-critical update for one phase. No-op unless updatable.
    pub fn update_tc(&self, ctx: &FrameContext<'_>) {
        if !self.is_updatable() {
            return;
        }
        let mut models = self.models.lock();
        for model in models.iter_mut() {
            model.update_tc(self, ctx);
        }
    }

    /// Background update. No-op unless updatable.
    pub fn update_data(&self, ctx: &FrameContext<'_>) {
        if !self.is_updatable() {
            return;
        }
        let mut models = self.models.lock();
        for model in models.iter_mut() {
            model.update_data(self, ctx);
        }
    }

    /// Restore a local player to its configured mode and initial state.
    ///
    /// Proxies are driven by the network and are left untouched, as is
    /// any player already flagged for removal.
    pub fn reset(&self) {
        if self.is_proxy() || self.is_removal_requested() {
            return;
        }
        let _ = self.mode.transition(self.init_mode);
        {
            let mut state = self.state.write();
            state.kinematics = self.initial;
            state.damage = 0.0;
        }
        let mut models = self.models.lock();
        for model in models.iter_mut() {
            model.reset(self);
        }
    }

    /// Number of attached models.
    pub fn model_count(&self) -> usize {
        self.models.lock().len()
    }

    // ── Notifications ───────────────────────────────────────────

    /// Killed by `killer` (or by accumulated damage when `None`).
    ///
    /// The sample is always recorded; the transition to `Killed` is
    /// suppressed by the kill override. Returns whether the mode changed.
    pub fn kill_notification(&self, killer: Option<&Player>) -> bool {
        let mut sample = RecorderSample::new(RecorderEvent::PlayerKilled).with_player(self.tag());
        if let Some(k) = killer {
            sample = sample.with_player(k.tag());
        }
        self.record(sample);
        if self.kill_override() || !self.is_updatable() {
            return false;
        }
        self.set_mode(PlayerMode::Killed).is_ok()
    }

    /// Collided with `other`. Suppressed by the crash override.
    pub fn collision_notification(&self, other: &Player) -> bool {
        self.record(
            RecorderSample::new(RecorderEvent::PlayerCollision)
                .with_player(self.tag())
                .with_player(other.tag()),
        );
        if self.crash_override() || !self.is_updatable() {
            return false;
        }
        self.set_mode(PlayerMode::Crashed).is_ok()
    }

    /// Crashed into terrain. Suppressed by the crash override.
    pub fn crash_notification(&self) -> bool {
        self.record(RecorderSample::new(RecorderEvent::PlayerCrash).with_player(self.tag()));
        if self.crash_override() || !self.is_updatable() {
            return false;
        }
        self.set_mode(PlayerMode::Crashed).is_ok()
    }

    /// Accumulate damage. Reaching `1.0` is a kill (subject to the kill
    /// override). Returns the new damage level.
    pub fn apply_damage(&self, amount: f64) -> f64 {
        let damage = {
            let mut state = self.state.write();
            state.damage = (state.damage + amount).clamp(0.0, 1.0);
            state.damage
        };
        self.record(
            RecorderSample::new(RecorderEvent::PlayerDamaged)
                .with_player(self.tag())
                .with_value(damage),
        );
        if damage >= 1.0 {
            self.kill_notification(None);
        }
        damage
    }

    /// Release a carried weapon (`PreRelease` → `Active`).
    pub fn release(&self) -> bool {
        if self.mode() != PlayerMode::PreRelease {
            return false;
        }
        let released = self.set_mode(PlayerMode::Active).is_ok();
        if released {
            self.record(RecorderSample::new(RecorderEvent::WeaponReleased).with_player(self.tag()));
        }
        released
    }

    /// Detonate a weapon.
    pub fn detonate(&self) -> bool {
        if !self.is_updatable() {
            return false;
        }
        let detonated = self.set_mode(PlayerMode::Detonated).is_ok();
        if detonated {
            let pos = self.kinematics().position;
            self.record(
                RecorderSample::new(RecorderEvent::WeaponDetonation)
                    .with_player(self.tag())
                    .with_value(pos.x())
                    .with_value(pos.y())
                    .with_value(pos.z()),
            );
        }
        detonated
    }

    // ── Proxies ─────────────────────────────────────────────────

    /// Spawn a remote proxy using this player as the template.
    ///
    /// The proxy copies the template's category, type name, overrides and
    /// models, starts `Inactive`, and is owned by `network_id`/`federate`.
    pub fn proxy_from_template(
        &self,
        name: impl AsRef<str>,
        id: PlayerId,
        network_id: NetworkId,
        federate: FederateName,
        kinematics: Kinematics,
    ) -> Player {
        let models = self.models.lock().iter().map(|m| m.box_clone()).collect();
        Player {
            id: AtomicU16::new(id.0),
            name: RwLock::new(Arc::from(name.as_ref())),
            network_id,
            federate: Some(federate),
            kind: self.kind,
            type_name: Arc::clone(&self.type_name),
            mode: AtomicMode::new(PlayerMode::Inactive),
            init_mode: PlayerMode::Inactive,
            initial: kinematics,
            net_output_enabled: AtomicBool::new(self.is_net_output_enabled()),
            kill_override: AtomicBool::new(self.kill_override()),
            crash_override: AtomicBool::new(self.crash_override()),
            state: RwLock::new(PlayerState {
                kinematics,
                damage: 0.0,
            }),
            models: Mutex::new(models),
            services: RwLock::new(Weak::new()),
            links: Mutex::new(NetLinks::default()),
        }
    }

    // ── Network links ───────────────────────────────────────────

    /// Record the incoming NIB of a proxy.
    pub fn set_incoming_link(&self, link: Weak<dyn NetworkLink>) {
        self.links.lock().incoming = Some(link);
    }

    /// The incoming NIB, if it is still alive.
    pub fn incoming_link(&self) -> Option<Arc<dyn NetworkLink>> {
        self.links.lock().incoming.as_ref().and_then(Weak::upgrade)
    }

    /// Forget the incoming NIB.
    pub fn clear_incoming_link(&self) {
        self.links.lock().incoming = None;
    }

    /// Record the outgoing NIB for network `id`, replacing any previous one.
    pub fn set_outgoing_link(&self, id: NetworkId, link: Weak<dyn NetworkLink>) {
        let mut links = self.links.lock();
        links.outgoing.retain(|(n, _)| *n != id);
        links.outgoing.push((id, link));
    }

    /// The outgoing NIB for network `id`, if it is still alive.
    pub fn outgoing_link(&self, id: NetworkId) -> Option<Arc<dyn NetworkLink>> {
        self.links
            .lock()
            .outgoing
            .iter()
            .find(|(n, _)| *n == id)
            .and_then(|(_, w)| w.upgrade())
    }

    /// Forget the outgoing NIB for network `id`.
    pub fn clear_outgoing_link(&self, id: NetworkId) {
        self.links.lock().outgoing.retain(|(n, _)| *n != id);
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("key", &self.key())
            .field("name", &self.name())
            .field("kind", &self.kind)
            .field("mode", &self.mode())
            .finish()
    }
}

// ── PlayerBuilder ────────────────────────────────────────────────

/// Builder for local players (the configuration loader's output).
pub struct PlayerBuilder {
    name: String,
    id: PlayerId,
    kind: PlayerKind,
    type_name: Option<String>,
    init_mode: PlayerMode,
    kinematics: Kinematics,
    net_output_enabled: bool,
    kill_override: bool,
    crash_override: bool,
    models: Vec<Box<dyn PlayerModel>>,
    default_dynamics: bool,
}

impl PlayerBuilder {
    /// New builder for an `Air` player named `name`, `Active` on reset,
    /// with [`KinematicDynamics`] attached.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
            id: PlayerId::UNSET,
            kind: PlayerKind::Air,
            type_name: None,
            init_mode: PlayerMode::Active,
            kinematics: Kinematics::default(),
            net_output_enabled: true,
            kill_override: false,
            crash_override: false,
            models: Vec::new(),
            default_dynamics: true,
        }
    }

    /// Player ID; `0` requests auto-assignment.
    pub fn id(mut self, id: u16) -> Self {
        self.id = PlayerId(id);
        self
    }

    /// Player category.
    pub fn kind(mut self, kind: PlayerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Type name for entity-type mapping. Defaults to the player name.
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Mode restored by reset.
    pub fn init_mode(mut self, mode: PlayerMode) -> Self {
        self.init_mode = mode;
        self
    }

    /// Initial kinematic state.
    pub fn kinematics(mut self, k: Kinematics) -> Self {
        self.kinematics = k;
        self
    }

    /// Whether network sessions may publish this player.
    pub fn net_output(mut self, enabled: bool) -> Self {
        self.net_output_enabled = enabled;
        self
    }

    /// Suppress the transition to `Killed`.
    pub fn kill_override(mut self, on: bool) -> Self {
        self.kill_override = on;
        self
    }

    /// Suppress the transition to `Crashed`.
    pub fn crash_override(mut self, on: bool) -> Self {
        self.crash_override = on;
        self
    }

    /// Attach a model. Models run in attachment order.
    pub fn model(mut self, model: Box<dyn PlayerModel>) -> Self {
        self.models.push(model);
        self
    }

    /// Leave out the default [`KinematicDynamics`] model.
    pub fn without_default_dynamics(mut self) -> Self {
        self.default_dynamics = false;
        self
    }

    /// Build the player. It starts in its init mode.
    pub fn build(self) -> Player {
        let mut models: Vec<Box<dyn PlayerModel>> = Vec::with_capacity(self.models.len() + 1);
        if self.default_dynamics {
            models.push(Box::new(KinematicDynamics));
        }
        models.extend(self.models);
        let type_name = self.type_name.unwrap_or_else(|| self.name.clone());
        Player {
            id: AtomicU16::new(self.id.0),
            name: RwLock::new(Arc::from(self.name.as_str())),
            network_id: NetworkId::LOCAL,
            federate: None,
            kind: self.kind,
            type_name: Arc::from(type_name.as_str()),
            mode: AtomicMode::new(self.init_mode),
            init_mode: self.init_mode,
            initial: self.kinematics,
            net_output_enabled: AtomicBool::new(self.net_output_enabled),
            kill_override: AtomicBool::new(self.kill_override),
            crash_override: AtomicBool::new(self.crash_override),
            state: RwLock::new(PlayerState {
                kinematics: self.kinematics,
                damage: 0.0,
            }),
            models: Mutex::new(models),
            services: RwLock::new(Weak::new()),
            links: Mutex::new(NetLinks::default()),
        }
    }

    /// Build and wrap in an `Arc`.
    pub fn shared(self) -> Arc<Player> {
        Arc::new(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::Vec3;
    use crate::recorder::DataRecorder;

    struct Sink(Mutex<Vec<RecorderEvent>>);

    impl DataRecorder for Sink {
        fn record(&self, sample: RecorderSample) {
            self.0.lock().push(sample.event);
        }
    }

    fn attached(p: &Player) -> (Arc<Services>, Arc<Sink>) {
        let sink = Arc::new(Sink(Mutex::new(Vec::new())));
        let services = Arc::new(Services::new(Some(sink.clone() as Arc<dyn DataRecorder>)));
        p.attach(&services);
        (services, sink)
    }

    struct Link(NetworkId);

    impl NetworkLink for Link {
        fn network_id(&self) -> NetworkId {
            self.0
        }
        fn is_input(&self) -> bool {
            false
        }
    }

    #[test]
    fn builder_defaults() {
        let p = Player::builder("f16").id(3).build();
        assert_eq!(p.id(), PlayerId(3));
        assert_eq!(p.type_name(), "f16");
        assert!(p.is_local());
        assert!(p.is_active());
        assert_eq!(p.model_count(), 1);
    }

    #[test]
    fn delete_request_refuses_further_transitions() {
        let p = Player::builder("a").id(1).build();
        p.request_delete();
        assert!(p.is_removal_requested());
        assert!(matches!(
            p.set_mode(PlayerMode::Active),
            Err(PlayerError::DeleteRequested { .. })
        ));
        p.reset();
        assert!(p.is_removal_requested());
    }

    #[test]
    fn reset_restores_init_mode_and_state() {
        let p = Player::builder("a")
            .id(1)
            .init_mode(PlayerMode::Inactive)
            .kinematics(Kinematics::at(Vec3::new(1.0, 2.0, 3.0)))
            .build();
        p.set_mode(PlayerMode::Killed).unwrap();
        p.state_mut().kinematics.position = Vec3::ZERO;
        p.state_mut().damage = 0.5;
        p.reset();
        assert_eq!(p.mode(), PlayerMode::Inactive);
        assert_eq!(p.kinematics().position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.state().damage, 0.0);
    }

    #[test]
    fn kill_override_still_records() {
        let p = Player::builder("a").id(1).kill_override(true).build();
        let (_services, sink) = attached(&p);
        assert!(!p.kill_notification(None));
        assert!(p.is_active());
        assert_eq!(sink.0.lock().as_slice(), &[RecorderEvent::PlayerKilled]);
    }

    #[test]
    fn kill_transitions_without_override() {
        let killer = Player::builder("k").id(2).build();
        let p = Player::builder("a").id(1).build();
        let (_services, _sink) = attached(&p);
        assert!(p.kill_notification(Some(&killer)));
        assert_eq!(p.mode(), PlayerMode::Killed);
    }

    #[test]
    fn crash_override_suppresses_collision() {
        let other = Player::builder("o").id(2).build();
        let p = Player::builder("a").id(1).crash_override(true).build();
        let (_services, sink) = attached(&p);
        assert!(!p.collision_notification(&other));
        assert!(p.is_active());
        assert_eq!(sink.0.lock().as_slice(), &[RecorderEvent::PlayerCollision]);
    }

    #[test]
    fn damage_to_one_kills() {
        let p = Player::builder("a").id(1).build();
        let (_services, sink) = attached(&p);
        assert_eq!(p.apply_damage(0.6), 0.6);
        assert!(p.is_active());
        assert_eq!(p.apply_damage(0.6), 1.0);
        assert_eq!(p.mode(), PlayerMode::Killed);
        assert_eq!(
            sink.0.lock().as_slice(),
            &[
                RecorderEvent::PlayerDamaged,
                RecorderEvent::PlayerDamaged,
                RecorderEvent::PlayerKilled
            ]
        );
    }

    #[test]
    fn weapon_release_then_detonate() {
        let w = Player::builder("aim9")
            .id(10)
            .kind(PlayerKind::Weapon)
            .init_mode(PlayerMode::PreRelease)
            .build();
        assert!(w.is_weapon());
        assert!(w.release());
        assert!(w.is_active());
        assert!(!w.release());
        assert!(w.detonate());
        assert_eq!(w.mode(), PlayerMode::Detonated);
    }

    #[test]
    fn set_id_refused_when_attached() {
        let p = Player::builder("a").build();
        p.set_id(PlayerId(4)).unwrap();
        let (_services, _sink) = attached(&p);
        assert!(matches!(p.set_id(PlayerId(5)), Err(PlayerError::Attached { .. })));
        p.detach();
        assert!(p.set_id(PlayerId(5)).is_ok());
    }

    #[test]
    fn detach_when_services_dropped() {
        let p = Player::builder("a").id(1).build();
        {
            let (_services, _sink) = attached(&p);
            assert!(p.is_attached());
        }
        assert!(!p.is_attached());
    }

    #[test]
    fn proxy_copies_template() {
        let template = Player::builder("t")
            .kind(PlayerKind::Ground)
            .type_name("T-72")
            .kill_override(true)
            .build();
        let proxy = template.proxy_from_template(
            "b5",
            PlayerId(5),
            NetworkId(1),
            "B".into(),
            Kinematics::at(Vec3::new(5.0, 0.0, 0.0)),
        );
        assert!(proxy.is_proxy());
        assert_eq!(proxy.kind(), PlayerKind::Ground);
        assert_eq!(proxy.type_name(), "T-72");
        assert_eq!(proxy.mode(), PlayerMode::Inactive);
        assert!(proxy.kill_override());
        assert_eq!(proxy.model_count(), 1);
        assert_eq!(proxy.federate().map(|f| f.as_str()), Some("B"));
    }

    #[test]
    fn outgoing_links_are_weak() {
        let p = Player::builder("a").id(1).build();
        let link: Arc<dyn NetworkLink> = Arc::new(Link(NetworkId(1)));
        p.set_outgoing_link(NetworkId(1), Arc::downgrade(&link));
        assert!(p.outgoing_link(NetworkId(1)).is_some());
        assert!(p.outgoing_link(NetworkId(2)).is_none());
        drop(link);
        assert!(p.outgoing_link(NetworkId(1)).is_none());
    }
}
