//! One interoperability network session.
//!
//! [`NetIo`] keeps two NIB tables in step with the executive:
//!
//! - **Input.** [`input_frame()`](NetIo::input_frame) lets the binding
//!   feed received entity states into the input table, drops NIBs that
//!   timed out or were flagged for removal, then creates proxy players for
//!   new NIBs and drives existing proxies by dead reckoning.
//! - **Output.** [`output_frame()`](NetIo::output_frame) reconciles the
//!   output table against the executive's current player list and
//!   publishes each entity through the binding.
//!
//! Removal on either side is deferred through `DeleteRequest`. A dropped
//! input NIB flags its proxy, which the executive removes at its next
//! maintenance pass. An output NIB whose player stopped qualifying is
//! flagged on one pass, gets its removal message on that same pass, and
//! is only dropped by the next pass's compaction.
//!
//! Binding hooks are always called with no table lock held.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use simexec_core::{
    FederateName, Kinematics, NetworkId, NetworkLink, Player, PlayerId, PlayerMode,
};
use simexec_engine::Simulation;

use crate::binding::NetworkBinding;
use crate::config::NetIoConfig;
use crate::dead_reckoning::DrAlgorithm;
use crate::entity_type::EntityType;
use crate::error::{NetConfigError, NetError};
use crate::nib::{IoType, Nib, NibInit};
use crate::nib_table::NibTable;
use crate::ntm::NtmTree;

/// A received entity-state message, decoded by the binding.
#[derive(Clone, Debug)]
pub struct EntityStateUpdate {
    /// Remote player ID.
    pub player_id: PlayerId,
    /// Owning federate.
    pub federate: FederateName,
    /// Entity marking; defaults to `"{federate}.{id}"`.
    pub name: Option<Arc<str>>,
    /// Network entity type.
    pub entity_type: EntityType,
    /// Remote mode. `DeleteRequest` removes the entity.
    pub mode: PlayerMode,
    /// State at the time of the message.
    pub kinematics: Kinematics,
    /// Algorithm the sender uses.
    pub dr_algorithm: DrAlgorithm,
}

/// Per-session counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetStats {
    /// Entity-state messages accepted.
    pub updates_received: u64,
    /// Input NIBs created.
    pub input_nibs_created: u64,
    /// Input NIBs dropped for age.
    pub input_timeouts: u64,
    /// Input NIBs dropped for any reason.
    pub input_nibs_removed: u64,
    /// Proxy players queued with the executive.
    pub proxies_created: u64,
    /// Queued proxies the executive refused (duplicate name or key);
    /// each is retried.
    pub proxies_refused: u64,
    /// Proxy creation skipped by the range filter.
    pub range_filtered: u64,
    /// Input NIBs with no matching template.
    pub template_misses: u64,
    /// Output NIBs created.
    pub output_nibs_created: u64,
    /// Output NIBs dropped after their grace pass.
    pub output_nibs_removed: u64,
    /// Output NIB creations deferred by the per-pass cap.
    pub outputs_deferred: u64,
    /// Entity-state messages published.
    pub entity_updates: u64,
    /// Fire notifications published.
    pub fire_notifications: u64,
    /// Detonation notifications published.
    pub detonations: u64,
    /// Insertions refused because a table was full.
    pub table_full: u64,
}

/// One network session.
pub struct NetIo {
    config: NetIoConfig,
    federate: FederateName,
    sim: Arc<Simulation>,
    binding: Arc<dyn NetworkBinding>,
    ntm: RwLock<NtmTree>,
    inputs: Mutex<NibTable>,
    outputs: Mutex<NibTable>,
    stats: Mutex<NetStats>,
    initialized: AtomicBool,
}

// Compile-time assertion: sessions are driven from the station's network
// thread while the executive runs elsewhere.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<NetIo>();
};

impl NetIo {
    /// Validate `config` and create a session bound to `sim`.
    pub fn new(
        config: NetIoConfig,
        sim: Arc<Simulation>,
        binding: Arc<dyn NetworkBinding>,
        ntm: NtmTree,
    ) -> Result<Self, NetConfigError> {
        config.validate()?;
        Ok(Self {
            federate: FederateName::new(config.federate_name.trim()),
            inputs: Mutex::new(NibTable::new(IoType::Input, config.max_input_nibs)),
            outputs: Mutex::new(NibTable::new(IoType::Output, config.max_output_nibs)),
            config,
            sim,
            binding,
            ntm: RwLock::new(ntm),
            stats: Mutex::new(NetStats::default()),
            initialized: AtomicBool::new(false),
        })
    }

    /// Open the connection through the binding.
    pub fn init_network(&self) -> Result<(), NetError> {
        self.binding.init_network(self)?;
        self.initialized.store(true, Ordering::Release);
        tracing::info!(
            binding = self.binding.name(),
            network = %self.config.network_id,
            federation = %self.config.federation_name,
            federate = %self.federate,
            "network session initialised"
        );
        Ok(())
    }

    /// Whether [`init_network()`](NetIo::init_network) succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    // ── Accessors ─────────────────────────────────────────────────

    /// Session configuration.
    pub fn config(&self) -> &NetIoConfig {
        &self.config
    }

    /// Session ID.
    pub fn network_id(&self) -> NetworkId {
        self.config.network_id
    }

    /// Federate this simulation publishes under.
    pub fn federate(&self) -> &FederateName {
        &self.federate
    }

    /// The executive this session feeds.
    pub fn simulation(&self) -> &Arc<Simulation> {
        &self.sim
    }

    /// The protocol binding.
    pub fn binding(&self) -> &Arc<dyn NetworkBinding> {
        &self.binding
    }

    /// Entity-type mapper.
    pub fn ntm(&self) -> RwLockReadGuard<'_, NtmTree> {
        self.ntm.read()
    }

    /// Mutable entity-type mapper.
    pub fn ntm_mut(&self) -> RwLockWriteGuard<'_, NtmTree> {
        self.ntm.write()
    }

    /// Copy of the session counters.
    pub fn stats(&self) -> NetStats {
        self.stats.lock().clone()
    }

    /// Input NIBs in key order.
    pub fn input_nibs(&self) -> Vec<Arc<Nib>> {
        self.inputs.lock().snapshot()
    }

    /// Output NIBs in key order.
    pub fn output_nibs(&self) -> Vec<Arc<Nib>> {
        self.outputs.lock().snapshot()
    }

    /// Find an input NIB.
    pub fn find_input_nib(&self, id: PlayerId, federate: &FederateName) -> Option<Arc<Nib>> {
        self.inputs.lock().find(id, federate).cloned()
    }

    /// Find an output NIB.
    pub fn find_output_nib(&self, id: PlayerId, federate: &FederateName) -> Option<Arc<Nib>> {
        self.outputs.lock().find(id, federate).cloned()
    }

    fn new_nib(&self, init: NibInit, now: f64) -> Arc<Nib> {
        let nib = Arc::new(self.binding.nib_factory(init));
        nib.touch(now);
        nib
    }

    // ── Input ─────────────────────────────────────────────────────

    /// One input pass: binding receive, cleanup, then proxy processing.
    pub fn input_frame(&self) {
        if !self.config.input_enabled {
            return;
        }
        self.binding.net_input_handler(self);
        self.cleanup_input_list();
        self.process_input_list();
    }

    /// Accept a decoded entity-state message. Finds or creates the input
    /// NIB, refreshes its reference state and age, and mirrors the remote
    /// mode.
    pub fn receive_entity_state(&self, update: EntityStateUpdate) -> Result<Arc<Nib>, NetError> {
        if !self.config.input_enabled {
            return Err(NetError::Disabled(IoType::Input));
        }
        let now = self.sim.exec_time();
        let existing = self.find_input_nib(update.player_id, &update.federate);
        let nib = match existing {
            Some(nib) => nib,
            None => {
                let name = update
                    .name
                    .clone()
                    .unwrap_or_else(|| Arc::from(format!("{}.{}", update.federate, update.player_id)));
                let nib = self.new_nib(
                    NibInit {
                        io_type: IoType::Input,
                        network_id: self.network_id(),
                        player_id: update.player_id,
                        federate: update.federate.clone(),
                        name,
                        entity_type: update.entity_type,
                        dr_algorithm: update.dr_algorithm,
                        thresholds: self.config.thresholds,
                    },
                    now,
                );
                self.inputs.lock().insert(Arc::clone(&nib)).inspect_err(|err| {
                    if matches!(err, NetError::TableFull { .. }) {
                        self.stats.lock().table_full += 1;
                        tracing::warn!(%err, "remote entity dropped");
                    }
                })?;
                self.stats.lock().input_nibs_created += 1;
                tracing::debug!(federate = %update.federate, player = %update.player_id, "input NIB created");
                nib
            }
        };
        nib.set_entity_type(update.entity_type);
        nib.record_update(update.kinematics, update.dr_algorithm, now);
        if update.mode == PlayerMode::DeleteRequest {
            nib.request_delete();
        } else {
            nib.set_mode(update.mode);
        }
        self.stats.lock().updates_received += 1;
        Ok(nib)
    }

    /// Drop input NIBs that timed out or were flagged for removal, and
    /// flag their proxies. Returns the number dropped.
    pub fn cleanup_input_list(&self) -> usize {
        let now = self.sim.exec_time();
        let max_age = self.config.max_age;
        let mut timeouts = 0u64;
        let removed = self.inputs.lock().retain(|nib| {
            let timed_out = nib.is_timed_out(now, max_age);
            timeouts += u64::from(timed_out);
            let flagged = nib.is_removal_requested()
                || nib.player().is_some_and(|p| p.is_removal_requested());
            !(timed_out || flagged)
        });
        for nib in &removed {
            if let Some(player) = nib.player() {
                player.request_delete();
                player.clear_incoming_link();
            }
            nib.set_player(None);
            tracing::debug!(federate = %nib.federate(), player = %nib.player_id(), "input NIB dropped");
        }
        let mut stats = self.stats.lock();
        stats.input_timeouts += timeouts;
        stats.input_nibs_removed += removed.len() as u64;
        removed.len()
    }

    /// Create proxies for unchecked NIBs, then drive existing proxies by
    /// dead reckoning and mirror the remote mode.
    pub fn process_input_list(&self) {
        let now = self.sim.exec_time();
        for nib in self.input_nibs() {
            match nib.player() {
                None => {
                    if !nib.is_entity_type_checked() {
                        self.create_proxy_player(&nib);
                    }
                }
                Some(player) if self.proxy_refused(&nib, &player) => {
                    player.clear_incoming_link();
                    nib.set_player(None);
                    nib.set_entity_type_checked(false, false);
                    self.stats.lock().proxies_refused += 1;
                    tracing::debug!(federate = %nib.federate(), player = %nib.player_id(), "proxy player refused by the executive; retrying");
                    self.create_proxy_player(&nib);
                }
                Some(player) => {
                    player.set_kinematics(nib.extrapolated(now));
                    let mode = nib.mode();
                    if player.mode() != mode {
                        if let Err(err) = player.set_mode(mode) {
                            tracing::trace!(%err, player = %player.key(), "proxy mode not mirrored");
                        }
                    }
                }
            }
        }
    }

    /// Whether the executive ran a maintenance pass after `proxy` was
    /// queued without ever attaching it.
    fn proxy_refused(&self, nib: &Nib, proxy: &Player) -> bool {
        !proxy.is_attached()
            && !proxy.is_removal_requested()
            && self.sim.maintenance_passes() > nib.proxy_queued_at()
    }

    /// Spawn a proxy for `nib` from its entity-type template and queue it
    /// with the executive.
    ///
    /// A range-filtered NIB stays unchecked and is retried on later
    /// passes. A template miss marks the NIB checked and invalid, so no
    /// lookup is repeated for it.
    pub fn create_proxy_player(&self, nib: &Arc<Nib>) -> Option<Arc<Player>> {
        let now = self.sim.exec_time();
        let kinematics = nib.extrapolated(now);

        if self.config.max_entity_range > 0.0 {
            if let Some(ownship) = self.sim.ownship() {
                let range = (kinematics.position - ownship.kinematics().position).length();
                if range > self.config.max_entity_range {
                    self.stats.lock().range_filtered += 1;
                    tracing::debug!(federate = %nib.federate(), player = %nib.player_id(), range, "remote entity out of range");
                    return None;
                }
            }
        }

        let entity_type = nib.entity_type();
        let template = self.ntm.read().find_template(&entity_type).cloned();
        let Some(template) = template else {
            nib.set_entity_type_checked(true, false);
            self.stats.lock().template_misses += 1;
            tracing::debug!(federate = %nib.federate(), player = %nib.player_id(), %entity_type, "no template for entity type");
            return None;
        };
        nib.set_entity_type_checked(true, true);

        let name = format!("{}.{}", nib.federate(), nib.player_id());
        let proxy = Arc::new(template.proxy_from_template(
            &name,
            nib.player_id(),
            self.network_id(),
            nib.federate().clone(),
            kinematics,
        ));
        let link: Arc<dyn NetworkLink> = Arc::clone(nib) as Arc<dyn NetworkLink>;
        proxy.set_incoming_link(Arc::downgrade(&link));

        if let Err(err) = self.sim.add_new_player(&name, Arc::clone(&proxy)) {
            tracing::warn!(%err, %name, "proxy player not queued");
            nib.set_entity_type_checked(false, false);
            return None;
        }
        nib.mark_proxy_queued(self.sim.maintenance_passes());
        nib.set_player(Some(Arc::clone(&proxy)));
        self.stats.lock().proxies_created += 1;
        tracing::debug!(%name, template = %template.name(), "proxy player created");
        Some(proxy)
    }

    // ── Output ────────────────────────────────────────────────────

    /// One output pass: reconcile, then publish.
    pub fn output_frame(&self) {
        self.update_output_list();
        self.process_output_list();
    }

    /// Reconcile the output table against the executive's player list.
    ///
    /// 1. Drop NIBs flagged on the previous pass; clear `checked` on the
    ///    rest.
    /// 2. Mark each qualifying player's NIB checked, creating missing ones
    ///    up to `max_new_outgoing` per pass.
    /// 3. Flag every NIB left unchecked.
    pub fn update_output_list(&self) {
        let now = self.sim.exec_time();
        let network_id = self.network_id();

        let removed = {
            let mut outputs = self.outputs.lock();
            let removed = outputs.retain(|nib| !nib.is_removal_requested());
            for nib in outputs.iter() {
                nib.set_checked(false);
            }
            removed
        };
        for nib in &removed {
            if let Some(player) = nib.player() {
                player.clear_outgoing_link(network_id);
            }
            nib.set_player(None);
            tracing::debug!(federate = %nib.federate(), player = %nib.player_id(), "output NIB dropped");
        }
        self.stats.lock().output_nibs_removed += removed.len() as u64;

        if self.config.output_enabled {
            let list = self.sim.players();
            let mut created = 0usize;
            for entry in list.iter() {
                let player = &entry.player;
                let federate = if player.is_local() {
                    self.federate.clone()
                } else {
                    // Locals sort first; nothing past here qualifies.
                    if !self.config.relay_enabled {
                        break;
                    }
                    match player.federate() {
                        Some(f) if player.network_id() != network_id => f.clone(),
                        _ => continue,
                    }
                };
                if !player.is_net_output_enabled() {
                    continue;
                }
                let id = player.id();
                if let Some(nib) = self.find_output_nib(id, &federate) {
                    // A detonated weapon stays published until its
                    // detonation has gone out.
                    let detonating =
                        player.mode() == PlayerMode::Detonated && !nib.detonation_sent();
                    if player.is_updatable() || detonating {
                        if nib.player().is_none_or(|p| !Arc::ptr_eq(&p, player)) {
                            nib.set_player(Some(Arc::clone(player)));
                        }
                        nib.set_checked(true);
                    }
                    continue;
                }
                if !player.is_updatable() {
                    continue;
                }
                if created >= self.config.max_new_outgoing {
                    self.stats.lock().outputs_deferred += 1;
                    continue;
                }
                let entity_type = self.ntm.read().find_output(player);
                let nib = self.new_nib(
                    NibInit {
                        io_type: IoType::Output,
                        network_id,
                        player_id: id,
                        federate: federate.clone(),
                        name: Arc::clone(&entry.name),
                        entity_type: entity_type.unwrap_or_default(),
                        dr_algorithm: self.config.output_dr_algorithm,
                        thresholds: self.config.thresholds,
                    },
                    now,
                );
                nib.set_player(Some(Arc::clone(player)));
                nib.set_entity_type_checked(true, entity_type.is_some());
                nib.set_checked(true);
                if let Err(err) = self.outputs.lock().insert(Arc::clone(&nib)) {
                    self.stats.lock().table_full += 1;
                    tracing::warn!(%err, player = %player.key(), "player not published");
                    // The table stays full for the rest of the pass.
                    break;
                }
                let link: Arc<dyn NetworkLink> = Arc::clone(&nib) as Arc<dyn NetworkLink>;
                player.set_outgoing_link(network_id, Arc::downgrade(&link));
                if entity_type.is_none() {
                    tracing::debug!(player = %player.key(), type_name = player.type_name(), "no output entity type; not published");
                }
                created += 1;
                tracing::debug!(player = %player.key(), federate = %federate, "output NIB created");
            }
            self.stats.lock().output_nibs_created += created as u64;
        }

        for nib in self.output_nibs() {
            if !nib.is_checked() && !nib.is_removal_requested() {
                nib.request_delete();
                tracing::debug!(federate = %nib.federate(), player = %nib.player_id(), "output NIB flagged for removal");
            }
        }
    }

    /// Publish every output NIB.
    ///
    /// Flagged NIBs that were ever published get their one removal
    /// message. Live, type-valid NIBs publish detonation once, then the
    /// entity state when mode changed or a threshold was crossed, then any
    /// deferred fire notification, then per-system output.
    pub fn process_output_list(&self) {
        let now = self.sim.exec_time();
        for nib in self.output_nibs() {
            if nib.is_removal_requested() {
                // Only entities that were announced get a removal message.
                if nib.was_published() && nib.take_removal_notice() {
                    self.binding.remove_entity(self, &nib);
                }
                continue;
            }
            if !nib.is_entity_type_valid() {
                continue;
            }
            let Some(player) = nib.player() else {
                continue;
            };
            if player.is_removal_requested() {
                continue;
            }

            let previous = nib.mode();
            let mode = player.mode();
            let fired = player.is_weapon()
                && matches!(previous, PlayerMode::Inactive | PlayerMode::PreRelease)
                && mode == PlayerMode::Active;

            if mode == PlayerMode::Detonated && !nib.detonation_sent() {
                self.binding.detonation_notification(self, &nib, &player);
                nib.set_detonation_sent();
                self.stats.lock().detonations += 1;
            }

            nib.set_mode(mode);
            let kinematics = player.kinematics();
            let due = previous != mode || nib.update_due(&kinematics, now).is_some();
            if due && self.binding.entity_state_update(self, &nib, &player) {
                nib.record_update(kinematics, nib.dr_algorithm(), now);
                self.stats.lock().entity_updates += 1;
            }

            if fired {
                self.binding.fire_notification(self, &nib, &player);
                self.stats.lock().fire_notifications += 1;
            }

            self.binding.system_output(self, &nib, &player);
        }
    }

    /// Drop every NIB and flag every proxy this session created.
    pub fn clear(&self) {
        let inputs = self.inputs.lock().clear();
        for nib in &inputs {
            if let Some(player) = nib.player() {
                player.request_delete();
                player.clear_incoming_link();
            }
            nib.set_player(None);
        }
        let outputs = self.outputs.lock().clear();
        for nib in &outputs {
            if let Some(player) = nib.player() {
                player.clear_outgoing_link(self.network_id());
            }
            nib.set_player(None);
        }
        tracing::debug!(inputs = inputs.len(), outputs = outputs.len(), "network session cleared");
    }
}

impl std::fmt::Debug for NetIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetIo")
            .field("binding", &self.binding.name())
            .field("network_id", &self.config.network_id)
            .field("federate", &self.federate)
            .field("inputs", &self.inputs.lock().len())
            .field("outputs", &self.outputs.lock().len())
            .finish()
    }
}
