//! The simulation executive.
//!
//! [`Simulation`] owns the authoritative player list and drives it
//! through time:
//!
//! - [`update_tc()`](Simulation::update_tc) runs one time-critical frame:
//!   four phases in strict order, each fanned out over the time-critical
//!   pool with a full barrier before the next phase starts.
//! - [`update_data()`](Simulation::update_data) runs one background pass:
//!   staged list maintenance first, then a single partitioned update.
//!
//! # Snapshots
//!
//! The active list lives behind an [`ArcSwap`]. Each frame or pass loads
//! the current `Arc<PlayerList>` once and hands it to every partition;
//! maintenance builds a fresh list and swaps it in. A published list is
//! never mutated, so in-flight readers keep a consistent view.
//!
//! # Thread ownership
//!
//! `update_tc()` and `update_data()` may run concurrently on different
//! threads. Each must only be called from one thread at a time; the
//! pools serialise overlapping calls of the same kind.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};

use simexec_core::{
    DataRecorder, FrameContext, NetworkId, Phase, Player, PlayerId, PlayerLookup, RecorderEvent,
    RecorderSample, Services,
};

use crate::clock::ExecClock;
use crate::config::{check_threads, resolve_threads, ConfigError, SimulationConfig, StartTime};
use crate::metrics::FrameMetrics;
use crate::new_player_queue::{NewPlayerQueue, PendingPlayer, QueueError};
use crate::partition;
use crate::player_list::{InsertRefused, PlayerList};
use crate::sync_thread::{SyncPool, WorkFn};

/// Frames per cycle.
pub const FRAMES_PER_CYCLE: u64 = 16;

const PHASES_PER_FRAME: u64 = Phase::COUNT as u64;
const PHASES_PER_CYCLE: u64 = FRAMES_PER_CYCLE * PHASES_PER_FRAME;

// ── Partition work ─────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pass {
    TimeCritical(Phase),
    Background,
}

/// One partition of one dispatch.
pub(crate) struct PassTask {
    list: Arc<PlayerList>,
    pass: Pass,
    dt: f64,
    exec_counter: u64,
    index: usize,
    count: usize,
}

fn run_partition(task: PassTask) {
    let phase = match task.pass {
        Pass::TimeCritical(p) => p,
        Pass::Background => Phase::Process,
    };
    let ctx = FrameContext {
        phase,
        dt: task.dt,
        exec_counter: task.exec_counter,
        players: &*task.list,
    };
    let entries = task.list.entries();
    for i in partition::indices(entries.len(), task.index, task.count) {
        let player = &entries[i].player;
        match task.pass {
            Pass::TimeCritical(_) => player.update_tc(&ctx),
            Pass::Background => player.update_data(&ctx),
        }
    }
}

fn dispatch(pool: Option<&mut SyncPool<PassTask>>, make: impl Fn(usize, usize) -> PassTask) {
    match pool {
        Some(pool) => pool.dispatch(make),
        None => run_partition(make(0, 1)),
    }
}

// ── Placement ──────────────────────────────────────────────────────

/// Insert a player into a list under construction, assigning a free
/// local ID when its own is unset or already taken. Logs and returns
/// `false` when the player must be refused.
fn place_player(list: &mut PlayerList, name: &Arc<str>, player: &Arc<Player>) -> bool {
    if player.is_removal_requested() {
        tracing::debug!(name = %name, "player flagged for removal before insertion; dropped");
        return false;
    }
    if list.contains_player(player) {
        tracing::warn!(name = %name, "player already listed; request ignored");
        return false;
    }
    if player.is_attached() {
        tracing::error!(name = %name, player = %player.key(), "player is attached to another executive; rejected");
        return false;
    }
    if list.contains_name(name) {
        let err = ConfigError::DuplicatePlayerName {
            name: name.to_string(),
        };
        tracing::error!(%err, "player rejected");
        return false;
    }
    if player.is_local() && (player.id().is_unset() || list.find_key(&player.key()).is_some()) {
        let Some(id) = list.next_free_local_id() else {
            tracing::error!(name = %name, "no free player id; player rejected");
            return false;
        };
        if !player.id().is_unset() {
            tracing::warn!(name = %name, requested = %player.id(), assigned = %id, "duplicate player id reassigned");
        }
        if let Err(err) = player.set_id(id) {
            tracing::error!(%err, "player id assignment failed");
            return false;
        }
    }
    match list.insert_sorted(Arc::clone(name), Arc::clone(player)) {
        Ok(_) => true,
        Err(InsertRefused::DuplicateKey) => {
            tracing::error!(name = %name, player = %player.key(), "duplicate player key; player rejected");
            false
        }
        Err(InsertRefused::DuplicateName) => false,
    }
}

// ── SimulationBuilder ──────────────────────────────────────────────

/// Configuration-loader input for a [`Simulation`].
#[derive(Default)]
pub struct SimulationBuilder {
    config: SimulationConfig,
    recorder: Option<Arc<dyn DataRecorder>>,
    players: Vec<(Arc<str>, Arc<Player>)>,
    ownship: Option<Arc<str>>,
}

impl SimulationBuilder {
    /// New builder with default configuration and no players.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executive configuration.
    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Data-recorder sink.
    pub fn recorder(mut self, recorder: Arc<dyn DataRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Add an original (configured) player.
    pub fn player(mut self, name: impl AsRef<str>, player: impl Into<Arc<Player>>) -> Self {
        self.players.push((Arc::from(name.as_ref()), player.into()));
        self
    }

    /// Name of the ownship player.
    pub fn ownship(mut self, name: impl AsRef<str>) -> Self {
        self.ownship = Some(Arc::from(name.as_ref()));
        self
    }

    /// Validate the configuration, build the original list, and reset.
    ///
    /// Players with explicit IDs are placed first; players with unset or
    /// colliding IDs then receive the lowest free IDs. Players with a
    /// duplicate name are logged and skipped.
    pub fn build(self) -> Result<Simulation, ConfigError> {
        self.config.validate()?;
        let mut original = PlayerList::with_capacity(self.players.len());
        let (explicit, deferred): (Vec<_>, Vec<_>) = self
            .players
            .into_iter()
            .partition(|(_, p)| !p.id().is_unset());
        for (name, player) in explicit.iter().chain(deferred.iter()) {
            place_player(&mut original, name, player);
        }

        let config = self.config;
        let sim = Simulation {
            services: Arc::new(Services::new(self.recorder)),
            original: RwLock::new(Arc::new(original)),
            players: ArcSwap::from_pointee(PlayerList::new()),
            queue: NewPlayerQueue::new(config.new_player_queue_capacity, config.queue_overflow),
            ids: crate::unique_id::UniqueIds::new(config.first_weapon_id),
            clock: Mutex::new(ExecClock::new(config.start_time, config.freeze_sim_time)),
            exec_counter: AtomicU64::new(0),
            maintenance_passes: AtomicU64::new(0),
            tc_pool: Mutex::new(None),
            bg_pool: Mutex::new(None),
            maintenance: Mutex::new(()),
            metrics: Mutex::new(FrameMetrics::default()),
            ownship: RwLock::new(self.ownship),
            shut_down: AtomicBool::new(false),
            config: RwLock::new(config),
        };
        sim.reset();
        Ok(sim)
    }
}

// ── Simulation ─────────────────────────────────────────────────────

/// The simulation executive.
pub struct Simulation {
    config: RwLock<SimulationConfig>,
    services: Arc<Services>,
    original: RwLock<Arc<PlayerList>>,
    players: ArcSwap<PlayerList>,
    queue: NewPlayerQueue,
    ids: crate::unique_id::UniqueIds,
    clock: Mutex<ExecClock>,
    exec_counter: AtomicU64,
    maintenance_passes: AtomicU64,
    tc_pool: Mutex<Option<SyncPool<PassTask>>>,
    bg_pool: Mutex<Option<SyncPool<PassTask>>>,
    maintenance: Mutex<()>,
    metrics: Mutex<FrameMetrics>,
    ownship: RwLock<Option<Arc<str>>>,
    shut_down: AtomicBool,
}

// Compile-time assertion: Simulation is shared across station threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Simulation>();
};

impl Simulation {
    /// Start building an executive.
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    // ── Lifecycle ─────────────────────────────────────────────────

    /// Restore the original list plus live network proxies, reset every
    /// local player, zero the counters and clocks, and (re)build the
    /// thread pools.
    pub fn reset(&self) {
        if self.is_shut_down() {
            return;
        }
        let _m = self.maintenance.lock();
        let cfg = self.config.read().clone();
        let current = self.players.load_full();
        let original = Arc::clone(&self.original.read());

        let mut next = PlayerList::with_capacity(original.len() + current.len());
        for e in original.iter() {
            if !e.player.is_removal_requested() {
                next.push_sorted(e.clone());
            }
        }
        for e in current.iter() {
            if e.player.is_proxy() && !e.player.is_removal_requested() {
                if let Err(refused) = next.insert_sorted(Arc::clone(&e.name), Arc::clone(&e.player)) {
                    tracing::warn!(player = %e.player.key(), ?refused, "network player dropped on reset");
                }
            }
        }
        for e in current.iter() {
            if !next.contains_player(&e.player) {
                self.services.record(
                    RecorderSample::new(RecorderEvent::PlayerRemoved).with_player(e.player.tag()),
                );
                e.player.detach();
            }
        }
        for e in next.iter() {
            e.player.attach(&self.services);
            e.player.reset();
        }
        let count = next.len();
        self.players.store(Arc::new(next));

        self.exec_counter.store(0, Ordering::Release);
        self.clock.lock().reset();
        self.services.set_exec_time(0.0);
        self.ids.reset(cfg.first_weapon_id);
        self.metrics.lock().reset();
        self.ensure_pools(&cfg);

        self.services
            .record(RecorderSample::new(RecorderEvent::ResetEvent));
        tracing::info!(
            players = count,
            tc_partitions = self.tc_partitions(),
            bg_partitions = self.bg_partitions(),
            "executive reset"
        );
    }

    fn ensure_pools(&self, cfg: &SimulationConfig) {
        let pools = [
            (&self.tc_pool, cfg.tc_threads, "simexec-tc-worker"),
            (&self.bg_pool, cfg.bg_threads, "simexec-bg-worker"),
        ];
        for (slot, requested, name) in pools {
            let partitions = resolve_threads(requested);
            if partitions < requested {
                tracing::warn!(pool = name, requested, partitions, "thread count clamped to host limit");
            }
            let mut slot = slot.lock();
            let pool = slot.get_or_insert_with(|| {
                let work: WorkFn<PassTask> = Arc::new(run_partition);
                SyncPool::new(name, work)
            });
            // A spawn failure is logged by the pool, which then stays
            // single-threaded.
            let _ = pool.resize(partitions);
        }
    }

    /// Stop the pools and refuse further insertions. Returns the number
    /// of worker threads joined. Idempotent.
    pub fn shutdown(&self) -> usize {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return 0;
        }
        self.queue.close();
        let mut joined = 0;
        for slot in [&self.tc_pool, &self.bg_pool] {
            if let Some(mut pool) = slot.lock().take() {
                joined += pool.shutdown();
            }
        }
        tracing::info!(workers_joined = joined, "executive shut down");
        joined
    }

    /// Whether [`shutdown()`](Simulation::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    // ── Time-critical path ────────────────────────────────────────

    /// Run one time-critical frame of `dt` seconds.
    ///
    /// Each phase receives `dt / 4`. No phase starts before every
    /// partition of the previous phase has finished.
    pub fn update_tc(&self, dt: f64) {
        if self.is_shut_down() {
            return;
        }
        let start = Instant::now();
        let exec_time = {
            let mut clock = self.clock.lock();
            clock.advance(dt);
            clock.exec_time()
        };
        self.services.set_exec_time(exec_time);

        let list = self.players.load_full();
        let phase_dt = dt / Phase::COUNT as f64;
        let mut pool = self.tc_pool.lock();
        for phase in Phase::ALL {
            let counter = self.exec_counter.load(Ordering::Acquire);
            dispatch(pool.as_mut(), |index, count| PassTask {
                list: Arc::clone(&list),
                pass: Pass::TimeCritical(phase),
                dt: phase_dt,
                exec_counter: counter,
                index,
                count,
            });
            self.exec_counter.fetch_add(1, Ordering::AcqRel);
        }
        drop(pool);

        let mut m = self.metrics.lock();
        m.frames += 1;
        m.tc_frame_us.sample(start.elapsed().as_secs_f64() * 1e6);
    }

    // ── Background path ───────────────────────────────────────────

    /// Run one background pass of `dt` seconds: list maintenance, then a
    /// single partitioned update of every player.
    pub fn update_data(&self, dt: f64) {
        if self.is_shut_down() {
            return;
        }
        let start = Instant::now();
        self.maintain_list();

        let list = self.players.load_full();
        let counter = self.exec_counter.load(Ordering::Acquire);
        {
            let mut pool = self.bg_pool.lock();
            dispatch(pool.as_mut(), |index, count| PassTask {
                list: Arc::clone(&list),
                pass: Pass::Background,
                dt,
                exec_counter: counter,
                index,
                count,
            });
        }

        let mut m = self.metrics.lock();
        m.background_passes += 1;
        m.queue_rejections = self.queue.rejections();
        m.bg_pass_us.sample(start.elapsed().as_secs_f64() * 1e6);
    }

    /// Apply staged removals and insertions, publishing a new list.
    ///
    /// Does nothing (and returns `false`) unless the new-player queue is
    /// non-empty or some listed player carries `DeleteRequest`.
    pub fn maintain_list(&self) -> bool {
        let _m = self.maintenance.lock();
        let current = self.players.load_full();
        let removing = current.iter().any(|e| e.player.is_removal_requested());
        if !removing && self.queue.is_empty() {
            return false;
        }
        let pending = self.queue.drain();
        let mut next = PlayerList::with_capacity(current.len() + pending.len());

        let mut removed = 0u64;
        for e in current.iter() {
            if e.player.is_removal_requested() {
                self.services.record(
                    RecorderSample::new(RecorderEvent::PlayerRemoved).with_player(e.player.tag()),
                );
                e.player.detach();
                removed += 1;
                tracing::debug!(player = %e.player.key(), name = %e.name, "player removed");
            } else {
                next.push_sorted(e.clone());
            }
        }

        let (mut added, mut rejected) = (0u64, 0u64);
        for PendingPlayer { name, player } in pending {
            if place_player(&mut next, &name, &player) {
                player.attach(&self.services);
                self.services
                    .record(RecorderSample::new(RecorderEvent::NewPlayer).with_player(player.tag()));
                tracing::debug!(player = %player.key(), name = %name, "player added");
                added += 1;
            } else {
                rejected += 1;
            }
        }

        let count = next.len();
        self.players.store(Arc::new(next));
        {
            let mut m = self.metrics.lock();
            m.players_added += added;
            m.players_removed += removed;
            m.players_rejected += rejected;
            m.list_swaps += 1;
        }
        self.maintenance_passes.fetch_add(1, Ordering::AcqRel);
        tracing::debug!(players = count, added, removed, rejected, "player list swapped");
        true
    }

    /// Queue a player for insertion at the next background pass.
    pub fn add_new_player(&self, name: &str, player: Arc<Player>) -> Result<(), QueueError> {
        if self.is_shut_down() {
            return Err(QueueError::ShuttingDown);
        }
        self.queue.push(name, player)
    }

    /// List-maintenance passes run since construction; not cleared by
    /// [`reset()`](Simulation::reset). A player queued while this reads
    /// `n` has been either placed (and attached) or refused once it
    /// exceeds `n`.
    pub fn maintenance_passes(&self) -> u64 {
        self.maintenance_passes.load(Ordering::Acquire)
    }

    /// Number of players waiting in the new-player queue.
    pub fn pending_players(&self) -> usize {
        self.queue.len()
    }

    // ── Player access ─────────────────────────────────────────────

    /// The current active list.
    pub fn players(&self) -> Arc<PlayerList> {
        self.players.load_full()
    }

    /// The configured original list.
    pub fn original_players(&self) -> Arc<PlayerList> {
        Arc::clone(&self.original.read())
    }

    /// Find a player in the current list.
    pub fn find_player(&self, id: PlayerId, network_id: NetworkId) -> Option<Arc<Player>> {
        let list = self.players.load();
        PlayerLookup::find(&**list, id, network_id).cloned()
    }

    /// Find a player in the current list by name.
    pub fn find_player_by_name(&self, name: &str) -> Option<Arc<Player>> {
        self.players
            .load()
            .find_by_name(name)
            .map(|e| Arc::clone(&e.player))
    }

    /// Select the ownship by name. Resolved against the current list on
    /// every [`ownship()`](Simulation::ownship) call.
    pub fn set_ownship(&self, name: &str) {
        *self.ownship.write() = Some(Arc::from(name));
    }

    /// The ownship, if one is selected and listed.
    pub fn ownship(&self) -> Option<Arc<Player>> {
        let name = self.ownship.read().clone()?;
        self.find_player_by_name(&name)
    }

    /// The executive's ambient services (recorder, exec time).
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// Forward a sample to the data recorder.
    pub fn record(&self, sample: RecorderSample) {
        self.services.record(sample);
    }

    // ── Counters ──────────────────────────────────────────────────

    /// `cycle * 64 + frame * 4 + phase`.
    pub fn exec_counter(&self) -> u64 {
        self.exec_counter.load(Ordering::Acquire)
    }

    /// Completed cycles.
    pub fn cycle(&self) -> u64 {
        self.exec_counter() / PHASES_PER_CYCLE
    }

    /// Frame within the current cycle, `0..16`.
    pub fn frame(&self) -> u32 {
        ((self.exec_counter() / PHASES_PER_FRAME) % FRAMES_PER_CYCLE) as u32
    }

    /// Phase currently being dispatched (`0` between frames).
    pub fn phase(&self) -> Phase {
        Phase::from_index((self.exec_counter() % PHASES_PER_FRAME) as u32)
    }

    /// Next general event ID.
    pub fn new_event_id(&self) -> u16 {
        self.ids.next_event()
    }

    /// Next weapon event ID.
    pub fn new_weapon_event_id(&self) -> u16 {
        self.ids.next_weapon_event()
    }

    /// Next released-weapon ID.
    pub fn new_released_weapon_id(&self) -> u16 {
        self.ids.next_released_weapon()
    }

    /// Copy of the timing metrics.
    pub fn metrics(&self) -> FrameMetrics {
        self.metrics.lock().clone()
    }

    // ── Clocks ────────────────────────────────────────────────────

    /// Executive seconds since the last reset.
    pub fn exec_time(&self) -> f64 {
        self.clock.lock().exec_time()
    }

    /// Simulated seconds past midnight UTC.
    pub fn sim_time_of_day(&self) -> f64 {
        self.clock.lock().sim_time_of_day()
    }

    /// Simulated day of the year.
    pub fn sim_day_of_year(&self) -> u32 {
        self.clock.lock().sim_day_of_year()
    }

    /// Simulated seconds since the Unix epoch.
    pub fn sim_unix_time(&self) -> f64 {
        self.clock.lock().sim_unix_time()
    }

    /// Freeze or unfreeze simulated time.
    pub fn freeze(&self, frozen: bool) {
        self.config.write().freeze_sim_time = frozen;
        self.clock.lock().set_frozen(frozen);
    }

    /// Whether simulated time is frozen.
    pub fn is_frozen(&self) -> bool {
        self.clock.lock().is_frozen()
    }

    // ── Runtime configuration ─────────────────────────────────────

    /// Requested time-critical partitions; applied at the next reset.
    pub fn set_tc_threads(&self, requested: usize) -> Result<(), ConfigError> {
        check_threads(requested).inspect_err(|err| tracing::error!(%err, "time-critical thread count rejected"))?;
        self.config.write().tc_threads = requested;
        Ok(())
    }

    /// Requested background partitions; applied at the next reset.
    pub fn set_bg_threads(&self, requested: usize) -> Result<(), ConfigError> {
        check_threads(requested).inspect_err(|err| tracing::error!(%err, "background thread count rejected"))?;
        self.config.write().bg_threads = requested;
        Ok(())
    }

    /// Initial simulated date/time; applied at the next reset.
    pub fn set_start_time(&self, start: StartTime) -> Result<(), ConfigError> {
        start
            .validate()
            .inspect_err(|err| tracing::error!(%err, "start time rejected"))?;
        self.config.write().start_time = start;
        self.clock.lock().set_start(start);
        Ok(())
    }

    /// Released-weapon ID floor; applied at the next reset.
    pub fn set_first_weapon_id(&self, floor: u16) -> Result<(), ConfigError> {
        if floor == 0 {
            let err = ConfigError::InvalidWeaponIdFloor { value: floor };
            tracing::error!(%err, "weapon id floor rejected");
            return Err(err);
        }
        self.config.write().first_weapon_id = floor;
        Ok(())
    }

    /// Copy of the current configuration.
    pub fn config(&self) -> SimulationConfig {
        self.config.read().clone()
    }

    /// Partitions used by the time-critical pool.
    ///
    /// Blocks while a frame is being dispatched.
    pub fn tc_partitions(&self) -> usize {
        self.tc_pool.lock().as_ref().map_or(1, |p| p.partitions())
    }

    /// Partitions used by the background pool.
    pub fn bg_partitions(&self) -> usize {
        self.bg_pool.lock().as_ref().map_or(1, |p| p.partitions())
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("players", &self.players.load().len())
            .field("exec_counter", &self.exec_counter())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simexec_core::{FederateName, Kinematics, PlayerMode, PlayerModel, Vec3};

    struct Sink(Mutex<Vec<RecorderSample>>);

    impl DataRecorder for Sink {
        fn record(&self, sample: RecorderSample) {
            self.0.lock().push(sample);
        }
    }

    impl Sink {
        fn events(&self, kind: RecorderEvent) -> Vec<RecorderSample> {
            self.0
                .lock()
                .iter()
                .filter(|s| s.event == kind)
                .cloned()
                .collect()
        }
    }

    #[derive(Clone)]
    struct Counter(Arc<AtomicU64>, Arc<AtomicU64>);

    impl PlayerModel for Counter {
        fn name(&self) -> &str {
            "counter"
        }
        fn update_tc(&mut self, _: &Player, _: &FrameContext<'_>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn update_data(&mut self, _: &Player, _: &FrameContext<'_>) {
            self.1.fetch_add(1, Ordering::SeqCst);
        }
        fn box_clone(&self) -> Box<dyn PlayerModel> {
            Box::new(self.clone())
        }
    }

    fn sim_with(ids: &[u16]) -> (Simulation, Arc<Sink>) {
        let sink = Arc::new(Sink(Mutex::new(Vec::new())));
        let mut b = Simulation::builder().recorder(sink.clone());
        for &id in ids {
            b = b.player(format!("p{id}"), Player::builder(format!("p{id}")).id(id).build());
        }
        (b.build().unwrap(), sink)
    }

    fn ids(sim: &Simulation) -> Vec<String> {
        sim.players().keys().iter().map(|k| k.to_string()).collect()
    }

    fn proxy(fed: &str, id: u16) -> Arc<Player> {
        let template = Player::builder("template").build();
        Arc::new(template.proxy_from_template(
            format!("{fed}{id}"),
            PlayerId(id),
            NetworkId(1),
            FederateName::new(fed),
            Kinematics::default(),
        ))
    }

    #[test]
    fn build_attaches_and_sorts_originals() {
        let (sim, _) = sim_with(&[3, 1, 2]);
        assert_eq!(ids(&sim), vec!["1", "2", "3"]);
        assert!(sim.players().iter().all(|e| e.player.is_attached()));
        assert_eq!(sim.original_players().len(), 3);
    }

    #[test]
    fn unset_and_duplicate_ids_are_assigned() {
        let sim = Simulation::builder()
            .player("a", Player::builder("a").build())
            .player("b", Player::builder("b").id(1).build())
            .player("c", Player::builder("c").id(1).build())
            .build()
            .unwrap();
        assert_eq!(ids(&sim), vec!["1", "2", "3"]);
        assert_eq!(sim.find_player_by_name("b").unwrap().id(), PlayerId(1));
    }

    #[test]
    fn duplicate_names_skipped() {
        let sim = Simulation::builder()
            .player("a", Player::builder("a").id(1).build())
            .player("a", Player::builder("a").id(2).build())
            .build()
            .unwrap();
        assert_eq!(ids(&sim), vec!["1"]);
    }

    #[test]
    fn invalid_config_refused() {
        let cfg = SimulationConfig {
            tc_threads: 0,
            ..SimulationConfig::default()
        };
        assert!(Simulation::builder().config(cfg).build().is_err());
    }

    #[test]
    fn frame_counter_rolls_into_cycles() {
        let (sim, _) = sim_with(&[1]);
        for _ in 0..FRAMES_PER_CYCLE {
            sim.update_tc(0.02);
            assert_eq!(
                sim.exec_counter(),
                sim.cycle() * 64 + u64::from(sim.frame()) * 4 + u64::from(sim.phase().index())
            );
        }
        assert_eq!((sim.cycle(), sim.frame(), sim.phase()), (1, 0, Phase::Dynamics));
        for _ in 0..(3 * FRAMES_PER_CYCLE) {
            sim.update_tc(0.02);
        }
        // 64 frames = 256 phases.
        assert_eq!(sim.exec_counter(), 256);
        assert_eq!((sim.cycle(), sim.frame()), (4, 0));
    }

    #[test]
    fn only_updatable_players_are_updated() {
        let tc = Arc::new(AtomicU64::new(0));
        let bg = Arc::new(AtomicU64::new(0));
        let model = || Box::new(Counter(Arc::clone(&tc), Arc::clone(&bg)));
        let sim = Simulation::builder()
            .player("on", Player::builder("on").id(1).model(model()).build())
            .player(
                "off",
                Player::builder("off")
                    .id(2)
                    .init_mode(PlayerMode::Inactive)
                    .model(model())
                    .build(),
            )
            .build()
            .unwrap();
        sim.update_tc(0.04);
        sim.update_data(0.1);
        assert_eq!(tc.load(Ordering::SeqCst), 4);
        assert_eq!(bg.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn phase_dt_is_quarter_frame() {
        let p = Player::builder("mover")
            .id(1)
            .kinematics(Kinematics {
                velocity: Vec3::new(10.0, 0.0, 0.0),
                ..Kinematics::default()
            })
            .build();
        let sim = Simulation::builder().player("mover", p).build().unwrap();
        sim.update_tc(0.4);
        // Dynamics runs in phase 0 only, with dt / 4.
        let x = sim.find_player_by_name("mover").unwrap().kinematics().position.x();
        assert!((x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn maintenance_only_when_needed() {
        let (sim, _) = sim_with(&[1, 2]);
        let before = sim.players();
        sim.update_data(0.1);
        assert!(Arc::ptr_eq(&before, &sim.players()));
        assert_eq!(sim.metrics().list_swaps, 0);
        assert_eq!(sim.maintenance_passes(), 0);
    }

    #[test]
    fn maintenance_passes_survive_reset() {
        let (sim, _) = sim_with(&[1]);
        sim.add_new_player("late", Player::builder("late").shared()).unwrap();
        sim.update_data(0.1);
        assert_eq!(sim.maintenance_passes(), 1);
        sim.reset();
        assert_eq!(sim.maintenance_passes(), 1);
    }

    #[test]
    fn add_and_remove_through_background_pass() {
        let (sim, sink) = sim_with(&[1, 2, 3]);
        sim.add_new_player("B5", proxy("B", 5)).unwrap();
        sim.add_new_player("new", Player::builder("new").shared()).unwrap();
        assert_eq!(ids(&sim), vec!["1", "2", "3"]);
        sim.update_data(0.1);
        assert_eq!(ids(&sim), vec!["1", "2", "3", "4", "(B,5)"]);
        assert_eq!(sink.events(RecorderEvent::NewPlayer).len(), 2);

        sim.find_player(PlayerId(2), NetworkId::LOCAL)
            .unwrap()
            .request_delete();
        let removed = sim.find_player(PlayerId(2), NetworkId::LOCAL).unwrap();
        sim.update_data(0.1);
        assert_eq!(ids(&sim), vec!["1", "3", "4", "(B,5)"]);
        assert!(!removed.is_attached());
        let samples = sink.events(RecorderEvent::PlayerRemoved);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].players[0].id, PlayerId(2));
    }

    #[test]
    fn snapshot_held_by_reader_is_unchanged() {
        let (sim, _) = sim_with(&[1, 2]);
        let held = sim.players();
        sim.add_new_player("x", Player::builder("x").id(9).shared()).unwrap();
        held.entries()[0].player.request_delete();
        sim.update_data(0.1);
        assert_eq!(
            held.keys().iter().map(|k| k.to_string()).collect::<Vec<_>>(),
            vec!["1", "2"]
        );
        assert_eq!(ids(&sim), vec!["2", "9"]);
    }

    #[test]
    fn reset_restores_originals_and_keeps_proxies() {
        let (sim, _) = sim_with(&[1, 2]);
        sim.add_new_player("B5", proxy("B", 5)).unwrap();
        sim.add_new_player("extra", Player::builder("extra").id(7).shared()).unwrap();
        sim.update_data(0.1);
        let p1 = sim.find_player(PlayerId(1), NetworkId::LOCAL).unwrap();
        p1.set_mode(PlayerMode::Killed).unwrap();
        sim.update_tc(0.02);
        sim.reset();
        assert_eq!(ids(&sim), vec!["1", "2", "(B,5)"]);
        assert!(p1.is_active());
        assert_eq!(sim.exec_counter(), 0);
    }

    #[test]
    fn id_generators_follow_floor() {
        let cfg = SimulationConfig {
            first_weapon_id: 200,
            ..SimulationConfig::default()
        };
        let sim = Simulation::builder().config(cfg).build().unwrap();
        assert_eq!(sim.new_event_id(), 1);
        assert_eq!(sim.new_weapon_event_id(), 1);
        assert_eq!(sim.new_released_weapon_id(), 200);
        assert_eq!(sim.new_released_weapon_id(), 201);
    }

    #[test]
    fn rejected_thread_count_keeps_prior_value() {
        let (sim, _) = sim_with(&[]);
        sim.set_tc_threads(2).unwrap();
        assert!(sim.set_tc_threads(0).is_err());
        assert_eq!(sim.config().tc_threads, 2);
    }

    #[test]
    fn ownship_resolves_by_name() {
        let sim = Simulation::builder()
            .player("lead", Player::builder("lead").id(1).build())
            .ownship("lead")
            .build()
            .unwrap();
        assert_eq!(sim.ownship().unwrap().id(), PlayerId(1));
        sim.set_ownship("nobody");
        assert!(sim.ownship().is_none());
    }

    #[test]
    fn shutdown_refuses_new_players() {
        let (sim, _) = sim_with(&[1]);
        sim.shutdown();
        assert_eq!(
            sim.add_new_player("late", Player::builder("late").shared()),
            Err(QueueError::ShuttingDown)
        );
        assert_eq!(sim.shutdown(), 0);
    }

    #[test]
    fn multi_partition_frames_update_everyone() {
        let tc = Arc::new(AtomicU64::new(0));
        let bg = Arc::new(AtomicU64::new(0));
        let cfg = SimulationConfig {
            tc_threads: 4,
            bg_threads: 3,
            ..SimulationConfig::default()
        };
        let mut b = Simulation::builder().config(cfg);
        for id in 1..=10u16 {
            b = b.player(
                format!("p{id}"),
                Player::builder(format!("p{id}"))
                    .id(id)
                    .model(Box::new(Counter(Arc::clone(&tc), Arc::clone(&bg))))
                    .build(),
            );
        }
        let sim = b.build().unwrap();
        for _ in 0..5 {
            sim.update_tc(0.02);
            sim.update_data(0.1);
        }
        assert_eq!(tc.load(Ordering::SeqCst), 10 * 4 * 5);
        assert_eq!(bg.load(Ordering::SeqCst), 10 * 5);
    }
}
