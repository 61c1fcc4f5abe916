//! Reusable player fixtures and tracing models.
//!
//! - [`PhaseTracer`] logs the start and end of every time-critical call so
//!   tests can check the phase barrier.
//! - [`CountingModel`] counts calls through shared counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use simexec_core::{
    FederateName, FrameContext, Kinematics, Phase, Player, PlayerId, PlayerMode, PlayerModel,
};
use simexec_net::{DrAlgorithm, EntityStateUpdate, EntityType};

/// A local player with an explicit ID and the default dynamics.
pub fn local_player(name: &str, id: u16) -> Player {
    Player::builder(name).id(id).build()
}

/// An active entity-state message for (`federate`, `id`).
pub fn remote_update(id: u16, federate: &str, entity_type: EntityType) -> EntityStateUpdate {
    EntityStateUpdate {
        player_id: PlayerId(id),
        federate: FederateName::new(federate),
        name: None,
        entity_type,
        mode: PlayerMode::Active,
        kinematics: Kinematics::default(),
        dr_algorithm: DrAlgorithm::Fpw,
    }
}

// ── PhaseTracer ─────────────────────────────────────────────────────

/// One logged call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceEvent {
    pub player: PlayerId,
    pub exec_counter: u64,
    pub phase: Phase,
    /// Global order of the call's start.
    pub start: u64,
    /// Global order of the call's end.
    pub end: u64,
    /// Players visible in the snapshot.
    pub visible: usize,
    /// IDs of the snapshot's players, in list order.
    pub order: Vec<PlayerId>,
}

/// Shared log written by every [`PhaseTracer`] built from it.
#[derive(Default)]
pub struct TraceLog {
    clock: AtomicU64,
    events: Mutex<Vec<TraceEvent>>,
}

impl TraceLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Check that every call for counter `c + 1` started after every call
    /// for counter `c` ended.
    pub fn check_barriers(&self) -> Result<(), String> {
        let events = self.events();
        let Some(last) = events.iter().map(|e| e.exec_counter).max() else {
            return Ok(());
        };
        let first = events.iter().map(|e| e.exec_counter).min().unwrap_or(0);
        for c in first..last {
            let ended = events
                .iter()
                .filter(|e| e.exec_counter == c)
                .map(|e| e.end)
                .max();
            let started = events
                .iter()
                .filter(|e| e.exec_counter == c + 1)
                .map(|e| e.start)
                .min();
            if let (Some(ended), Some(started)) = (ended, started) {
                if started < ended {
                    return Err(format!(
                        "counter {} started at {started} before counter {c} ended at {ended}",
                        c + 1
                    ));
                }
            }
        }
        Ok(())
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::AcqRel)
    }
}

/// Model that logs each time-critical call to a [`TraceLog`].
#[derive(Clone)]
pub struct PhaseTracer {
    log: Arc<TraceLog>,
    spin: u32,
}

impl PhaseTracer {
    /// Tracer writing to `log`, spinning `spin` iterations per call to
    /// widen the window for overlap.
    pub fn new(log: &Arc<TraceLog>, spin: u32) -> Self {
        Self {
            log: Arc::clone(log),
            spin,
        }
    }
}

impl PlayerModel for PhaseTracer {
    fn name(&self) -> &str {
        "phase_tracer"
    }

    fn update_tc(&mut self, player: &Player, ctx: &FrameContext<'_>) {
        let start = self.log.tick();
        for _ in 0..self.spin {
            std::hint::spin_loop();
        }
        let end = self.log.tick();
        let order = (0..ctx.players.len())
            .filter_map(|i| ctx.players.player_at(i).map(|p| p.id()))
            .collect();
        self.log.events.lock().push(TraceEvent {
            player: player.id(),
            exec_counter: ctx.exec_counter,
            phase: ctx.phase,
            start,
            end,
            visible: ctx.players.len(),
            order,
        });
    }

    fn box_clone(&self) -> Box<dyn PlayerModel> {
        Box::new(self.clone())
    }
}

// ── CountingModel ──────────────────────────────────────────────────

/// Call counters shared by every clone of a [`CountingModel`].
#[derive(Default)]
pub struct Counts {
    pub tc: AtomicU64,
    pub data: AtomicU64,
    pub resets: AtomicU64,
    /// Sum of `dt` over time-critical calls, in microseconds.
    pub tc_dt_us: AtomicU64,
}

impl Counts {
    pub fn tc(&self) -> u64 {
        self.tc.load(Ordering::Acquire)
    }

    pub fn data(&self) -> u64 {
        self.data.load(Ordering::Acquire)
    }

    pub fn resets(&self) -> u64 {
        self.resets.load(Ordering::Acquire)
    }
}

/// Model that counts its calls.
#[derive(Clone, Default)]
pub struct CountingModel {
    pub counts: Arc<Counts>,
}

impl CountingModel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlayerModel for CountingModel {
    fn name(&self) -> &str {
        "counting"
    }

    fn update_tc(&mut self, _player: &Player, ctx: &FrameContext<'_>) {
        self.counts.tc.fetch_add(1, Ordering::AcqRel);
        self.counts
            .tc_dt_us
            .fetch_add((ctx.dt * 1e6).round() as u64, Ordering::AcqRel);
    }

    fn update_data(&mut self, _player: &Player, _ctx: &FrameContext<'_>) {
        self.counts.data.fetch_add(1, Ordering::AcqRel);
    }

    fn reset(&mut self, _player: &Player) {
        self.counts.resets.fetch_add(1, Ordering::AcqRel);
    }

    fn box_clone(&self) -> Box<dyn PlayerModel> {
        Box::new(self.clone())
    }
}
