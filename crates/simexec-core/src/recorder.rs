//! Data-recorder sink contract and the executive's ambient services.
//!
//! The executive emits discrete samples (new player, removal, kill, ...)
//! to an opaque [`DataRecorder`]. The core never interprets them further.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::id::{FederateName, NetworkId, PlayerId, PlayerKey};

/// Kind of a recorded event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecorderEvent {
    /// A player joined the active list.
    NewPlayer,
    /// A player was removed from the active list.
    PlayerRemoved,
    /// A player was killed.
    PlayerKilled,
    /// Two players collided.
    PlayerCollision,
    /// A player crashed.
    PlayerCrash,
    /// A player took damage.
    PlayerDamaged,
    /// A weapon left its launcher.
    WeaponReleased,
    /// A weapon detonated.
    WeaponDetonation,
    /// The executive was reset.
    ResetEvent,
}

/// Identity of a player captured at sampling time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerTag {
    /// Player ID.
    pub id: PlayerId,
    /// Owning network scope.
    pub network_id: NetworkId,
    /// Owning federate for remote players.
    pub federate: Option<FederateName>,
    /// Display name.
    pub name: Arc<str>,
}

impl PlayerTag {
    /// The sort key this tag corresponds to.
    pub fn key(&self) -> PlayerKey {
        PlayerKey {
            network_id: self.network_id,
            federate: self.federate.clone(),
            id: self.id,
        }
    }
}

/// A single recorder sample: event kind plus up to four related players
/// and up to four numeric values.
#[derive(Clone, Debug)]
pub struct RecorderSample {
    /// What happened.
    pub event: RecorderEvent,
    /// Related players (subject first).
    pub players: SmallVec<[PlayerTag; 4]>,
    /// Event-specific values.
    pub values: SmallVec<[f64; 4]>,
    /// Executive time (seconds) when the sample was taken.
    pub exec_time: f64,
}

impl RecorderSample {
    /// New sample with no related players or values.
    pub fn new(event: RecorderEvent) -> Self {
        Self {
            event,
            players: SmallVec::new(),
            values: SmallVec::new(),
            exec_time: 0.0,
        }
    }

    /// Append a related player. Players past the fourth are dropped.
    pub fn with_player(mut self, tag: PlayerTag) -> Self {
        if self.players.len() < 4 {
            self.players.push(tag);
        }
        self
    }

    /// Append a value. Values past the fourth are dropped.
    pub fn with_value(mut self, v: f64) -> Self {
        if self.values.len() < 4 {
            self.values.push(v);
        }
        self
    }
}

/// Opaque sink for recorder samples.
pub trait DataRecorder: Send + Sync {
    /// Record one sample. Called from any executive thread.
    fn record(&self, sample: RecorderSample);
}

/// Ambient services an executive shares with the players attached to it.
///
/// Players hold a `Weak` to this object, resolved once at attach time,
/// instead of searching for their owning executive.
pub struct Services {
    id: u64,
    recorder: Option<Arc<dyn DataRecorder>>,
    exec_time_bits: AtomicU64,
}

static NEXT_SERVICES_ID: AtomicU64 = AtomicU64::new(1);

impl Services {
    /// Create a services object with an optional recorder.
    pub fn new(recorder: Option<Arc<dyn DataRecorder>>) -> Self {
        Self {
            id: NEXT_SERVICES_ID.fetch_add(1, Ordering::Relaxed),
            recorder,
            exec_time_bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// Unique identity of the owning executive.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Executive time (seconds) as last published by the executive.
    pub fn exec_time(&self) -> f64 {
        f64::from_bits(self.exec_time_bits.load(Ordering::Acquire))
    }

    /// Publish the executive time stamped onto samples.
    pub fn set_exec_time(&self, t: f64) {
        self.exec_time_bits.store(t.to_bits(), Ordering::Release);
    }

    /// Whether a recorder is installed.
    pub fn has_recorder(&self) -> bool {
        self.recorder.is_some()
    }

    /// Forward a sample to the recorder, stamping the executive time.
    pub fn record(&self, mut sample: RecorderSample) {
        if let Some(rec) = &self.recorder {
            sample.exec_time = self.exec_time();
            rec.record(sample);
        }
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("id", &self.id)
            .field("has_recorder", &self.recorder.is_some())
            .finish()
    }
}
