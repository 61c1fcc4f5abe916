//! Test utilities and mock collaborators for simexec development.
//!
//! Provides an in-memory [`DataRecorder`], a [`ScriptedBinding`] network
//! protocol that replays queued entity states and captures every outgoing
//! call, and the player-model tracers in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use simexec_core::{
    DataRecorder, FederateName, Player, PlayerId, PlayerKey, RecorderEvent, RecorderSample,
};
use simexec_net::{EntityStateUpdate, NetError, NetIo, NetworkBinding, Nib};

pub use fixtures::{
    local_player, remote_update, CountingModel, Counts, PhaseTracer, TraceEvent, TraceLog,
};

/// Recorder that keeps every sample in memory.
#[derive(Default)]
pub struct MemoryRecorder {
    samples: Mutex<Vec<RecorderSample>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every sample so far.
    pub fn samples(&self) -> Vec<RecorderSample> {
        self.samples.lock().clone()
    }

    /// Samples of one event kind.
    pub fn of(&self, event: RecorderEvent) -> Vec<RecorderSample> {
        self.samples
            .lock()
            .iter()
            .filter(|s| s.event == event)
            .cloned()
            .collect()
    }

    /// Subject keys of every sample of `event`.
    pub fn subjects(&self, event: RecorderEvent) -> Vec<PlayerKey> {
        self.of(event)
            .iter()
            .filter_map(|s| s.players.first().map(|t| t.key()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }
}

impl DataRecorder for MemoryRecorder {
    fn record(&self, sample: RecorderSample) {
        self.samples.lock().push(sample);
    }
}

/// One call a [`ScriptedBinding`] received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingCall {
    Init,
    EntityState { id: PlayerId, federate: FederateName },
    Fire { id: PlayerId },
    Detonation { id: PlayerId },
    Remove { id: PlayerId, federate: FederateName },
    SystemOutput { id: PlayerId },
}

/// Network binding driven by a script instead of a socket.
///
/// Queue entity states with [`push`](ScriptedBinding::push); the next
/// input frame delivers them. Inspect outgoing traffic with
/// [`take_calls`](ScriptedBinding::take_calls).
#[derive(Default)]
pub struct ScriptedBinding {
    inbox: Mutex<VecDeque<EntityStateUpdate>>,
    calls: Mutex<Vec<BindingCall>>,
    fail_init: AtomicBool,
}

impl ScriptedBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entity state for the next input frame.
    pub fn push(&self, update: EntityStateUpdate) {
        self.inbox.lock().push_back(update);
    }

    /// Make the next `init_network` fail.
    pub fn fail_init(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::Release);
    }

    /// Drain the captured calls, omitting per-system output.
    pub fn take_calls(&self) -> Vec<BindingCall> {
        std::mem::take(&mut *self.calls.lock())
            .into_iter()
            .filter(|c| !matches!(c, BindingCall::SystemOutput { .. }))
            .collect()
    }

    /// Drain every captured call.
    pub fn take_all_calls(&self) -> Vec<BindingCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    fn log(&self, call: BindingCall) {
        self.calls.lock().push(call);
    }
}

impl NetworkBinding for ScriptedBinding {
    fn name(&self) -> &str {
        "scripted"
    }

    fn init_network(&self, _netio: &NetIo) -> Result<(), NetError> {
        if self.fail_init.load(Ordering::Acquire) {
            return Err(NetError::Binding("scripted init failure".into()));
        }
        self.log(BindingCall::Init);
        Ok(())
    }

    fn net_input_handler(&self, netio: &NetIo) {
        let pending: Vec<_> = self.inbox.lock().drain(..).collect();
        for update in pending {
            let _ = netio.receive_entity_state(update);
        }
    }

    fn entity_state_update(&self, _netio: &NetIo, nib: &Nib, _player: &Player) -> bool {
        self.log(BindingCall::EntityState {
            id: nib.player_id(),
            federate: nib.federate().clone(),
        });
        true
    }

    fn fire_notification(&self, _netio: &NetIo, nib: &Nib, _player: &Player) {
        self.log(BindingCall::Fire { id: nib.player_id() });
    }

    fn detonation_notification(&self, _netio: &NetIo, nib: &Nib, _player: &Player) {
        self.log(BindingCall::Detonation { id: nib.player_id() });
    }

    fn remove_entity(&self, _netio: &NetIo, nib: &Nib) {
        self.log(BindingCall::Remove {
            id: nib.player_id(),
            federate: nib.federate().clone(),
        });
    }

    fn system_output(&self, _netio: &NetIo, nib: &Nib, _player: &Player) {
        self.log(BindingCall::SystemOutput { id: nib.player_id() });
    }
}
