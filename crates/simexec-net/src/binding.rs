//! The contract a concrete interoperability protocol implements.
//!
//! [`NetIo`] owns the NIB lifecycle; the binding owns the wire. Each hook
//! is called from the thread driving the session, outside every NIB
//! table lock, so a binding may call back into [`NetIo`] freely.

use simexec_core::Player;

use crate::error::NetError;
use crate::netio::NetIo;
use crate::nib::{Nib, NibInit};

/// A protocol binding (DIS, HLA, ...).
pub trait NetworkBinding: Send + Sync {
    /// Short protocol name for logs.
    fn name(&self) -> &str;

    /// Open the network connection. Called once by
    /// [`NetIo::init_network()`].
    fn init_network(&self, netio: &NetIo) -> Result<(), NetError>;

    /// Build a NIB. Override to attach protocol state via
    /// [`Nib::with_extension()`].
    fn nib_factory(&self, init: NibInit) -> Nib {
        Nib::new(init)
    }

    /// Drain received traffic, typically by calling
    /// [`NetIo::receive_entity_state()`] once per entity-state message.
    fn net_input_handler(&self, netio: &NetIo);

    /// Publish the current state of `player` through `nib`. Returns
    /// `true` if a message was sent.
    fn entity_state_update(&self, netio: &NetIo, nib: &Nib, player: &Player) -> bool;

    /// A weapon entity was just released.
    fn fire_notification(&self, _netio: &NetIo, _nib: &Nib, _player: &Player) {}

    /// A weapon entity detonated.
    fn detonation_notification(&self, _netio: &NetIo, _nib: &Nib, _player: &Player) {}

    /// An output entity is about to be dropped; emit its removal message.
    /// Called exactly once per NIB, during its grace pass.
    fn remove_entity(&self, _netio: &NetIo, _nib: &Nib) {}

    /// Per-system output (IFF, radios, emitters) after the entity state.
    fn system_output(&self, _netio: &NetIo, _nib: &Nib, _player: &Player) {}
}
