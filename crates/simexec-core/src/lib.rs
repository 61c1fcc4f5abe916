//! Core types and traits for the simexec simulation executive.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! simulated entity ([`Player`]) and its lifecycle state machine, the
//! capability trait players are composed from, the data-recorder sink
//! contract, and the running [`Statistic`] used for timing diagnostics.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod kinematics;
pub mod mode;
pub mod model;
pub mod player;
pub mod recorder;
pub mod statistic;

pub use error::PlayerError;
pub use id::{FederateName, NetworkId, PlayerId, PlayerKey};
pub use kinematics::{Kinematics, Vec3};
pub use mode::PlayerMode;
pub use model::{FrameContext, KinematicDynamics, Phase, PlayerLookup, PlayerModel};
pub use player::{NetworkLink, Player, PlayerBuilder, PlayerKind, PlayerState};
pub use recorder::{DataRecorder, PlayerTag, RecorderEvent, RecorderSample, Services};
pub use statistic::Statistic;
