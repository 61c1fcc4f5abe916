//! simexec: a real-time simulation executive.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all simexec sub-crates. Most users only need `simexec` as a dependency.
//!
//! # Quick start
//!
//! ```rust
//! use simexec::prelude::*;
//!
//! let sim = Simulation::builder()
//!     .player("lead", Player::builder("lead").build())
//!     .player("wing", Player::builder("wing").build())
//!     .build()
//!     .unwrap();
//!
//! // One cycle is sixteen frames of four phases each.
//! for _ in 0..16 {
//!     sim.update_tc(0.02);
//! }
//! assert_eq!(sim.cycle(), 1);
//! assert_eq!(sim.players().len(), 2);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `simexec-core` | Players, modes, models, IDs, recorder samples |
//! | [`engine`] | `simexec-engine` | The executive, worker pools, player-list snapshots |
//! | [`net`] | `simexec-net` | NIBs, NIB tables, type mapping, network I/O |
//! | [`station`] | `simexec-station` | Periodic threads and network ownership |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core player types (`simexec-core`).
///
/// [`types::Player`] carries identity, mode and kinematics; behaviour is
/// attached through [`types::PlayerModel`].
pub use simexec_core as types;

/// The executive (`simexec-engine`).
///
/// [`engine::Simulation`] drives time-critical frames and background
/// passes over immutable [`engine::PlayerList`] snapshots.
pub use simexec_engine as engine;

/// Networked entity synchronization (`simexec-net`).
///
/// [`net::NetIo`] keeps input and output [`net::Nib`] tables in step with
/// the player list through a [`net::NetworkBinding`].
pub use simexec_net as net;

/// Periodic drivers (`simexec-station`).
pub use simexec_station as station;

/// Common imports for typical simexec usage.
///
/// ```rust
/// use simexec::prelude::*;
/// ```
pub mod prelude {
    // Players
    pub use simexec_core::{
        FederateName, FrameContext, Kinematics, NetworkId, Phase, Player, PlayerId, PlayerKey,
        PlayerKind, PlayerMode, PlayerModel, Vec3,
    };

    // Recording
    pub use simexec_core::{DataRecorder, RecorderEvent, RecorderSample};

    // Engine
    pub use simexec_engine::{ConfigError, PlayerList, Simulation, SimulationConfig};

    // Network
    pub use simexec_net::{
        EntityStateUpdate, EntityType, NetError, NetIo, NetIoConfig, NetworkBinding, Nib,
        NtmTree,
    };

    // Station
    pub use simexec_station::{IgHost, ShutdownReport, Station, StationConfig, StationError};
}
