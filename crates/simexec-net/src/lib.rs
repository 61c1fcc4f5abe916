//! Network entity synchronization for simexec.
//!
//! A [`NetIo`] session mirrors remote entities into the executive as proxy
//! players and publishes local players to the network. The wire protocol
//! itself lives behind the [`NetworkBinding`] trait; this crate owns the
//! [`Nib`] lifecycle, dead reckoning, and entity-type mapping.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod binding;
pub mod config;
pub mod dead_reckoning;
pub mod entity_type;
pub mod error;
pub mod netio;
pub mod nib;
pub mod nib_table;
pub mod ntm;

pub use binding::NetworkBinding;
pub use config::NetIoConfig;
pub use dead_reckoning::{DrAlgorithm, DrThresholds, UpdateReason};
pub use entity_type::EntityType;
pub use error::{NetConfigError, NetError};
pub use netio::{EntityStateUpdate, NetIo, NetStats};
pub use nib::{IoType, Nib, NibInit};
pub use nib_table::NibTable;
pub use ntm::NtmTree;
