//! Station layer for simexec.
//!
//! A [`Station`] owns the periodic threads that drive one
//! [`Simulation`](simexec_engine::Simulation): a time-critical thread, a
//! background thread, and a network thread that services every
//! registered [`NetIo`](simexec_net::NetIo) session. Image-generator
//! hosts plug in through [`IgHost`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod ig;
pub mod station;

pub use config::{StationConfig, MIN_RATE_HZ};
pub use error::StationError;
pub use ig::IgHost;
pub use station::{ShutdownReport, Station};
