//! The station: periodic threads around one executive.
//!
//! ```text
//! simexec-tc   every 1/tc_rate   Simulation::update_tc, then IG hosts
//! simexec-bg   every 1/bg_rate   Simulation::update_data, then IG hosts
//! simexec-net  every 1/net_rate  NetIo::input_frame, then output_frame
//! ```
//!
//! Each thread sleeps with `park_timeout` for the rest of its period, so
//! shutdown wakes it at once with `unpark`. For deterministic drivers the
//! same work is exposed as [`Station::step_tc()`],
//! [`Station::step_background()`] and [`Station::step_network()`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use simexec_engine::Simulation;
use simexec_net::NetIo;

use crate::config::StationConfig;
use crate::error::StationError;
use crate::ig::IgHost;

// ── ShutdownReport ───────────────────────────────────────────────

/// Report from [`Station::shutdown()`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Total time spent shutting down.
    pub total_ms: u64,
    /// Periodic threads joined cleanly.
    pub threads_joined: usize,
    /// Executive pool workers joined.
    pub workers_joined: usize,
    /// Time-critical frames run by the station (threads and steps).
    pub tc_frames: u64,
    /// Background passes run.
    pub background_passes: u64,
    /// Network passes run.
    pub network_passes: u64,
}

// ── Shared ───────────────────────────────────────────────────────

struct Shared {
    sim: Arc<Simulation>,
    networks: RwLock<Vec<Arc<NetIo>>>,
    ig_hosts: RwLock<Vec<Arc<dyn IgHost>>>,
    tc_frames: AtomicU64,
    background_passes: AtomicU64,
    network_passes: AtomicU64,
}

impl Shared {
    fn step_tc(&self, dt: f64) {
        self.sim.update_tc(dt);
        let hosts = self.ig_hosts.read().clone();
        if !hosts.is_empty() {
            let ownship = self.sim.ownship();
            let players = self.sim.players();
            for ig in &hosts {
                ig.update_tc(ownship.as_ref(), &players, dt);
            }
        }
        self.tc_frames.fetch_add(1, Ordering::Relaxed);
    }

    fn step_background(&self, dt: f64) {
        self.sim.update_data(dt);
        let hosts = self.ig_hosts.read().clone();
        for ig in hosts {
            ig.update_data(dt);
        }
        self.background_passes.fetch_add(1, Ordering::Relaxed);
    }

    fn step_network(&self) {
        let networks = self.networks.read().clone();
        for net in networks {
            net.input_frame();
            net.output_frame();
        }
        self.network_passes.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Clone, Copy, Debug)]
enum Periodic {
    TimeCritical,
    Background,
    Network,
}

impl Periodic {
    fn thread_name(self) -> &'static str {
        match self {
            Self::TimeCritical => "simexec-tc",
            Self::Background => "simexec-bg",
            Self::Network => "simexec-net",
        }
    }
}

fn run_periodic(shared: Arc<Shared>, which: Periodic, rate_hz: f64, stop: Arc<AtomicBool>) {
    let period = Duration::from_secs_f64(1.0 / rate_hz);
    let dt = period.as_secs_f64();
    tracing::debug!(thread = which.thread_name(), rate_hz, "periodic thread running");
    while !stop.load(Ordering::Acquire) {
        let start = Instant::now();
        match which {
            Periodic::TimeCritical => shared.step_tc(dt),
            Periodic::Background => shared.step_background(dt),
            Periodic::Network => shared.step_network(),
        }
        let elapsed = start.elapsed();
        match period.checked_sub(elapsed) {
            Some(remaining) => thread::park_timeout(remaining),
            None => tracing::trace!(
                thread = which.thread_name(),
                overrun_us = (elapsed - period).as_micros() as u64,
                "period overrun"
            ),
        }
    }
}

// ── Station ──────────────────────────────────────────────────────

/// Owns the periodic threads that drive one executive and its network
/// sessions.
pub struct Station {
    config: StationConfig,
    shared: Arc<Shared>,
    stop: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
    shut_down: bool,
}

impl Station {
    /// Wrap `sim` after validating `config`.
    pub fn new(config: StationConfig, sim: Arc<Simulation>) -> Result<Self, StationError> {
        config.validate()?;
        if let Some(name) = &config.ownship {
            sim.set_ownship(name);
        }
        Ok(Self {
            config,
            shared: Arc::new(Shared {
                sim,
                networks: RwLock::new(Vec::new()),
                ig_hosts: RwLock::new(Vec::new()),
                tc_frames: AtomicU64::new(0),
                background_passes: AtomicU64::new(0),
                network_passes: AtomicU64::new(0),
            }),
            stop: Arc::new(AtomicBool::new(false)),
            threads: Vec::new(),
            shut_down: false,
        })
    }

    /// Station configuration.
    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// The executive.
    pub fn simulation(&self) -> &Arc<Simulation> {
        &self.shared.sim
    }

    /// Register a network session.
    pub fn add_network(&self, netio: NetIo) -> Arc<NetIo> {
        let netio = Arc::new(netio);
        self.shared.networks.write().push(Arc::clone(&netio));
        netio
    }

    /// Registered network sessions.
    pub fn networks(&self) -> Vec<Arc<NetIo>> {
        self.shared.networks.read().clone()
    }

    /// Register an image-generator host.
    pub fn add_ig_host(&self, ig: Arc<dyn IgHost>) {
        tracing::debug!(ig = ig.name(), "IG host registered");
        self.shared.ig_hosts.write().push(ig);
    }

    /// Initialise every network session. All sessions are attempted;
    /// the first failure is returned.
    pub fn init_networks(&self) -> Result<(), StationError> {
        let mut first = None;
        for net in self.networks() {
            if let Err(err) = net.init_network() {
                tracing::error!(%err, network = %net.network_id(), "network session failed to initialise");
                first.get_or_insert(err);
            }
        }
        match first {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    // ── Lockstep ──────────────────────────────────────────────────

    /// One time-critical frame of `dt` seconds.
    pub fn step_tc(&self, dt: f64) {
        self.shared.step_tc(dt);
    }

    /// One background pass of `dt` seconds.
    pub fn step_background(&self, dt: f64) {
        self.shared.step_background(dt);
    }

    /// One network pass over every session.
    pub fn step_network(&self) {
        self.shared.step_network();
    }

    // ── Periodic threads ──────────────────────────────────────────

    /// Whether the periodic threads are running.
    pub fn is_running(&self) -> bool {
        !self.threads.is_empty()
    }

    /// Spawn the periodic threads.
    pub fn start(&mut self) -> Result<(), StationError> {
        if self.shut_down {
            return Err(StationError::ShutDown);
        }
        if self.is_running() {
            return Err(StationError::AlreadyRunning);
        }
        self.stop.store(false, Ordering::Release);
        let plan = [
            (Periodic::TimeCritical, self.config.tc_rate_hz),
            (Periodic::Background, self.config.bg_rate_hz),
            (Periodic::Network, self.config.net_rate_hz),
        ];
        for (which, rate) in plan {
            let shared = Arc::clone(&self.shared);
            let stop = Arc::clone(&self.stop);
            let spawned = thread::Builder::new()
                .name(which.thread_name().into())
                .spawn(move || run_periodic(shared, which, rate, stop));
            match spawned {
                Ok(handle) => self.threads.push(handle),
                Err(e) => {
                    self.stop_threads();
                    return Err(StationError::ThreadSpawn {
                        name: which.thread_name(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        tracing::info!(
            tc_rate_hz = self.config.tc_rate_hz,
            bg_rate_hz = self.config.bg_rate_hz,
            net_rate_hz = self.config.net_rate_hz,
            networks = self.shared.networks.read().len(),
            "station started"
        );
        Ok(())
    }

    fn stop_threads(&mut self) -> usize {
        self.stop.store(true, Ordering::Release);
        for handle in &self.threads {
            handle.thread().unpark();
        }
        let mut joined = 0;
        for handle in self.threads.drain(..) {
            if handle.join().is_ok() {
                joined += 1;
            } else {
                tracing::error!("periodic thread panicked");
            }
        }
        joined
    }

    /// Stop the periodic threads without shutting the executive down.
    /// Returns the number of threads joined.
    pub fn stop(&mut self) -> usize {
        let joined = self.stop_threads();
        if joined > 0 {
            tracing::info!(threads_joined = joined, "station stopped");
        }
        joined
    }

    /// Stop the periodic threads, drop every network session's NIBs, and
    /// shut the executive's pools down. Idempotent.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if self.shut_down {
            return ShutdownReport::default();
        }
        let start = Instant::now();
        self.shut_down = true;
        let threads_joined = self.stop_threads();
        for net in self.networks() {
            net.clear();
        }
        let workers_joined = self.shared.sim.shutdown();
        let report = ShutdownReport {
            total_ms: start.elapsed().as_millis() as u64,
            threads_joined,
            workers_joined,
            tc_frames: self.shared.tc_frames.load(Ordering::Relaxed),
            background_passes: self.shared.background_passes.load(Ordering::Relaxed),
            network_passes: self.shared.network_passes.load(Ordering::Relaxed),
        };
        tracing::info!(?report, "station shut down");
        report
    }
}

impl Drop for Station {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Station")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .field("networks", &self.shared.networks.read().len())
            .finish()
    }
}
