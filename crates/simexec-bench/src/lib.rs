//! Benchmark profiles for the simexec executive.
//!
//! - [`fleet_profile`]: an executive with `n` originals spread over a
//!   grid, for frame and pass timing
//! - [`output_nib`]: a standalone output NIB for table benchmarks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use simexec_core::{FederateName, Kinematics, NetworkId, Player, PlayerId, Vec3};
use simexec_engine::{ConfigError, Simulation, SimulationConfig};
use simexec_net::{DrAlgorithm, DrThresholds, EntityType, IoType, Nib, NibInit};

/// Entity type used for every benchmark NIB.
pub const BENCH_TYPE: EntityType = EntityType::new(1, 2, 225, 1, 3, 0, 0);

/// Build an executive with `n` originals using `threads` workers in both
/// pools.
///
/// Players are placed 100 m apart on a square grid, flying north at
/// 150 m/s, so kinematic dynamics have real work to do.
pub fn fleet_profile(n: usize, threads: usize) -> Result<Simulation, ConfigError> {
    let side = (n as f64).sqrt().ceil().max(1.0) as usize;
    let mut builder = Simulation::builder().config(SimulationConfig {
        tc_threads: threads,
        bg_threads: threads,
        new_player_queue_capacity: n.max(256),
        ..SimulationConfig::default()
    });
    for i in 0..n {
        let name = format!("p{i:04}");
        let k = Kinematics {
            position: Vec3::new(
                100.0 * (i / side) as f64,
                100.0 * (i % side) as f64,
                -1000.0,
            ),
            velocity: Vec3::new(150.0, 0.0, 0.0),
            ..Kinematics::default()
        };
        let player = Player::builder(&name).kinematics(k).build();
        builder = builder.player(name, player);
    }
    builder.build()
}

/// An output NIB keyed by (`id`, `federate`).
pub fn output_nib(id: u16, federate: &FederateName) -> Arc<Nib> {
    Arc::new(Nib::new(NibInit {
        io_type: IoType::Output,
        network_id: NetworkId(1),
        player_id: PlayerId(id),
        federate: federate.clone(),
        name: Arc::from(format!("{id}").as_str()),
        entity_type: BENCH_TYPE,
        dr_algorithm: DrAlgorithm::Rvw,
        thresholds: DrThresholds::default(),
    }))
}
