//! Runs a small station for two seconds with a loopback network binding.
//!
//! Every entity this federate publishes is fed back in as a remote entity
//! of federate "mirror", so the run exercises proxy creation, dead
//! reckoning and output thresholds end to end.
//!
//! ```text
//! RUST_LOG=simexec=debug cargo run -p simexec-station --example station_demo
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use simexec_core::{FederateName, Kinematics, Player, PlayerKind, Vec3};
use simexec_engine::{Simulation, SimulationConfig};
use simexec_net::{
    EntityStateUpdate, EntityType, NetError, NetIo, NetIoConfig, NetworkBinding, Nib, NtmTree,
};
use simexec_station::{Station, StationConfig};
use tracing_subscriber::EnvFilter;

const F16: EntityType = EntityType::new(1, 2, 225, 1, 3, 0, 0);

#[derive(Default)]
struct Loopback {
    wire: Mutex<Vec<EntityStateUpdate>>,
}

impl NetworkBinding for Loopback {
    fn name(&self) -> &str {
        "loopback"
    }

    fn init_network(&self, _netio: &NetIo) -> Result<(), NetError> {
        Ok(())
    }

    fn net_input_handler(&self, netio: &NetIo) {
        let received = std::mem::take(&mut *self.wire.lock());
        for update in received {
            if let Err(err) = netio.receive_entity_state(update) {
                tracing::warn!(%err, "loopback update dropped");
            }
        }
    }

    fn entity_state_update(&self, _netio: &NetIo, nib: &Nib, player: &Player) -> bool {
        self.wire.lock().push(EntityStateUpdate {
            player_id: nib.player_id(),
            federate: FederateName::new("mirror"),
            name: None,
            entity_type: nib.entity_type(),
            mode: player.mode(),
            kinematics: player.kinematics(),
            dr_algorithm: nib.dr_algorithm(),
        });
        true
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut builder = Simulation::builder().config(SimulationConfig {
        tc_threads: 2,
        ..SimulationConfig::default()
    });
    for (i, name) in ["lead", "wing", "tanker"].into_iter().enumerate() {
        let k = Kinematics {
            position: Vec3::new(0.0, 500.0 * i as f64, -3000.0),
            velocity: Vec3::new(200.0, 0.0, 0.0),
            ..Kinematics::default()
        };
        builder = builder.player(name, Player::builder(name).kinematics(k).build());
    }
    let sim = Arc::new(builder.build()?);

    let mut station = Station::new(
        StationConfig {
            ownship: Some("lead".into()),
            ..StationConfig::load_or_default()
        },
        Arc::clone(&sim),
    )?;

    let mut ntm = NtmTree::new();
    ntm.add_input(F16, Player::builder("f16").kind(PlayerKind::Air).shared());
    ntm.add_kind_default(PlayerKind::Air, F16);
    let netio = station.add_network(NetIo::new(
        NetIoConfig::default(),
        Arc::clone(&sim),
        Arc::new(Loopback::default()),
        ntm,
    )?);
    station.init_networks()?;

    station.start()?;
    thread::sleep(Duration::from_secs(2));
    let stats = netio.stats();
    let report = station.shutdown();

    println!("players at shutdown: {}", sim.players().len());
    println!("network: {stats:?}");
    println!("station: {report:?}");
    println!("metrics: {:?}", sim.metrics());
    Ok(())
}
