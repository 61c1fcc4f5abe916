//! Three local players plus one relayed remote entity, driven through
//! the station in lockstep.

use std::sync::Arc;

use simexec_core::{NetworkId, Player, PlayerId, PlayerKey, PlayerKind, RecorderEvent};
use simexec_engine::Simulation;
use simexec_net::{EntityType, NetIo, NetIoConfig, NtmTree};
use simexec_station::{Station, StationConfig};
use simexec_test_utils::{local_player, remote_update, BindingCall, MemoryRecorder, ScriptedBinding};

const F16: EntityType = EntityType::new(1, 2, 225, 1, 3, 0, 0);

fn keys(sim: &Simulation) -> Vec<String> {
    sim.players().keys().iter().map(|k| k.to_string()).collect()
}

fn station() -> (Station, Arc<NetIo>, Arc<ScriptedBinding>, Arc<MemoryRecorder>) {
    let recorder = Arc::new(MemoryRecorder::new());
    let sim = Simulation::builder()
        .recorder(recorder.clone())
        .player("lead", local_player("lead", 1))
        .player("wing", local_player("wing", 2))
        .player("tanker", local_player("tanker", 3))
        .build()
        .unwrap();
    let station = Station::new(StationConfig::default(), Arc::new(sim)).unwrap();

    let mut ntm = NtmTree::new();
    ntm.add_input(F16, Player::builder("f16").shared());
    ntm.add_kind_default(PlayerKind::Air, F16);
    let binding = Arc::new(ScriptedBinding::new());
    let netio = NetIo::new(
        NetIoConfig::default(),
        Arc::clone(station.simulation()),
        binding.clone(),
        ntm,
    )
    .unwrap();
    let netio = station.add_network(netio);
    station.init_networks().unwrap();
    (station, netio, binding, recorder)
}

#[test]
fn remote_entity_joins_and_local_player_leaves() {
    let (station, netio, binding, recorder) = station();
    assert_eq!(binding.take_calls(), vec![BindingCall::Init]);

    binding.push(remote_update(5, "B", F16));
    station.step_network();
    station.step_background(0.1);
    assert_eq!(keys(station.simulation()), ["1", "2", "3", "(B,5)"]);

    let proxy = station
        .simulation()
        .find_player(PlayerId(5), NetworkId(1))
        .unwrap();
    assert!(proxy.is_proxy());

    station
        .simulation()
        .find_player(PlayerId(2), NetworkId::LOCAL)
        .unwrap()
        .request_delete();
    station.step_background(0.1);
    assert_eq!(keys(station.simulation()), ["1", "3", "(B,5)"]);
    assert_eq!(
        recorder.subjects(RecorderEvent::PlayerRemoved),
        vec![PlayerKey::local(PlayerId(2))]
    );

    // The session publishes the departure once, then forgets the NIB.
    binding.take_calls();
    binding.push(remote_update(5, "B", F16));
    station.step_network();
    let calls = binding.take_calls();
    assert!(calls.contains(&BindingCall::Remove {
        id: PlayerId(2),
        federate: netio.federate().clone(),
    }));
    station.step_network();
    assert!(netio.find_output_nib(PlayerId(2), netio.federate()).is_none());
    assert_eq!(netio.output_nibs().len(), 2);
}

#[test]
fn reset_keeps_live_proxies() {
    let (station, _netio, binding, recorder) = station();
    binding.push(remote_update(5, "B", F16));
    station.step_network();
    station.step_background(0.1);
    station.step_tc(0.02);

    station.simulation().reset();
    assert_eq!(keys(station.simulation()), ["1", "2", "3", "(B,5)"]);
    assert_eq!(station.simulation().exec_counter(), 0);
    assert_eq!(recorder.of(RecorderEvent::ResetEvent).len(), 2);
}

#[test]
fn failed_network_init_is_reported() {
    let (station, _netio, binding, _recorder) = station();
    binding.fail_init(true);
    assert!(station.init_networks().is_err());
}
