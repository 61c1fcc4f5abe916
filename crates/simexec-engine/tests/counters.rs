//! Cycle/frame/phase rollover and unique-ID wraparound through the
//! executive.

use simexec_core::Phase;
use simexec_engine::{Simulation, SimulationConfig, FRAMES_PER_CYCLE};
use simexec_test_utils::local_player;

fn sim() -> Simulation {
    Simulation::builder()
        .player("a", local_player("a", 1))
        .build()
        .unwrap()
}

#[test]
fn counter_decomposes_at_every_frame() {
    let sim = sim();
    for n in 1..=64u64 {
        sim.update_tc(0.02);
        let c = sim.exec_counter();
        assert_eq!(c, n * 4);
        assert_eq!(
            c,
            sim.cycle() * 64 + u64::from(sim.frame()) * 4 + u64::from(sim.phase().index())
        );
        assert_eq!(sim.phase(), Phase::Dynamics);
        if n % FRAMES_PER_CYCLE == 0 {
            assert_eq!(sim.frame(), 0);
            assert_eq!(sim.cycle(), n / FRAMES_PER_CYCLE);
        }
    }
    assert_eq!(sim.cycle(), 4);

    sim.reset();
    assert_eq!((sim.exec_counter(), sim.cycle(), sim.frame()), (0, 0, 0));
    assert_eq!(sim.exec_time(), 0.0);
}

#[test]
fn event_ids_wrap_to_zero() {
    let sim = sim();
    let ids: Vec<u16> = (0..65536).map(|_| sim.new_event_id()).collect();
    assert_eq!(ids[0], 1);
    assert_eq!(ids[65534], 65535);
    assert_eq!(ids[65535], 0);
    let weapon_events: Vec<u16> = (0..65536).map(|_| sim.new_weapon_event_id()).collect();
    assert_eq!(weapon_events[65535], 0);
}

#[test]
fn released_weapon_ids_wrap_to_floor() {
    let sim = Simulation::builder()
        .config(SimulationConfig {
            first_weapon_id: 65000,
            ..SimulationConfig::default()
        })
        .build()
        .unwrap();
    let ids: Vec<u16> = (0..=536).map(|_| sim.new_released_weapon_id()).collect();
    assert_eq!(ids[0], 65000);
    assert_eq!(ids[535], 65535);
    assert_eq!(ids[536], 65000);

    sim.set_first_weapon_id(20000).unwrap();
    sim.reset();
    assert_eq!(sim.new_released_weapon_id(), 20000);
}
