//! Phase barrier and snapshot stability under a multi-partition pool.
//!
//! Every player carries a [`PhaseTracer`]; the trace log must show that no
//! call for phase counter `c + 1` starts before every call for `c` has
//! ended, and that in-flight frames keep seeing the list they started
//! with while other threads queue and flag players.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use simexec_core::{Phase, Player, PlayerId, PlayerLookup};
use simexec_engine::{Simulation, SimulationConfig};
use simexec_test_utils::{PhaseTracer, TraceLog};

const PLAYERS: u16 = 12;
const FRAMES: u64 = 25;

fn traced_sim(log: &Arc<TraceLog>, tc_threads: usize) -> Simulation {
    let mut b = Simulation::builder().config(SimulationConfig {
        tc_threads,
        ..SimulationConfig::default()
    });
    for id in 1..=PLAYERS {
        let name = format!("p{id}");
        b = b.player(
            &name,
            Player::builder(&name)
                .id(id)
                .model(Box::new(PhaseTracer::new(log, 500)))
                .build(),
        );
    }
    b.build().unwrap()
}

#[test]
fn phases_never_overlap() {
    for threads in [1, 2, 3, simexec_engine::max_threads()] {
        let log = TraceLog::new();
        let sim = traced_sim(&log, threads);
        for _ in 0..FRAMES {
            sim.update_tc(0.02);
        }
        log.check_barriers().unwrap();

        let events = log.events();
        assert_eq!(events.len() as u64, u64::from(PLAYERS) * 4 * FRAMES);
        for e in &events {
            assert_eq!(e.phase, Phase::from_index((e.exec_counter % 4) as u32));
        }
        for c in 0..FRAMES * 4 {
            let mut seen: Vec<u16> = events
                .iter()
                .filter(|e| e.exec_counter == c)
                .map(|e| e.player.0)
                .collect();
            seen.sort_unstable();
            assert_eq!(seen, (1..=PLAYERS).collect::<Vec<_>>(), "counter {c}");
        }
    }
}

#[test]
fn in_flight_frames_keep_their_snapshot() {
    let log = TraceLog::new();
    let sim = Arc::new(traced_sim(&log, 2));
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let sim = Arc::clone(&sim);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut n = 0u16;
            while !done.load(Ordering::Acquire) && n < 200 {
                let name = format!("late{n}");
                let _ = sim.add_new_player(&name, Player::builder(&name).shared());
                n += 1;
                thread::yield_now();
            }
        })
    };

    let before = sim.players();
    for _ in 0..FRAMES {
        sim.update_tc(0.02);
    }
    done.store(true, Ordering::Release);
    writer.join().unwrap();

    // Only background maintenance publishes a new list.
    assert!(Arc::ptr_eq(&before, &sim.players()));
    assert!(log.events().iter().all(|e| e.visible == usize::from(PLAYERS)));

    let flagged = Arc::clone(before.player_at(0).unwrap());
    flagged.request_delete();
    sim.update_data(0.1);
    let after = sim.players();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before.len(), usize::from(PLAYERS));
    assert_eq!(after.len(), before.len() - 1 + sim.metrics().players_added as usize);
    assert!(after.is_sorted());
}

#[test]
fn flagging_mid_frame_keeps_the_list_intact() {
    let log = TraceLog::new();
    let sim = Arc::new(traced_sim(&log, 2));
    let before = sim.players();
    let done = Arc::new(AtomicBool::new(false));

    let adder = {
        let sim = Arc::clone(&sim);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut n = 0u16;
            while !done.load(Ordering::Acquire) && n < 200 {
                let name = format!("late{n}");
                let _ = sim.add_new_player(&name, Player::builder(&name).shared());
                n += 1;
                thread::yield_now();
            }
        })
    };
    let flagger = {
        let list = Arc::clone(&before);
        thread::spawn(move || {
            for i in 0..usize::from(PLAYERS / 2) {
                if let Some(player) = list.player_at(i) {
                    player.request_delete();
                }
                thread::yield_now();
            }
        })
    };

    for _ in 0..FRAMES {
        sim.update_tc(0.02);
    }
    done.store(true, Ordering::Release);
    adder.join().unwrap();
    flagger.join().unwrap();

    assert!(Arc::ptr_eq(&before, &sim.players()));
    let events = log.events();
    let full: Vec<PlayerId> = (1..=PLAYERS).map(PlayerId).collect();
    for c in 0..FRAMES * 4 {
        let mut seen: Vec<u16> = events
            .iter()
            .filter(|e| e.exec_counter == c && e.player.0 > PLAYERS / 2)
            .map(|e| e.player.0)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (PLAYERS / 2 + 1..=PLAYERS).collect::<Vec<_>>(), "counter {c}");
    }
    for e in &events {
        assert_eq!(e.visible, usize::from(PLAYERS));
        assert_eq!(e.order, full, "counter {}", e.exec_counter);
    }
    log.check_barriers().unwrap();

    sim.update_data(0.1);
    let after = sim.players();
    assert_eq!(sim.metrics().players_removed, u64::from(PLAYERS / 2));
    assert!(after
        .iter()
        .all(|e| !e.player.is_removal_requested()));
    assert_eq!(
        after.len(),
        usize::from(PLAYERS / 2) + sim.metrics().players_added as usize
    );
}
