//! Wrapping 16-bit ID generators for events and released weapons.
//!
//! IDs are unique only within one wrap of the counter. Long runs reuse
//! them; consumers must tolerate that.

use std::sync::atomic::{AtomicU16, Ordering};

/// The executive's three independent ID counters.
#[derive(Debug)]
pub struct UniqueIds {
    event: AtomicU16,
    weapon_event: AtomicU16,
    released_weapon: AtomicU16,
    weapon_floor: AtomicU16,
}

impl UniqueIds {
    /// New generators; the released-weapon counter starts at `weapon_floor`.
    pub fn new(weapon_floor: u16) -> Self {
        let floor = weapon_floor.max(1);
        Self {
            event: AtomicU16::new(0),
            weapon_event: AtomicU16::new(0),
            released_weapon: AtomicU16::new(floor - 1),
            weapon_floor: AtomicU16::new(floor),
        }
    }

    /// Restart every counter, adopting a new released-weapon floor.
    pub fn reset(&self, weapon_floor: u16) {
        let floor = weapon_floor.max(1);
        self.weapon_floor.store(floor, Ordering::Relaxed);
        self.event.store(0, Ordering::Relaxed);
        self.weapon_event.store(0, Ordering::Relaxed);
        self.released_weapon.store(floor - 1, Ordering::Relaxed);
    }

    /// Next general event ID. Wraps 65535 → 0.
    pub fn next_event(&self) -> u16 {
        self.event.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Next weapon event ID. Wraps 65535 → 0.
    pub fn next_weapon_event(&self) -> u16 {
        self.weapon_event.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Next released-weapon ID. Wraps 65535 → floor.
    pub fn next_released_weapon(&self) -> u16 {
        let floor = self.weapon_floor.load(Ordering::Relaxed);
        let step = |cur: u16| {
            if cur >= floor && cur < u16::MAX {
                cur + 1
            } else {
                floor
            }
        };
        match self
            .released_weapon
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| Some(step(cur)))
        {
            Ok(prev) | Err(prev) => step(prev),
        }
    }

    /// Released-weapon floor currently in effect.
    pub fn weapon_floor(&self) -> u16 {
        self.weapon_floor.load(Ordering::Relaxed)
    }
}

impl Default for UniqueIds {
    fn default() -> Self {
        Self::new(10001)
    }
}
