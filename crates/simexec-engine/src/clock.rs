//! Executive and simulated time-of-day bookkeeping.
//!
//! Both clocks accumulate whole microseconds in integers and keep the
//! sub-microsecond remainder of each `dt` as a separate carry, so
//! repeated small steps never lose precision over long runs. Calendar
//! handling (start instant, day of year, time of day) goes through
//! `chrono`.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

use crate::config::StartTime;

const US_PER_SEC: f64 = 1_000_000.0;
const US_PER_DAY: i64 = 86_400_000_000;

#[derive(Clone, Copy, Debug, Default)]
struct Accumulator {
    whole_us: i64,
    carry_us: f64,
}

impl Accumulator {
    fn at(whole_us: i64) -> Self {
        Self {
            whole_us,
            carry_us: 0.0,
        }
    }

    fn advance(&mut self, dt: f64) {
        let total = self.carry_us + dt * US_PER_SEC;
        let whole = total.trunc();
        self.whole_us += whole as i64;
        self.carry_us = total - whole;
    }

    fn seconds(&self) -> f64 {
        (self.whole_us as f64 + self.carry_us) / US_PER_SEC
    }
}

/// Executive clock and simulated UTC time of day.
#[derive(Clone, Debug)]
pub struct ExecClock {
    exec: Accumulator,
    sim: Accumulator,
    start: StartTime,
    frozen: bool,
}

impl ExecClock {
    /// New clock starting at `start`.
    pub fn new(start: StartTime, frozen: bool) -> Self {
        Self {
            exec: Accumulator::default(),
            sim: Accumulator::at(start_us(&start)),
            start,
            frozen,
        }
    }

    /// Restart both clocks from the configured start time.
    pub fn reset(&mut self) {
        self.exec = Accumulator::default();
        self.sim = Accumulator::at(start_us(&self.start));
    }

    /// Replace the start time used by the next [`reset()`](ExecClock::reset).
    pub fn set_start(&mut self, start: StartTime) {
        self.start = start;
    }

    /// Advance by `dt` seconds. Non-finite or negative steps are ignored.
    pub fn advance(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.exec.advance(dt);
        if !self.frozen || self.is_slaved_to_utc() {
            self.sim.advance(dt);
        }
    }

    /// Freeze or unfreeze the simulated clock. Ignored while slaved to UTC.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Whether simulated time is frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen && !self.is_slaved_to_utc()
    }

    /// Whether simulated time follows the host UTC clock.
    pub fn is_slaved_to_utc(&self) -> bool {
        matches!(self.start, StartTime::RealUtc)
    }

    /// Seconds of executive (computer) time since the last reset.
    pub fn exec_time(&self) -> f64 {
        self.exec.seconds()
    }

    /// Simulated time as seconds since the Unix epoch.
    pub fn sim_unix_time(&self) -> f64 {
        self.sim.seconds()
    }

    /// Simulated instant, truncated to whole microseconds.
    pub fn sim_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.sim.whole_us)
    }

    /// Simulated seconds past midnight UTC.
    pub fn sim_time_of_day(&self) -> f64 {
        let whole = match self.sim_datetime() {
            Some(t) => {
                f64::from(t.num_seconds_from_midnight())
                    + f64::from(t.timestamp_subsec_micros()) / US_PER_SEC
            }
            None => self.sim.whole_us.rem_euclid(US_PER_DAY) as f64 / US_PER_SEC,
        };
        whole + self.sim.carry_us / US_PER_SEC
    }

    /// Simulated day of the year, `1..=366`.
    pub fn sim_day_of_year(&self) -> u32 {
        self.sim_datetime().map_or(1, |t| t.ordinal())
    }
}

/// The UTC instant of a fixed start time, if its fields form a valid
/// calendar date and time of day.
pub(crate) fn fixed_start(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(hour, minute, second)
        .map(|t| t.and_utc())
}

fn start_us(start: &StartTime) -> i64 {
    match *start {
        StartTime::RealUtc => Utc::now().timestamp_micros(),
        StartTime::Fixed {
            year,
            month,
            day,
            hour,
            minute,
            second,
        } => fixed_start(year, month, day, hour, minute, second)
            .map_or(0, |t| t.timestamp_micros()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(year: i32, month: u32, day: u32, hour: u32) -> StartTime {
        StartTime::Fixed {
            year,
            month,
            day,
            hour,
            minute: 0,
            second: 0,
        }
    }

    #[test]
    fn fixed_start_is_a_utc_instant() {
        let at = fixed_start(2000, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(at.timestamp(), 11_017 * 86_400 + 12 * 3600 + 30 * 60);
        assert!(fixed_start(2023, 2, 29, 0, 0, 0).is_none());
        assert!(fixed_start(2024, 1, 1, 24, 0, 0).is_none());

        let clock = ExecClock::new(fixed(2000, 3, 1, 12), false);
        let t = clock.sim_datetime().unwrap();
        assert_eq!((t.year(), t.month(), t.day(), t.hour()), (2000, 3, 1, 12));
    }

    #[test]
    fn sub_microsecond_carry_shows_in_time_of_day() {
        let mut clock = ExecClock::new(fixed(2024, 1, 1, 0), false);
        clock.advance(1.0000005);
        assert!((clock.sim_time_of_day() - 1.0000005).abs() < 1e-12);
    }

    #[test]
    fn fixed_start_reports_time_of_day_and_day_of_year() {
        let clock = ExecClock::new(fixed(2024, 3, 1, 6), false);
        assert_eq!(clock.sim_time_of_day(), 6.0 * 3600.0);
        // 2024 is a leap year: Jan 31 + Feb 29 + 1.
        assert_eq!(clock.sim_day_of_year(), 61);
    }

    #[test]
    fn exec_time_always_advances_sim_time_stops_when_frozen() {
        let mut clock = ExecClock::new(fixed(2024, 1, 1, 0), true);
        clock.advance(1.5);
        assert_eq!(clock.exec_time(), 1.5);
        assert_eq!(clock.sim_time_of_day(), 0.0);
        clock.set_frozen(false);
        clock.advance(0.5);
        assert_eq!(clock.sim_time_of_day(), 0.5);
    }

    #[test]
    fn utc_slaved_clock_ignores_freeze() {
        let mut clock = ExecClock::new(StartTime::RealUtc, true);
        assert!(!clock.is_frozen());
        let before = clock.sim_unix_time();
        clock.advance(2.0);
        assert!((clock.sim_unix_time() - before - 2.0).abs() < 1e-6);
    }

    #[test]
    fn many_small_steps_do_not_drift() {
        let mut clock = ExecClock::new(fixed(2024, 1, 1, 0), false);
        // One simulated day in 50 Hz frames.
        for _ in 0..(86_400 * 50) {
            clock.advance(0.02);
        }
        assert!((clock.exec_time() - 86_400.0).abs() < 1e-6);
        assert_eq!(clock.sim_day_of_year(), 2);
        assert!(clock.sim_time_of_day() < 1e-6 || clock.sim_time_of_day() > 86_400.0 - 1e-6);
    }

    #[test]
    fn time_of_day_wraps_at_midnight() {
        let mut clock = ExecClock::new(
            StartTime::Fixed {
                year: 2023,
                month: 12,
                day: 31,
                hour: 23,
                minute: 59,
                second: 59,
            },
            false,
        );
        clock.advance(2.0);
        assert!((clock.sim_time_of_day() - 1.0).abs() < 1e-9);
        assert_eq!(clock.sim_day_of_year(), 1);
    }

    #[test]
    fn reset_restarts_from_start() {
        let mut clock = ExecClock::new(fixed(2024, 1, 1, 0), false);
        clock.advance(10.0);
        clock.reset();
        assert_eq!(clock.exec_time(), 0.0);
        assert_eq!(clock.sim_time_of_day(), 0.0);
    }

    #[test]
    fn bad_steps_ignored() {
        let mut clock = ExecClock::new(fixed(2024, 1, 1, 0), false);
        clock.advance(f64::NAN);
        clock.advance(-1.0);
        assert_eq!(clock.exec_time(), 0.0);
    }
}
