//! When the host loop runs the slow tick and publishes the sensors snapshot.

use std::time::{Duration, Instant};

use crate::config::{SLOW_TICK_PERIOD, TELEMETRY_PERIOD};

/// Hooks due on one pass of the host loop. The fast hook runs every pass and
/// applies its own poll gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Due {
    pub slow: bool,
    pub telemetry: bool,
}

/// Timing for the host loop that drives the controller.
#[derive(Debug)]
pub struct TickSchedule {
    slow_period: Duration,
    telemetry_period: Duration,
    last_slow: Instant,
    last_telemetry: Instant,
    loop_delay: Duration,
}

impl TickSchedule {
    pub fn new(start: Instant) -> Self {
        Self::with_periods(start, SLOW_TICK_PERIOD, TELEMETRY_PERIOD)
    }

    pub fn with_periods(start: Instant, slow_period: Duration, telemetry_period: Duration) -> Self {
        Self {
            slow_period,
            telemetry_period,
            last_slow: start,
            last_telemetry: start,
            loop_delay: Duration::from_millis(10),
        }
    }

    /// Works out which periodic hooks are due at `now`. Missed periods are
    /// not caught up: each hook fires at most once per call.
    pub fn poll(&mut self, now: Instant) -> Due {
        let mut due = Due::default();

        if now.saturating_duration_since(self.last_slow) >= self.slow_period {
            self.last_slow = now;
            due.slow = true;
        }

        if now.saturating_duration_since(self.last_telemetry) >= self.telemetry_period {
            self.last_telemetry = now;
            due.telemetry = true;
        }

        due
    }

    /// How long the loop should sleep after a pass that took `elapsed`.
    pub fn idle_time(&self, elapsed: Duration) -> Duration {
        self.loop_delay.saturating_sub(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_due_at_start() {
        let t0 = Instant::now();
        let mut schedule = TickSchedule::new(t0);
        assert_eq!(schedule.poll(t0), Due::default());
    }

    #[test]
    fn slow_tick_every_five_seconds() {
        let t0 = Instant::now();
        let mut schedule = TickSchedule::new(t0);

        assert!(!schedule.poll(t0 + Duration::from_millis(4999)).slow);
        assert!(schedule.poll(t0 + Duration::from_secs(5)).slow);
        assert!(!schedule.poll(t0 + Duration::from_secs(6)).slow);
        assert!(schedule.poll(t0 + Duration::from_secs(10)).slow);
    }

    #[test]
    fn missed_periods_fire_once() {
        let t0 = Instant::now();
        let mut schedule = TickSchedule::new(t0);

        let due = schedule.poll(t0 + Duration::from_secs(120));
        assert!(due.slow);
        assert!(due.telemetry);
        assert_eq!(schedule.poll(t0 + Duration::from_secs(121)), Due::default());
    }

    #[test]
    fn telemetry_period() {
        let t0 = Instant::now();
        let mut schedule = TickSchedule::with_periods(t0, Duration::from_secs(5), Duration::from_secs(30));

        assert!(!schedule.poll(t0 + Duration::from_secs(29)).telemetry);
        assert!(schedule.poll(t0 + Duration::from_secs(30)).telemetry);
    }

    #[test]
    fn idle_time_never_negative() {
        let schedule = TickSchedule::new(Instant::now());
        assert_eq!(schedule.idle_time(Duration::from_millis(4)), Duration::from_millis(6));
        assert_eq!(schedule.idle_time(Duration::from_millis(120)), Duration::ZERO);
    }
}
