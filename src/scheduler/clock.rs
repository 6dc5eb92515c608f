/*!
 * Simulation Clock
 *
 * Simulated time advances by a fixed increment once per fixed real-time
 * period, regardless of what the scheduler is doing. The value is derived
 * from tokio's monotonic clock rather than from a ticking task, so readers
 * never observe a tick that "has not landed yet" and tests running on
 * tokio's paused clock see exact, repeatable values.
 */

use super::config::SchedulerConfig;
use crate::core::time::{SimTime, MILLIS_PER_UNIT};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
enum ClockState {
    /// Not started; reads as zero
    Idle,
    Running { origin: Instant },
    /// Frozen at the value observed when stopped
    Stopped { at: SimTime },
}

/// Read-only simulated time source
#[derive(Debug, Clone)]
pub struct Clock {
    state: Arc<RwLock<ClockState>>,
    unit: Duration,
    resolution: SimTime,
}

impl Clock {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(ClockState::Idle)),
            unit: config.unit,
            resolution: config.resolution,
        }
    }

    /// Start ticking. Only the first call has an effect.
    pub fn start(&self) -> bool {
        let mut state = self.state.write();
        match *state {
            ClockState::Idle => {
                *state = ClockState::Running {
                    origin: Instant::now(),
                };
                true
            }
            _ => false,
        }
    }

    /// Stop ticking; the current value stays readable
    pub fn stop(&self) {
        let mut state = self.state.write();
        let at = self.read(&state);
        *state = ClockState::Stopped { at };
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.read(), ClockState::Running { .. })
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.read(&self.state.read())
    }

    /// Number of ticks elapsed since start
    pub fn ticks(&self) -> u64 {
        self.now().as_millis() / self.resolution.as_millis().max(1)
    }

    /// Real instant corresponding to simulated time `at`, rounded up.
    /// `None` unless the clock is running.
    pub fn deadline(&self, at: SimTime) -> Option<Instant> {
        match *self.state.read() {
            ClockState::Running { origin } => Some(origin + self.real_span_ceil(at)),
            _ => None,
        }
    }

    fn read(&self, state: &ClockState) -> SimTime {
        match *state {
            ClockState::Idle => SimTime::ZERO,
            ClockState::Stopped { at } => at,
            ClockState::Running { origin } => {
                let elapsed = Instant::now().saturating_duration_since(origin);
                self.quantize(elapsed)
            }
        }
    }

    /// Whole ticks contained in `elapsed`, as simulated time
    fn quantize(&self, elapsed: Duration) -> SimTime {
        let unit = self.unit.as_nanos().max(1);
        let millis = elapsed.as_nanos() * MILLIS_PER_UNIT as u128 / unit;
        let step = self.resolution.as_millis().max(1) as u128;
        let ticks = millis / step;
        SimTime::from_millis((ticks * step).min(u64::MAX as u128) as u64)
    }

    fn real_span_ceil(&self, span: SimTime) -> Duration {
        let num = self.unit.as_nanos() * span.as_millis() as u128;
        let den = MILLIS_PER_UNIT as u128;
        let nanos = (num + den - 1) / den;
        Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> Clock {
        Clock::new(&SchedulerConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_zero_before_start() {
        let clock = clock();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(clock.now(), SimTime::ZERO);
        assert!(clock.deadline(SimTime::from_units(1)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_advances_in_whole_ticks() {
        let clock = clock();
        assert!(clock.start());

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(clock.now(), SimTime::ZERO);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(clock.now(), SimTime::from_millis(500));

        tokio::time::sleep(Duration::from_millis(1_700)).await;
        assert_eq!(clock.now(), SimTime::from_millis(2_000));
        assert_eq!(clock.ticks(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_once() {
        let clock = clock();
        assert!(clock.start());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!clock.start());
        assert_eq!(clock.now(), SimTime::from_units(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_freezes_value() {
        let clock = clock();
        clock.start();
        tokio::time::sleep(Duration::from_secs(2)).await;
        clock.stop();
        assert!(!clock.is_running());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(clock.now(), SimTime::from_units(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_lands_on_value() {
        let clock = clock();
        clock.start();
        let target = SimTime::from_millis(3_500);
        let deadline = clock.deadline(target).unwrap();
        tokio::time::sleep_until(deadline).await;
        assert_eq!(clock.now(), target);
    }
}
