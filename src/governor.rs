use std::time::{Duration, Instant};

/// the machine's logical clock rate
pub const TICKS_PER_SECOND: u32 = 60;

/// Paces the main loop to a fixed tick rate. Each tick's work is timed and
/// the rest of the period slept away. A tick that overruns is not made up
/// for: the next one just starts late, so emulated time stretches rather than
/// instructions getting dropped.
#[derive(Debug)]
pub struct Governor {
    period: Duration,
    tick_start: Instant,
    ticks: u64,
    overruns: u64,
}

impl Default for Governor {
    fn default() -> Self {
        Self::new()
    }
}

impl Governor {
    pub fn new() -> Self {
        Self::with_period(Duration::from_secs(1) / TICKS_PER_SECOND)
    }

    /// a governor with a custom tick length; zero means "don't sleep at all",
    /// which is handy for running headless
    pub fn with_period(period: Duration) -> Self {
        Governor {
            period,
            tick_start: Instant::now(),
            ticks: 0,
            overruns: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// mark the start of this tick's work
    pub fn begin_tick(&mut self) {
        self.tick_start = Instant::now();
    }

    /// how much of the current tick is left
    pub fn remaining(&self) -> Duration {
        self.period.saturating_sub(self.tick_start.elapsed())
    }

    /// Sleep out whatever is left of the tick. spin_sleep resumes after
    /// signal interruptions and tops up the final stretch with a spin, so the
    /// sleep is never cut short. Returns how long we slept.
    pub fn end_tick(&mut self) -> Duration {
        self.ticks += 1;
        let remaining = self.remaining();
        if remaining.is_zero() {
            if !self.period.is_zero() {
                self.overruns += 1;
            }
            return Duration::ZERO;
        }
        spin_sleep::sleep(remaining);
        remaining
    }

    /// ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// ticks whose work took longer than the period
    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_period_is_sixtieth() {
        let g = Governor::new();
        assert_eq!(g.period(), Duration::from_nanos(16_666_666));
    }

    #[test]
    fn test_tick_lasts_at_least_period() {
        let mut g = Governor::with_period(Duration::from_millis(5));
        let start = Instant::now();
        for _ in 0..3 {
            g.begin_tick();
            g.end_tick();
        }
        assert!(start.elapsed() >= Duration::from_millis(15));
        assert_eq!(g.ticks(), 3);
        assert_eq!(g.overruns(), 0);
    }

    #[test]
    fn test_overrun_does_not_sleep() {
        let mut g = Governor::with_period(Duration::from_millis(1));
        g.begin_tick();
        std::thread::sleep(Duration::from_millis(3));
        assert_eq!(g.end_tick(), Duration::ZERO);
        assert_eq!(g.overruns(), 1);
    }

    #[test]
    fn test_zero_period_never_sleeps() {
        let mut g = Governor::with_period(Duration::ZERO);
        g.begin_tick();
        assert_eq!(g.end_tick(), Duration::ZERO);
        assert_eq!(g.overruns(), 0);
        assert_eq!(g.ticks(), 1);
    }
}
