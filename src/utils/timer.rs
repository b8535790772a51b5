use core::time::Duration;

use crate::devices::platform::Clock;

/// Tracks elapsed time against a fixed period.
///
/// # Examples
/// ```ignore
/// let mut timer = Timer::new(Duration::from_secs(3), &platform);
/// while !timer.is_done() {
///     platform.sleep(Duration::from_millis(10)).await;
/// }
/// ```
pub struct Timer<'a, C: Clock + ?Sized> {
    clock: &'a C,
    period: Duration,
    start: Duration,
}

impl<'a, C: Clock + ?Sized> Timer<'a, C> {
    /// Creates a timer that starts counting immediately.
    pub fn new(period: Duration, clock: &'a C) -> Self {
        Self {
            clock,
            period,
            start: clock.now(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn elapsed_time(&self) -> Duration {
        self.clock.now().saturating_sub(self.start)
    }

    pub fn remaining_time(&self) -> Duration {
        self.period.saturating_sub(self.elapsed_time())
    }

    pub fn is_done(&self) -> bool {
        self.remaining_time() == Duration::ZERO
    }

    /// Restarts the timer from zero elapsed time.
    pub fn reset(&mut self) {
        self.start = self.clock.now();
    }
}
