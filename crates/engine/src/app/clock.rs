use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time source for the run loop and the frame pacer.
///
/// `relax` is issued once per spin iteration of a busy wait and must not block;
/// `sleep` is the cooperative idle wait at the end of a loop iteration.
pub trait Clock {
    fn now(&self) -> Instant;

    fn relax(&self) {
        std::hint::spin_loop();
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn relax(&self) {
        (**self).relax();
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

#[cfg(test)]
pub(crate) use sim::SimClock;

#[cfg(test)]
mod sim {
    use std::cell::Cell;
    use std::time::{Duration, Instant};

    use super::Clock;

    /// Manually advanced clock. Each `relax` moves time forward by `relax_step`
    /// so busy waits terminate deterministically.
    #[derive(Debug)]
    pub(crate) struct SimClock {
        origin: Instant,
        offset: Cell<Duration>,
        relax_step: Duration,
    }

    impl SimClock {
        pub(crate) fn new(relax_step: Duration) -> Self {
            Self {
                origin: Instant::now(),
                offset: Cell::new(Duration::ZERO),
                relax_step,
            }
        }

        pub(crate) fn advance(&self, duration: Duration) {
            self.offset.set(self.offset.get() + duration);
        }

        pub(crate) fn elapsed(&self) -> Duration {
            self.offset.get()
        }
    }

    impl Clock for SimClock {
        fn now(&self) -> Instant {
            self.origin + self.offset.get()
        }

        fn relax(&self) {
            self.advance(self.relax_step);
        }

        fn sleep(&self, duration: Duration) {
            self.advance(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_clock_moves_only_when_told() {
        let clock = SimClock::new(Duration::from_micros(10));
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.relax();
        clock.sleep(Duration::from_millis(5));
        assert_eq!(
            clock.now().duration_since(start),
            Duration::from_micros(5_010)
        );
        assert_eq!(clock.elapsed(), Duration::from_micros(5_010));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock;
        let first = clock.now();
        clock.relax();
        assert!(clock.now() >= first);
    }
}
