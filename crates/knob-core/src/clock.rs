//! Monotonic millisecond time source.
//!
//! Everything time-based in the core (gesture thresholds, the boot delay, the
//! health interval) reads from a [`Clock`] so tests can drive time by hand.

/// Monotonic milliseconds since an arbitrary, fixed origin.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Clock backed by the embassy time driver.
///
/// On the firmware this is the esp-rtos timer; on the host it is the
/// `std` driver of `embassy-time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
