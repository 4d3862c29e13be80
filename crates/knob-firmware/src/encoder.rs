// src/encoder.rs
//! Quadrature encoder on PCNT unit 0 plus the active-low push-button.

use esp_hal::gpio::Input;
use esp_hal::pcnt::unit::Counter;
use knob_core::input::{EncoderInput, Level};

/// Extends the 16-bit PCNT counter to an `i32` edge count.
///
/// The unit is left at its default ±32767 limits; the counter is read every
/// render tick, far more often than it could move half its range.
pub struct PcntEncoder {
    counter: Counter<'static, 0>,
    button: Input<'static>,
    last_raw: i16,
    count: i32,
}

impl PcntEncoder {
    pub fn new(counter: Counter<'static, 0>, button: Input<'static>) -> Self {
        let last_raw = counter.get();
        Self {
            counter,
            button,
            last_raw,
            count: 0,
        }
    }
}

impl EncoderInput for PcntEncoder {
    fn raw_count(&mut self) -> i32 {
        let raw = self.counter.get();
        let delta = raw.wrapping_sub(self.last_raw);
        self.last_raw = raw;
        self.count = self.count.wrapping_add(i32::from(delta));
        self.count
    }

    fn button_level(&mut self) -> Level {
        Level::from(self.button.is_high())
    }
}
