//! Gesture recognition for a rotary encoder with a push-button.
//!
//! [`GestureRecognizer::update`] is called once per render tick. It samples the
//! encoder count and the button line, and raises at most one gesture per
//! press/release cycle:
//!
//! - **click**: release shorter than the click timeout, with no second click
//!   inside the pairing window
//! - **double click**: two such releases inside the pairing window
//! - **long press**: release at or past the long-press threshold
//! - **ultra-long press**: raised the instant a hold crosses the ultra threshold,
//!   or on release if the crossing happened between two samples
//! - **press-and-rotate**: any rotation while the button is held; cancels every
//!   other gesture for that cycle
//!
//! Callers drain results through the `take_*` methods, which return a value
//! once and then reset.

use log::debug;

use super::{EncoderInput, Level};
use crate::clock::Clock;
use crate::config::GestureConfig;
use crate::error::ConfigError;

#[derive(Debug, Default, Clone, Copy)]
struct Pending {
    click: bool,
    double_click: bool,
    long_press: bool,
    ultra_long_press: bool,
    press_and_rotate: bool,
}

pub struct GestureRecognizer<E, C> {
    input: E,
    clock: C,
    config: GestureConfig,

    last_detent: i32,
    /// Plain rotation not yet taken.
    movement: i32,
    /// Rotation made while the button is held.
    held_movement: i32,

    /// Button state as of the last sample.
    button_down: bool,
    press_started_at: u64,
    last_press_duration: u32,
    press_and_rotate_active: bool,

    awaiting_second_click: bool,
    first_click_at: u64,

    long_announced: bool,
    ultra_announced: bool,

    pending: Pending,
}

impl<E: EncoderInput, C: Clock> GestureRecognizer<E, C> {
    /// Fails if `config` does not pass [`GestureConfig::validate`].
    pub fn new(input: E, clock: C, config: GestureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            input,
            clock,
            config,
            last_detent: 0,
            movement: 0,
            held_movement: 0,
            button_down: false,
            press_started_at: 0,
            last_press_duration: 0,
            press_and_rotate_active: false,
            awaiting_second_click: false,
            first_click_at: 0,
            long_announced: false,
            ultra_announced: false,
            pending: Pending::default(),
        })
    }

    /// Read the baseline count and button level. Call once before the first
    /// [`update`](Self::update).
    pub fn init(&mut self) {
        self.last_detent = self.detent();
        self.button_down = self.input.button_level().is_pressed();
        debug!(
            "Gesture recognizer baseline: detent {}, button {}",
            self.last_detent,
            if self.button_down { "down" } else { "up" }
        );
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Sample the hardware once and advance the state machine.
    pub fn update(&mut self) {
        let now = self.clock.now_ms();
        let down = self.input.button_level().is_pressed();
        self.sample_button(now, down);
        self.sample_rotation(down);
        self.check_pairing_timeout(now);
    }

    fn detent(&mut self) -> i32 {
        self.input
            .raw_count()
            .div_euclid(self.config.edges_per_detent)
    }

    /// `down` is this tick's button level, so a detent on the press tick
    /// belongs to the hold and one on the release tick is plain rotation.
    fn sample_rotation(&mut self, down: bool) {
        let detent = self.detent();
        let delta = detent.wrapping_sub(self.last_detent);
        if delta == 0 {
            return;
        }
        self.last_detent = detent;

        if down {
            if !self.press_and_rotate_active {
                self.begin_press_and_rotate();
            }
            self.held_movement = self.held_movement.saturating_add(delta);
        } else {
            self.movement = self.movement.saturating_add(delta);
        }
    }

    fn begin_press_and_rotate(&mut self) {
        debug!("Press-and-rotate started");
        self.press_and_rotate_active = true;
        self.pending = Pending {
            press_and_rotate: true,
            ..Pending::default()
        };
        self.awaiting_second_click = false;
        self.long_announced = false;
        self.ultra_announced = false;
    }

    fn sample_button(&mut self, now: u64, down: bool) {
        if down && !self.button_down {
            self.press_started_at = now;
            self.long_announced = false;
            self.ultra_announced = false;
            self.press_and_rotate_active = false;
            self.held_movement = 0;
        } else if !down && self.button_down {
            self.on_release(now);
        }
        self.button_down = down;

        if down {
            if !self.press_and_rotate_active {
                self.check_hold(now);
            }
        } else if self.ultra_announced
            && self.last_press_duration < self.config.ultra_long_press_ms
        {
            // Only reachable once the latched duration has been reset after an
            // announced hold; the next hold must be able to announce again.
            self.ultra_announced = false;
        }
    }

    fn on_release(&mut self, now: u64) {
        let duration = elapsed(self.press_started_at, now);
        self.last_press_duration = duration;

        if self.press_and_rotate_active {
            debug!("Press-and-rotate ended after {duration} ms");
            self.press_and_rotate_active = false;
            self.held_movement = 0;
            return;
        }

        if duration >= self.config.ultra_long_press_ms {
            if !self.ultra_announced {
                debug!("Ultra-long press on release ({duration} ms)");
                self.pending.ultra_long_press = true;
            }
        } else if duration >= self.config.long_press_ms {
            debug!("Long press ({duration} ms)");
            self.pending.long_press = true;
        } else if duration < self.config.click_timeout_ms {
            if self.awaiting_second_click {
                debug!("Double click");
                self.pending.double_click = true;
                self.pending.click = false;
                self.awaiting_second_click = false;
            } else {
                self.awaiting_second_click = true;
                self.first_click_at = now;
            }
        }
    }

    fn check_hold(&mut self, now: u64) {
        let held = elapsed(self.press_started_at, now);
        if held >= self.config.long_press_ms && !self.long_announced {
            debug!("Long-press threshold reached while held");
            self.long_announced = true;
        }
        if held >= self.config.ultra_long_press_ms && !self.ultra_announced {
            debug!("Ultra-long press while held ({held} ms)");
            self.ultra_announced = true;
            self.pending.ultra_long_press = true;
        }
    }

    fn check_pairing_timeout(&mut self, now: u64) {
        if self.awaiting_second_click
            && elapsed(self.first_click_at, now) > self.config.double_click_window_ms
        {
            debug!("Click");
            self.awaiting_second_click = false;
            self.pending.click = true;
        }
    }

    // -----------------------------------------------------------------------
    // Consumption
    // -----------------------------------------------------------------------

    /// Rotation since the last call, in detents. Always zero while the button
    /// is held or a press-and-rotate gesture is active.
    pub fn take_movement(&mut self) -> i32 {
        if self.button_down || self.press_and_rotate_active {
            return 0;
        }
        core::mem::take(&mut self.movement)
    }

    /// Rotation made during the active press-and-rotate that hasn't been
    /// taken yet. Zero once the gesture has ended.
    pub fn take_press_and_rotate_movement(&mut self) -> i32 {
        if !self.press_and_rotate_active {
            return 0;
        }
        core::mem::take(&mut self.held_movement)
    }

    pub fn take_clicked(&mut self) -> bool {
        core::mem::take(&mut self.pending.click)
    }

    pub fn take_double_clicked(&mut self) -> bool {
        core::mem::take(&mut self.pending.double_click)
    }

    pub fn take_long_pressed(&mut self) -> bool {
        core::mem::take(&mut self.pending.long_press)
    }

    pub fn take_ultra_long_pressed(&mut self) -> bool {
        core::mem::take(&mut self.pending.ultra_long_press)
    }

    pub fn take_press_and_rotate(&mut self) -> bool {
        core::mem::take(&mut self.pending.press_and_rotate)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Live button level, read straight from the hardware.
    pub fn is_button_down(&mut self) -> bool {
        self.input.button_level() == Level::Low
    }

    pub fn is_press_and_rotate_active(&self) -> bool {
        self.press_and_rotate_active
    }

    /// How long the current press has lasted, or zero when released.
    pub fn press_time(&self) -> u32 {
        if self.button_down {
            elapsed(self.press_started_at, self.clock.now_ms())
        } else {
            0
        }
    }

    /// Duration of the most recent completed press, latched until reset.
    pub fn last_press_duration(&self) -> u32 {
        self.last_press_duration
    }

    /// Clear the latched press duration. Returns whether there was one.
    pub fn reset_last_press_duration(&mut self) -> bool {
        core::mem::take(&mut self.last_press_duration) != 0
    }
}

fn elapsed(since: u64, now: u64) -> u32 {
    u32::try_from(now.saturating_sub(since)).unwrap_or(u32::MAX)
}
