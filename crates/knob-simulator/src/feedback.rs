//! Collaborators that print what the real hardware would do.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;

use knob_core::collaborators::{
    AppEventSink, AudioFeedback, Display, Flash, LedFeedback, SystemServices, WebPortal,
};
use knob_core::{Event, EventKind};
use log::{debug, info, warn};

pub struct LogLed;

impl LedFeedback for LogLed {
    fn flash(&mut self, flash: Flash) {
        let Flash {
            color,
            brightness,
            duration_ms,
        } = flash;
        info!(
            "[led] flash #{:02x}{:02x}{:02x} at {brightness} for {duration_ms} ms",
            color.r, color.g, color.b
        );
    }

    fn set_loading_state(&mut self, loading: bool) {
        info!("[led] loading {}", if loading { "on" } else { "off" });
    }

    fn activate(&mut self) {
        debug!("[led] activate");
    }

    fn set_rainbow_state(&mut self, enabled: bool, speed: u8) {
        info!("[led] rainbow {} (speed {speed})", if enabled { "on" } else { "off" });
    }

    fn start_animation(&mut self) {
        info!("[led] animation driver started");
    }
}

pub struct LogAudio;

impl AudioFeedback for LogAudio {
    fn buzz(&mut self) {
        info!("[audio] buzz");
    }

    fn error(&mut self) {
        info!("[audio] error tone");
    }
}

pub struct LogPortal;

impl WebPortal for LogPortal {
    fn init(&mut self) {
        info!("[web] setup portal listening");
    }

    fn update(&mut self) {}
}

/// Application layer stand-in: logs what it is handed.
pub struct LogApp;

impl AppEventSink for LogApp {
    fn initialize(&mut self) {
        info!("[app] initialized");
    }

    fn update(&mut self) {}

    fn process_event(&mut self, event: &Event) {
        match event.kind() {
            // Streams every frame while held.
            EventKind::EncoderPressTime => {}
            kind => info!("[app] {} {}", kind.label(), describe(event)),
        }
    }
}

/// Screen stand-in for the render context.
pub struct LogDisplay {
    frames: u64,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self { frames: 0 }
    }
}

impl Display for LogDisplay {
    fn on_event(&mut self, event: &Event) {
        info!("[display] {} {}", event.kind().label(), describe(event));
    }

    fn update(&mut self) {
        self.frames += 1;
        if self.frames % 300 == 0 {
            debug!("[display] {} frames", self.frames);
        }
    }
}

/// Console input from the stdin thread; reboot ends the simulation.
pub struct SimSystem {
    console: Receiver<u8>,
    shutdown: Arc<AtomicBool>,
}

impl SimSystem {
    pub fn new(console: Receiver<u8>, shutdown: Arc<AtomicBool>) -> Self {
        Self { console, shutdown }
    }
}

impl SystemServices for SimSystem {
    fn read_console_byte(&mut self) -> Option<u8> {
        self.console.try_recv().ok()
    }

    fn reboot(&mut self) {
        info!("[system] reboot requested, stopping simulator");
        self.shutdown.store(true, Ordering::Release);
    }

    fn factory_reset(&mut self) {
        warn!("[system] factory reset requested, stopping simulator");
        self.shutdown.store(true, Ordering::Release);
    }

    fn report_device_info(&mut self) {
        info!("[system] device: knob simulator, id SIM-0000-0001");
    }

    fn free_heap(&self) -> Option<usize> {
        None
    }
}

fn describe(event: &Event) -> String {
    match (event.value(), event.text()) {
        (Some(value), _) => format!("({value})"),
        (None, Some(text)) => format!("'{text}'"),
        (None, None) => String::new(),
    }
}
