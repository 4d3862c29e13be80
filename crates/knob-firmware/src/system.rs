// src/system.rs
//! Console and reset services for the ESP32-S3.

use knob_core::collaborators::SystemServices;
use log::{info, warn};
use rtt_target::DownChannel;

pub struct EspSystem {
    console: DownChannel,
    pending: [u8; 16],
    pending_len: usize,
    pending_pos: usize,
}

impl EspSystem {
    pub fn new(console: DownChannel) -> Self {
        Self {
            console,
            pending: [0; 16],
            pending_len: 0,
            pending_pos: 0,
        }
    }
}

impl SystemServices for EspSystem {
    fn read_console_byte(&mut self) -> Option<u8> {
        if self.pending_pos == self.pending_len {
            self.pending_len = self.console.read(&mut self.pending);
            self.pending_pos = 0;
        }
        if self.pending_pos < self.pending_len {
            let byte = self.pending[self.pending_pos];
            self.pending_pos += 1;
            Some(byte)
        } else {
            None
        }
    }

    fn reboot(&mut self) {
        esp_hal::system::software_reset();
    }

    fn factory_reset(&mut self) {
        // No settings are persisted on this board yet, so a reset is all it takes.
        warn!("No stored settings to erase, restarting");
        esp_hal::system::software_reset();
    }

    fn report_device_info(&mut self) {
        info!(
            "Device: knob on ESP32-S3, firmware {}",
            env!("CARGO_PKG_VERSION")
        );
    }

    fn free_heap(&self) -> Option<usize> {
        None
    }
}
