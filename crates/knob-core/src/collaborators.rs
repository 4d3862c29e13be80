//! Interfaces to the subsystems the core drives but does not implement.
//!
//! LED animation, WiFi management, the setup web portal, audio and the
//! application layer all live behind these traits. Every call is
//! fire-and-forget from the core's point of view. The unit type implements
//! each trait as a no-op for builds that lack the subsystem.

use crate::clock::Clock;
use crate::event::Event;
use crate::network::NetworkState;

// ---------------------------------------------------------------------------
// LED feedback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A one-shot LED flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flash {
    pub color: Rgb,
    pub brightness: u8,
    pub duration_ms: u32,
}

impl Flash {
    pub const fn new(color: Rgb, brightness: u8, duration_ms: u32) -> Self {
        Self {
            color,
            brightness,
            duration_ms,
        }
    }
}

/// Flashes the coordinator uses for its reactions.
pub mod flashes {
    use super::{Flash, Rgb};

    const GREEN: Rgb = Rgb::new(0, 255, 0);
    const ORANGE: Rgb = Rgb::new(255, 165, 0);
    const BLUE: Rgb = Rgb::new(0, 100, 255);

    pub const CLICK: Flash = Flash::new(GREEN, 255, 200);
    pub const LONG_PRESS: Flash = Flash::new(ORANGE, 255, 500);
    pub const WIFI_CONNECTED: Flash = Flash::new(GREEN, 255, 500);
    pub const AP_MODE: Flash = Flash::new(BLUE, 255, 1000);
    pub const SETUP_CLIENT: Flash = Flash::new(GREEN, 255, 300);
}

/// Rainbow speed used once the system is running.
pub const RUNNING_RAINBOW_SPEED: u8 = 2;

pub trait LedFeedback {
    fn flash(&mut self, flash: Flash);
    fn set_loading_state(&mut self, loading: bool);
    /// Wake the ring after user interaction.
    fn activate(&mut self);
    fn set_rainbow_state(&mut self, enabled: bool, speed: u8);
    /// Start the LED animation driver. Called once the render context is up.
    fn start_animation(&mut self);
}

impl LedFeedback for () {
    fn flash(&mut self, _flash: Flash) {}
    fn set_loading_state(&mut self, _loading: bool) {}
    fn activate(&mut self) {}
    fn set_rainbow_state(&mut self, _enabled: bool, _speed: u8) {}
    fn start_animation(&mut self) {}
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

pub trait NetworkManager {
    fn init(&mut self);
    /// Advance the manager's own state machine. Called every coordination tick.
    fn update(&mut self);
    fn state(&self) -> NetworkState;
    /// Switch to access-point setup mode.
    fn setup_ap(&mut self);
    fn ssid(&self) -> &str;
    fn local_ip(&self) -> &str;
    fn ap_ip(&self) -> &str;
    fn has_ap_client(&self) -> bool;
    fn rssi(&self) -> Option<i8>;
}

/// No network hardware: permanently disconnected.
impl NetworkManager for () {
    fn init(&mut self) {}
    fn update(&mut self) {}
    fn state(&self) -> NetworkState {
        NetworkState::Disconnected
    }
    fn setup_ap(&mut self) {}
    fn ssid(&self) -> &str {
        ""
    }
    fn local_ip(&self) -> &str {
        ""
    }
    fn ap_ip(&self) -> &str {
        ""
    }
    fn has_ap_client(&self) -> bool {
        false
    }
    fn rssi(&self) -> Option<i8> {
        None
    }
}

/// Setup portal served while in access-point mode.
pub trait WebPortal {
    fn init(&mut self);
    fn update(&mut self);
}

impl WebPortal for () {
    fn init(&mut self) {}
    fn update(&mut self) {}
}

// ---------------------------------------------------------------------------
// Application, audio, display, system
// ---------------------------------------------------------------------------

/// The application layer. Sees every event the coordinator drains.
pub trait AppEventSink {
    fn initialize(&mut self);
    fn update(&mut self);
    fn process_event(&mut self, event: &Event);
}

impl AppEventSink for () {
    fn initialize(&mut self) {}
    fn update(&mut self) {}
    fn process_event(&mut self, _event: &Event) {}
}

pub trait AudioFeedback {
    fn buzz(&mut self);
    fn error(&mut self);
}

impl AudioFeedback for () {
    fn buzz(&mut self) {}
    fn error(&mut self) {}
}

/// Renderer driven by the render context.
pub trait Display {
    fn on_event(&mut self, event: &Event);
    fn update(&mut self);
}

impl Display for () {
    fn on_event(&mut self, _event: &Event) {}
    fn update(&mut self) {}
}

/// Board-level services behind the serial console.
pub trait SystemServices {
    /// Next byte typed on the console, if any.
    fn read_console_byte(&mut self) -> Option<u8>;
    fn reboot(&mut self);
    /// Erase persisted settings and restart.
    fn factory_reset(&mut self);
    /// Print the device identity (UUID, MAC, chip details).
    fn report_device_info(&mut self);
    fn free_heap(&self) -> Option<usize>;
}

impl SystemServices for () {
    fn read_console_byte(&mut self) -> Option<u8> {
        None
    }
    fn reboot(&mut self) {}
    fn factory_reset(&mut self) {}
    fn report_device_info(&mut self) {}
    fn free_heap(&self) -> Option<usize> {
        None
    }
}

// ---------------------------------------------------------------------------
// Platform bundle
// ---------------------------------------------------------------------------

/// The concrete collaborator types for one build (firmware, simulator, tests).
pub trait Platform {
    type Clock: Clock;
    type Led: LedFeedback;
    type Network: NetworkManager;
    type Web: WebPortal;
    type App: AppEventSink;
    type Audio: AudioFeedback;
    type System: SystemServices;
}

/// Owned collaborator instances for a [`Platform`].
pub struct Collaborators<P: Platform> {
    pub clock: P::Clock,
    pub led: P::Led,
    pub network: P::Network,
    pub web: P::Web,
    pub app: P::App,
    pub audio: P::Audio,
    pub system: P::System,
}
