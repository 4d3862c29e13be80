//! Simulated encoder and WiFi manager.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use embassy_time::{Duration, Instant};
use knob_core::collaborators::NetworkManager;
use knob_core::input::{EncoderInput, Level};
use knob_core::network::NetworkState;
use log::info;

/// Quadrature edges the simulated encoder produces per detent.
pub const EDGES_PER_DETENT: i32 = 4;

/// Encoder state shared between the stdin thread and the render context.
#[derive(Clone, Default)]
pub struct SimKnob {
    count: Arc<AtomicI32>,
    pressed: Arc<AtomicBool>,
}

impl SimKnob {
    pub fn turn(&self, detents: i32) {
        self.count
            .fetch_add(detents * EDGES_PER_DETENT, Ordering::Relaxed);
    }

    pub fn set_pressed(&self, pressed: bool) {
        self.pressed.store(pressed, Ordering::Relaxed);
    }
}

impl EncoderInput for SimKnob {
    fn raw_count(&mut self) -> i32 {
        self.count.load(Ordering::Relaxed)
    }

    fn button_level(&mut self) -> Level {
        // Active low, like the real button.
        Level::from(!self.pressed.load(Ordering::Relaxed))
    }
}

const STATION_SSID: &str = "knob-sim";
const AP_SSID: &str = "knob-setup";
const STATION_IP: &str = "10.0.0.42";
const AP_IP: &str = "192.168.4.1";

/// WiFi manager that "connects" after a fixed delay, or times out when
/// configured to fail.
pub struct SimNetwork {
    state: NetworkState,
    connect_delay: Duration,
    fail: bool,
    connect_started: Option<Instant>,
    ap_client: Arc<AtomicBool>,
}

impl SimNetwork {
    pub fn new(connect_delay: Duration, fail: bool, ap_client: Arc<AtomicBool>) -> Self {
        Self {
            state: NetworkState::Disconnected,
            connect_delay,
            fail,
            connect_started: None,
            ap_client,
        }
    }
}

impl NetworkManager for SimNetwork {
    fn init(&mut self) {
        info!("[wifi] connecting to '{STATION_SSID}'");
        self.state = NetworkState::Connecting;
        self.connect_started = Some(Instant::now());
    }

    fn update(&mut self) {
        let Some(started) = self.connect_started else {
            return;
        };
        if self.state == NetworkState::Connecting && started.elapsed() >= self.connect_delay {
            self.connect_started = None;
            self.state = if self.fail {
                NetworkState::Timeout
            } else {
                NetworkState::Connected
            };
        }
    }

    fn state(&self) -> NetworkState {
        self.state
    }

    fn setup_ap(&mut self) {
        info!("[wifi] starting access point '{AP_SSID}'");
        self.connect_started = None;
        self.state = NetworkState::ApMode;
    }

    fn ssid(&self) -> &str {
        match self.state {
            NetworkState::ApMode => AP_SSID,
            _ => STATION_SSID,
        }
    }

    fn local_ip(&self) -> &str {
        match self.state {
            NetworkState::Connected => STATION_IP,
            _ => "0.0.0.0",
        }
    }

    fn ap_ip(&self) -> &str {
        AP_IP
    }

    fn has_ap_client(&self) -> bool {
        self.ap_client.load(Ordering::Relaxed)
    }

    fn rssi(&self) -> Option<i8> {
        (self.state == NetworkState::Connected).then_some(-61)
    }
}
