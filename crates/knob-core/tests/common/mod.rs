//! Recording collaborators shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use knob_core::clock::Clock;
use knob_core::collaborators::{
    AppEventSink, AudioFeedback, Collaborators, Flash, LedFeedback, NetworkManager, Platform,
    SystemServices, WebPortal,
};
use knob_core::config::CoreConfig;
use knob_core::input::{EncoderInput, Level};
use knob_core::network::NetworkState;
use knob_core::{Coordinator, Event, EventBus, EventKind};

/// Everything the collaborators were asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Flash(Flash),
    Loading(bool),
    Activate,
    Rainbow(bool, u8),
    StartAnimation,
    Buzz,
    AudioError,
    NetworkInit,
    SetupAp,
    WebInit,
    App(EventKind),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

#[derive(Clone, Default)]
pub struct TestClock(pub Rc<Cell<u64>>);

impl Clock for TestClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

#[derive(Clone)]
pub struct RecordingLed(pub CallLog);

impl LedFeedback for RecordingLed {
    fn flash(&mut self, flash: Flash) {
        self.0.borrow_mut().push(Call::Flash(flash));
    }
    fn set_loading_state(&mut self, loading: bool) {
        self.0.borrow_mut().push(Call::Loading(loading));
    }
    fn activate(&mut self) {
        self.0.borrow_mut().push(Call::Activate);
    }
    fn set_rainbow_state(&mut self, enabled: bool, speed: u8) {
        self.0.borrow_mut().push(Call::Rainbow(enabled, speed));
    }
    fn start_animation(&mut self) {
        self.0.borrow_mut().push(Call::StartAnimation);
    }
}

#[derive(Clone)]
pub struct RecordingAudio(pub CallLog);

impl AudioFeedback for RecordingAudio {
    fn buzz(&mut self) {
        self.0.borrow_mut().push(Call::Buzz);
    }
    fn error(&mut self) {
        self.0.borrow_mut().push(Call::AudioError);
    }
}

#[derive(Clone)]
pub struct RecordingApp(pub CallLog);

impl AppEventSink for RecordingApp {
    fn initialize(&mut self) {}
    fn update(&mut self) {}
    fn process_event(&mut self, event: &Event) {
        self.0.borrow_mut().push(Call::App(event.kind()));
    }
}

#[derive(Clone)]
pub struct RecordingWeb {
    pub log: CallLog,
    pub updates: Rc<Cell<u32>>,
}

impl WebPortal for RecordingWeb {
    fn init(&mut self) {
        self.log.borrow_mut().push(Call::WebInit);
    }
    fn update(&mut self) {
        self.updates.set(self.updates.get() + 1);
    }
}

/// Network whose state the test sets directly. `setup_ap` switches to AP mode.
#[derive(Clone)]
pub struct ScriptedNetwork {
    pub log: CallLog,
    pub state: Rc<Cell<NetworkState>>,
    pub ap_client: Rc<Cell<bool>>,
}

impl NetworkManager for ScriptedNetwork {
    fn init(&mut self) {
        self.log.borrow_mut().push(Call::NetworkInit);
    }
    fn update(&mut self) {}
    fn state(&self) -> NetworkState {
        self.state.get()
    }
    fn setup_ap(&mut self) {
        self.log.borrow_mut().push(Call::SetupAp);
        self.state.set(NetworkState::ApMode);
    }
    fn ssid(&self) -> &str {
        if self.state.get() == NetworkState::ApMode {
            "knob-setup"
        } else {
            "home-net"
        }
    }
    fn local_ip(&self) -> &str {
        "10.0.0.42"
    }
    fn ap_ip(&self) -> &str {
        "192.168.4.1"
    }
    fn has_ap_client(&self) -> bool {
        self.ap_client.get()
    }
    fn rssi(&self) -> Option<i8> {
        Some(-58)
    }
}

pub struct TestPlatform;

impl Platform for TestPlatform {
    type Clock = TestClock;
    type Led = RecordingLed;
    type Network = ScriptedNetwork;
    type Web = RecordingWeb;
    type App = RecordingApp;
    type Audio = RecordingAudio;
    type System = ();
}

/// A coordinator on a leaked bus plus handles to everything it drives.
pub struct Harness {
    pub bus: &'static EventBus,
    pub coordinator: Coordinator<'static, TestPlatform>,
    pub clock: TestClock,
    pub log: CallLog,
    pub network: Rc<Cell<NetworkState>>,
    pub ap_client: Rc<Cell<bool>>,
    pub web_updates: Rc<Cell<u32>>,
}

impl Harness {
    pub fn new(config: CoreConfig) -> Self {
        let bus: &'static EventBus = Box::leak(Box::new(EventBus::new()));
        let clock = TestClock::default();
        let log: CallLog = Rc::default();
        let network = Rc::new(Cell::new(NetworkState::Disconnected));
        let ap_client = Rc::new(Cell::new(false));
        let web_updates = Rc::new(Cell::new(0));

        let parts = Collaborators::<TestPlatform> {
            clock: clock.clone(),
            led: RecordingLed(log.clone()),
            network: ScriptedNetwork {
                log: log.clone(),
                state: network.clone(),
                ap_client: ap_client.clone(),
            },
            web: RecordingWeb {
                log: log.clone(),
                updates: web_updates.clone(),
            },
            app: RecordingApp(log.clone()),
            audio: RecordingAudio(log.clone()),
            system: (),
        };
        let mut coordinator = Coordinator::new(config, bus, parts).unwrap();
        coordinator.initialize();

        Self {
            bus,
            coordinator,
            clock,
            log,
            network,
            ap_client,
            web_updates,
        }
    }

    pub fn tick_at(&mut self, ms: u64) {
        self.clock.0.set(ms);
        self.coordinator.tick();
    }

    /// Tick every `step` ms from the current time up to and including `until`.
    pub fn run_until(&mut self, until: u64, step: u64) {
        let mut now = self.clock.0.get();
        while now + step <= until {
            now += step;
            self.tick_at(now);
        }
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    pub fn app_events(calls: &[Call]) -> Vec<EventKind> {
        calls
            .iter()
            .filter_map(|call| match call {
                Call::App(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    pub fn ui_events(&self) -> Vec<Event> {
        std::iter::from_fn(|| self.bus.try_receive_from_main()).collect()
    }
}

/// Knob whose count and button the test drives directly.
#[derive(Clone, Default)]
pub struct TestKnob {
    pub count: Rc<Cell<i32>>,
    pub pressed: Rc<Cell<bool>>,
}

impl TestKnob {
    pub fn turn(&self, detents: i32) {
        self.count.set(self.count.get() + detents * 4);
    }
}

impl EncoderInput for TestKnob {
    fn raw_count(&mut self) -> i32 {
        self.count.get()
    }
    fn button_level(&mut self) -> Level {
        if self.pressed.get() {
            Level::Low
        } else {
            Level::High
        }
    }
}
