//! System coordination: lifecycle state, network hand-off and reactions to
//! user input.
//!
//! The [`Coordinator`] runs in the low-rate context. Each [`tick`] it:
//!
//! 1. leaves `Booting` once the boot delay has passed
//! 2. updates the network manager and reacts to state changes
//! 3. services the setup portal while in access-point mode
//! 4. starts the system once it is `Ready`
//! 5. updates the application layer
//! 6. handles console commands
//! 7. drains events from the render context
//! 8. logs a health report every health interval
//!
//! [`tick`]: Coordinator::tick

use log::{debug, error, info, warn};

use crate::clock::Clock;
use crate::collaborators::{
    AppEventSink, AudioFeedback, Collaborators, LedFeedback, NetworkManager, Platform,
    RUNNING_RAINBOW_SPEED, SystemServices, WebPortal, flashes,
};
use crate::config::CoreConfig;
use crate::console::{Command, HELP_LINES, LineBuffer};
use crate::error::CoreError;
use crate::event::{Event, EventKind};
use crate::event_bus::{BusStatus, EVENT_QUEUE_CAPACITY, EventBus};
use crate::network::{ClientWatch, NetworkState, StateWatch};
use crate::state::{StateMachine, SystemState};

/// Free heap below this is reported as a warning in the health log.
pub const LOW_HEAP_WARNING_BYTES: usize = 10 * 1024;

/// Console bytes consumed per tick at most.
const CONSOLE_BYTES_PER_TICK: usize = 128;

/// Counters reported by the health check and the `status` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub state: SystemState,
    pub uptime_ms: u64,
    pub coordination_cycles: u32,
    pub events_processed: u32,
    pub free_heap: Option<usize>,
    pub bus: BusStatus,
}

pub struct Coordinator<'a, P: Platform, const N: usize = EVENT_QUEUE_CAPACITY> {
    config: CoreConfig,
    bus: &'a EventBus<N>,
    parts: Collaborators<P>,

    state: StateMachine,
    started_at_ms: u64,
    last_health_ms: u64,
    cycles: u32,
    events_processed: u32,

    network_watch: StateWatch,
    client_watch: ClientWatch,
    console: LineBuffer,
    render_started: bool,
}

impl<'a, P: Platform, const N: usize> Coordinator<'a, P, N> {
    /// Fails with [`CoreError::InvalidConfig`] if `config` does not validate.
    pub fn new(
        config: CoreConfig,
        bus: &'a EventBus<N>,
        parts: Collaborators<P>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let now = parts.clock.now_ms();
        Ok(Self {
            config,
            bus,
            parts,
            state: StateMachine::new(SystemState::Booting, now),
            started_at_ms: now,
            last_health_ms: now,
            cycles: 0,
            events_processed: 0,
            network_watch: StateWatch::new(),
            client_watch: ClientWatch::new(),
            console: LineBuffer::new(),
            render_started: false,
        })
    }

    /// Bring up the bus and the application layer, and start the boot timer.
    pub fn initialize(&mut self) {
        info!("Initializing system coordinator");
        self.parts.system.report_device_info();
        self.bus.initialize();
        self.parts.app.initialize();

        let now = self.now();
        self.started_at_ms = now;
        self.last_health_ms = now;
        self.state = StateMachine::new(SystemState::Booting, now);
        info!(
            "Coordinator ready, booting for {} ms (network {})",
            self.config.boot_delay_ms,
            if self.config.wifi_required {
                "required"
            } else {
                "not required"
            }
        );
    }

    /// Launch the render context through `spawn`.
    ///
    /// A failure moves the system to [`SystemState::Error`]; it is not retried.
    pub fn start_render_context<F, E>(&mut self, spawn: F) -> Result<(), CoreError>
    where
        F: FnOnce() -> Result<(), E>,
        E: core::fmt::Debug,
    {
        if self.render_started {
            debug!("Render context already running");
            return Ok(());
        }

        match spawn() {
            Ok(()) => {
                info!("Render context started");
                self.render_started = true;
                self.parts.led.start_animation();
                Ok(())
            }
            Err(err) => {
                error!("Failed to start render context: {err:?}");
                self.set_state(SystemState::Error);
                Err(CoreError::ContextSpawn)
            }
        }
    }

    /// Enter `Running`. Only acts from `Ready`; returns whether it did.
    pub fn start(&mut self) -> bool {
        if self.state.current() != SystemState::Ready {
            debug!(
                "Ignoring start request in state {}",
                self.state.current().label()
            );
            return false;
        }
        info!("Starting system");
        self.parts
            .led
            .set_rainbow_state(true, RUNNING_RAINBOW_SPEED);
        self.set_state(SystemState::Running);
        true
    }

    pub fn set_state(&mut self, next: SystemState) {
        let now = self.now();
        if next == SystemState::Error && self.state.current() != SystemState::Error {
            error!("System entering error state");
        }
        self.state.transition_to(next, now);
    }

    pub fn state(&self) -> SystemState {
        self.state.current()
    }

    pub fn time_in_state(&self) -> u64 {
        self.state.time_in_state(self.now())
    }

    pub fn is_render_started(&self) -> bool {
        self.render_started
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn collaborators(&self) -> &Collaborators<P> {
        &self.parts
    }

    fn now(&self) -> u64 {
        self.parts.clock.now_ms()
    }

    fn halted(&self) -> bool {
        self.state.current() == SystemState::Error
    }

    // -----------------------------------------------------------------------
    // Coordination tick
    // -----------------------------------------------------------------------

    /// One pass of the coordination loop.
    pub fn tick(&mut self) {
        let now = self.now();

        if !self.halted() {
            self.advance_boot(now);
        }

        self.parts.network.update();
        if !self.halted() {
            self.react_to_network();
        }
        if self.parts.network.state() == NetworkState::ApMode {
            self.parts.web.update();
        }

        if self.state.current() == SystemState::Ready {
            self.start();
        }

        self.parts.app.update();
        self.poll_console();
        self.process_events();

        self.cycles = self.cycles.wrapping_add(1);
        if now.saturating_sub(self.last_health_ms) >= self.config.health_interval_ms {
            self.last_health_ms = now;
            self.log_health();
        }
    }

    fn advance_boot(&mut self, now: u64) {
        if self.state.current() != SystemState::Booting {
            return;
        }
        if now.saturating_sub(self.started_at_ms) < self.config.boot_delay_ms {
            return;
        }

        info!("Boot delay elapsed");
        self.set_state(SystemState::Initializing);

        if self.config.wifi_required {
            self.bus
                .send_to_ui(Event::new(EventKind::DisplayWifiConnecting));
            self.parts.network.init();
        } else {
            self.bus.send_to_ui(Event::new(EventKind::DisplayWakeUp));
            self.set_state(SystemState::Ready);
        }

        self.parts
            .app
            .process_event(&Event::new(EventKind::BootingComplete));
    }

    fn react_to_network(&mut self) {
        let current = self.parts.network.state();

        if let Some(changed) = self.network_watch.observe(current) {
            info!("Network state changed: {}", changed.label());
            match changed {
                NetworkState::Connecting => {
                    self.set_state(SystemState::WifiConnecting);
                    self.parts.led.set_loading_state(true);
                    self.parts
                        .app
                        .process_event(&Event::new(EventKind::WifiConnecting));
                }
                NetworkState::Connected => {
                    info!(
                        "Connected to '{}' as {}",
                        self.parts.network.ssid(),
                        self.parts.network.local_ip()
                    );
                    self.parts.led.set_loading_state(false);
                    self.parts.led.flash(flashes::WIFI_CONNECTED);
                    self.bus.send_to_ui(Event::new(EventKind::DisplayHome));
                    self.parts
                        .app
                        .process_event(&Event::new(EventKind::WifiConnected));
                    self.set_state(SystemState::Ready);
                }
                NetworkState::ApMode => self.enter_ap_mode(),
                failed if failed.needs_setup() => {
                    warn!("Network unavailable ({}), starting setup access point", failed.label());
                    self.parts
                        .app
                        .process_event(&Event::new(EventKind::WifiDisconnected));
                    self.parts.network.setup_ap();
                }
                _ => {}
            }
        }

        let has_client = current == NetworkState::ApMode && self.parts.network.has_ap_client();
        if self.client_watch.observe(has_client) {
            info!("Setup client connected to access point");
            self.bus.send_to_ui(Event::with_formatted(
                EventKind::DisplayWifiSetupUrl,
                format_args!("http://{}/setup", self.parts.network.ap_ip()),
            ));
            self.parts.led.flash(flashes::SETUP_CLIENT);
        }
    }

    fn enter_ap_mode(&mut self) {
        self.set_state(SystemState::WifiApMode);
        self.parts.web.init();
        self.bus.send_to_ui(Event::with_formatted(
            EventKind::DisplayWifiApMode,
            format_args!(
                "{}|{}",
                self.parts.network.ssid(),
                self.parts.network.ap_ip()
            ),
        ));
        self.parts.led.flash(flashes::AP_MODE);
        info!(
            "Setup access point '{}' up at {}",
            self.parts.network.ssid(),
            self.parts.network.ap_ip()
        );
    }

    // -----------------------------------------------------------------------
    // Events from the render context
    // -----------------------------------------------------------------------

    /// Drain events sent by the render context. Handles at most one queue's
    /// worth per call; returns how many were handled.
    pub fn process_events(&mut self) -> usize {
        let mut handled = 0;
        while handled < N {
            let Some(event) = self.bus.try_receive_from_ui() else {
                break;
            };
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    fn dispatch(&mut self, event: Event) {
        self.events_processed = self.events_processed.wrapping_add(1);
        self.parts.app.process_event(&event);

        match event.kind() {
            EventKind::EncoderRotation => {
                debug!("Rotation {}", event.value_or_zero());
                self.parts.led.activate();
                self.bus.send_to_ui(event);
            }
            EventKind::EncoderClick => {
                debug!("Click");
                self.parts.led.flash(flashes::CLICK);
                self.parts.audio.buzz();
                self.bus.send_to_ui(event);
            }
            EventKind::EncoderLongPress => {
                debug!("Long press");
                self.parts.led.flash(flashes::LONG_PRESS);
                self.parts.audio.error();
                self.bus.send_to_ui(event);
            }
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Console
    // -----------------------------------------------------------------------

    fn poll_console(&mut self) {
        for _ in 0..CONSOLE_BYTES_PER_TICK {
            let Some(byte) = self.parts.system.read_console_byte() else {
                break;
            };
            if let Some(command) = self.console.push(byte) {
                self.handle_command(command);
            }
        }
    }

    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::Help => {
                for line in HELP_LINES {
                    info!("{line}");
                }
            }
            Command::Status => self.log_status(),
            Command::Reboot => {
                info!("Rebooting");
                self.parts.system.reboot();
            }
            Command::HardReset => {
                warn!("Factory reset requested");
                self.parts.system.factory_reset();
            }
            Command::GetUuid => self.parts.system.report_device_info(),
            Command::Unknown(text) => {
                warn!("Unknown command '{}', type 'help' for a list", text.as_str());
            }
        }
    }

    fn log_status(&self) {
        let report = self.health_report();
        let network = self.parts.network.state();
        info!("State: {}", report.state.label());
        info!("Uptime: {} s", report.uptime_ms / 1000);
        info!("Coordination cycles: {}", report.coordination_cycles);
        info!("Events processed: {}", report.events_processed);
        info!("Network: {}", network.label());
        if network == NetworkState::Connected {
            info!("  SSID: {}", self.parts.network.ssid());
            info!("  IP: {}", self.parts.network.local_ip());
            if let Some(rssi) = self.parts.network.rssi() {
                info!("  RSSI: {rssi} dBm");
            }
        }
        if let Some(free) = report.free_heap {
            info!("Free heap: {free} bytes");
        }
    }

    // -----------------------------------------------------------------------
    // Health
    // -----------------------------------------------------------------------

    pub fn health_report(&self) -> HealthReport {
        HealthReport {
            state: self.state.current(),
            uptime_ms: self.now().saturating_sub(self.started_at_ms),
            coordination_cycles: self.cycles,
            events_processed: self.events_processed,
            free_heap: self.parts.system.free_heap(),
            bus: self.bus.status(),
        }
    }

    fn log_health(&self) {
        let report = self.health_report();
        info!(
            "Health: state {}, uptime {} s, {} cycles, {} events",
            report.state.label(),
            report.uptime_ms / 1000,
            report.coordination_cycles,
            report.events_processed
        );
        match report.free_heap {
            Some(free) if free < LOW_HEAP_WARNING_BYTES => {
                warn!("Low memory: {free} bytes free");
            }
            Some(free) => debug!("Free heap: {free} bytes"),
            None => {}
        }
        self.bus.log_status();
    }
}
