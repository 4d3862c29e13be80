//! Desktop runner for the knob interface core.
//!
//! Runs the coordination loop on the main thread and the render loop on a
//! second thread, exactly as the firmware runs them on its two cores, against a
//! simulated encoder, WiFi manager and feedback devices that log instead of
//! lighting up.
//!
//! # Commands (stdin)
//!
//! | Line          | Action                                   |
//! |---------------|------------------------------------------|
//! | `:press`      | Hold the knob button down                |
//! | `:release`    | Let go of the button                     |
//! | `:click`      | Press and release (80 ms)                |
//! | `:rotate <n>` | Turn `n` detents (negative = backwards)  |
//! | `:client`     | A phone joins the setup access point     |
//! | `:noclient`   | The phone leaves                         |
//! | `:quit`       | Stop the simulator                       |
//!
//! Any other line goes to the device console (`help`, `status`, ...).

mod feedback;
mod hardware;

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration as StdDuration;

use anyhow::{Context, anyhow};
use clap::Parser;
use embassy_futures::block_on;
use embassy_time::Duration;
use log::{info, warn};

use knob_core::collaborators::{Collaborators, Platform};
use knob_core::runtime::{run_coordination_loop, run_render_loop};
use knob_core::{Coordinator, CoreConfig, EmbassyClock, EventBus, GestureRecognizer, RenderContext};

use feedback::{LogApp, LogAudio, LogDisplay, LogLed, LogPortal, SimSystem};
use hardware::{SimKnob, SimNetwork};

#[derive(Parser, Debug)]
#[command(name = "knob-simulator", about = "Run the knob interface core on the desktop")]
struct Args {
    /// TOML file with core settings; missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the WiFi hand-off and go straight to running.
    #[arg(long)]
    offline: bool,

    /// Make the simulated WiFi connection time out, forcing access-point setup.
    #[arg(long)]
    fail_wifi: bool,

    /// How long the simulated connection attempt takes.
    #[arg(long, default_value_t = 1500)]
    connect_delay_ms: u64,

    /// Stop after this many seconds instead of waiting for `:quit`.
    #[arg(long)]
    run_secs: Option<u64>,
}

struct SimPlatform;

impl Platform for SimPlatform {
    type Clock = EmbassyClock;
    type Led = LogLed;
    type Network = SimNetwork;
    type Web = LogPortal;
    type App = LogApp;
    type Audio = LogAudio;
    type System = SimSystem;
}

fn load_config(path: Option<&Path>, offline: bool) -> anyhow::Result<CoreConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => CoreConfig::default(),
    };
    if offline {
        config.wifi_required = false;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref(), args.offline)?;
    info!("Starting knob simulator with {config:?}");

    let bus: EventBus = EventBus::new();
    let shutdown = Arc::new(AtomicBool::new(false));
    let knob = SimKnob::default();
    let ap_client = Arc::new(AtomicBool::new(false));
    let (console_tx, console_rx) = mpsc::channel();

    spawn_stdin_reader(knob.clone(), ap_client.clone(), console_tx, shutdown.clone())?;
    if let Some(secs) = args.run_secs {
        let shutdown = shutdown.clone();
        thread::spawn(move || {
            thread::sleep(StdDuration::from_secs(secs));
            shutdown.store(true, Ordering::Release);
        });
    }

    let parts = Collaborators::<SimPlatform> {
        clock: EmbassyClock,
        led: LogLed,
        network: SimNetwork::new(
            Duration::from_millis(args.connect_delay_ms),
            args.fail_wifi,
            ap_client,
        ),
        web: LogPortal,
        app: LogApp,
        audio: LogAudio,
        system: SimSystem::new(console_rx, shutdown.clone()),
    };
    let mut coordinator = Coordinator::new(config, &bus, parts).map_err(|err| anyhow!("{err}"))?;
    coordinator.initialize();
    let recognizer = GestureRecognizer::new(knob, EmbassyClock, config.gesture)
        .map_err(|err| anyhow!("invalid configuration: {err}"))?;

    thread::scope(|scope| {
        let render_period = Duration::from_millis(config.render_period_ms);
        let bus = &bus;
        let shutdown = &*shutdown;

        let started = coordinator.start_render_context(|| {
            thread::Builder::new()
                .name("render".into())
                .spawn_scoped(scope, move || {
                    let mut render = RenderContext::new(recognizer, LogDisplay::new(), bus);
                    block_on(run_render_loop(&mut render, render_period, shutdown));
                })
                .map(|_| ())
        });
        if started.is_err() {
            warn!("Render context unavailable; input will not be processed");
        }

        block_on(run_coordination_loop(&mut coordinator, shutdown));
        // Unblocks the render loop if the coordinator stopped for another reason.
        shutdown.store(true, Ordering::Release);
    });

    let report = coordinator.health_report();
    info!(
        "Simulator stopped in {} after {} cycles, {} events processed",
        report.state.label(),
        report.coordination_cycles,
        report.events_processed
    );
    bus.log_status();
    Ok(())
}

fn spawn_stdin_reader(
    knob: SimKnob,
    ap_client: Arc<AtomicBool>,
    console: Sender<u8>,
    shutdown: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if !handle_line(line.trim(), &knob, &ap_client, &console, &shutdown) {
                    break;
                }
            }
        })
        .context("spawning stdin reader")?;
    Ok(())
}

/// Returns false once the reader should stop.
fn handle_line(
    line: &str,
    knob: &SimKnob,
    ap_client: &AtomicBool,
    console: &Sender<u8>,
    shutdown: &AtomicBool,
) -> bool {
    let mut words = line.split_whitespace();
    match words.next() {
        Some(":press") => knob.set_pressed(true),
        Some(":release") => knob.set_pressed(false),
        Some(":click") => {
            knob.set_pressed(true);
            thread::sleep(StdDuration::from_millis(80));
            knob.set_pressed(false);
        }
        Some(":rotate") => match words.next().map(str::parse::<i32>) {
            Some(Ok(detents)) => knob.turn(detents),
            _ => warn!("usage: :rotate <detents>"),
        },
        Some(":client") => ap_client.store(true, Ordering::Relaxed),
        Some(":noclient") => ap_client.store(false, Ordering::Relaxed),
        Some(":quit") => {
            shutdown.store(true, Ordering::Release);
            return false;
        }
        _ => {
            for byte in line.bytes().chain(core::iter::once(b'\n')) {
                if console.send(byte).is_err() {
                    return false;
                }
            }
        }
    }
    true
}
