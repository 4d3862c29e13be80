#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::sync::atomic::AtomicBool;

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::interrupt::software::SoftwareInterruptControl;
use esp_hal::pcnt::{Pcnt, channel};
use esp_hal::system::Stack;
use esp_hal::timer::timg::TimerGroup;
use esp_rtos::embassy::Executor;
use log::{error, info};
use static_cell::StaticCell;

use knob_core::collaborators::Collaborators;
use knob_core::runtime::{StartupHandshake, run_coordination_loop, run_render_loop};
use knob_core::{Coordinator, CoreConfig, EmbassyClock, EventBus, GestureRecognizer, RenderContext};
use knob_firmware::{Board, BoardRenderContext, EspSystem, PcntEncoder};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Glitch filter for the encoder inputs, in APB clock cycles.
const ENCODER_FILTER_CYCLES: u16 = 1000;

/// How long core 0 waits for core 1 to report the render task spawn.
const RENDER_START_TIMEOUT_MS: u64 = 1000;

struct EncoderPins {
    a: Input<'static>,
    b: Input<'static>,
}

static EVENT_BUS: StaticCell<EventBus> = StaticCell::new();
static ENCODER_PINS: StaticCell<EncoderPins> = StaticCell::new();
static PCNT: StaticCell<Pcnt<'static>> = StaticCell::new();
static RENDER_CONTEXT: StaticCell<BoardRenderContext> = StaticCell::new();
static APP_CORE_STACK: StaticCell<Stack<8192>> = StaticCell::new();
static APP_CORE_EXECUTOR: StaticCell<Executor> = StaticCell::new();

/// Both loops run for the life of the device; nothing raises this.
static SHUTDOWN: AtomicBool = AtomicBool::new(false);
static RENDER_STARTUP: StartupHandshake = StartupHandshake::new();

#[embassy_executor::task]
async fn render_task(context: &'static mut BoardRenderContext, period: Duration) {
    run_render_loop(context, period, &SHUTDOWN).await;
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    let channels = rtt_target::rtt_init! {
        up: {
            0: {
                size: 1024,
                name: "Terminal"
            }
        }
        down: {
            0: {
                size: 64,
                name: "Console"
            }
        }
    };
    rtt_target::set_print_channel(channels.up.0);
    rtt_target::init_logger();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);
    info!("Embassy initialized");

    // No network manager on this board yet, so skip the WiFi hand-off.
    let config = CoreConfig {
        wifi_required: false,
        ..CoreConfig::default()
    };

    // Encoder: hardware quadrature decoding via PCNT unit0.
    let input_cfg = InputConfig::default().with_pull(Pull::Up);
    let pins = ENCODER_PINS.init(EncoderPins {
        a: Input::new(peripherals.GPIO16, input_cfg),
        b: Input::new(peripherals.GPIO17, input_cfg),
    });
    let button = Input::new(peripherals.GPIO18, input_cfg);

    let pcnt = PCNT.init(Pcnt::new(peripherals.PCNT));
    let unit = &pcnt.unit0;
    unit.set_filter(Some(ENCODER_FILTER_CYCLES))
        .expect("encoder filter");
    unit.clear();

    let enc_a = pins.a.peripheral_input();
    let enc_b = pins.b.peripheral_input();

    let ch0 = &unit.channel0;
    ch0.set_ctrl_signal(enc_a.clone());
    ch0.set_edge_signal(enc_b.clone());
    ch0.set_ctrl_mode(channel::CtrlMode::Reverse, channel::CtrlMode::Keep);
    ch0.set_input_mode(channel::EdgeMode::Increment, channel::EdgeMode::Decrement);

    let ch1 = &unit.channel1;
    ch1.set_ctrl_signal(enc_b);
    ch1.set_edge_signal(enc_a);
    ch1.set_ctrl_mode(channel::CtrlMode::Reverse, channel::CtrlMode::Keep);
    ch1.set_input_mode(channel::EdgeMode::Decrement, channel::EdgeMode::Increment);

    unit.resume();
    info!("Encoder configured on PCNT unit0");

    let encoder = PcntEncoder::new(unit.counter.clone(), button);

    // Shared bus, then the coordinator (core 0) and render context (core 1).
    let bus: &'static EventBus = EVENT_BUS.init(EventBus::new());

    let parts = Collaborators::<Board> {
        clock: EmbassyClock,
        led: (),
        network: (),
        web: (),
        app: (),
        audio: (),
        system: EspSystem::new(channels.down.0),
    };
    let mut coordinator = Coordinator::new(config, bus, parts).expect("valid configuration");
    coordinator.initialize();

    let recognizer =
        GestureRecognizer::new(encoder, EmbassyClock, config.gesture).expect("valid gesture config");
    let render = RENDER_CONTEXT.init(RenderContext::new(recognizer, (), bus));
    let render_period = Duration::from_millis(config.render_period_ms);

    let sw_int = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    let cpu_ctrl = peripherals.CPU_CTRL;
    let started = coordinator.start_render_context(|| {
        let stack = APP_CORE_STACK.init(Stack::new());
        esp_rtos::start_second_core(cpu_ctrl, sw_int.software_interrupt0, stack, move || {
            let executor = APP_CORE_EXECUTOR.init(Executor::new());
            executor.run(|spawner| {
                let spawned = spawner.spawn(render_task(render, render_period));
                if let Err(err) = &spawned {
                    error!("Failed to spawn render task: {err:?}");
                }
                RENDER_STARTUP.report(spawned.is_ok());
            })
        });
        RENDER_STARTUP.wait(&EmbassyClock, RENDER_START_TIMEOUT_MS)
    });
    if started.is_err() {
        error!("Render context failed to start; input is disabled");
    }

    run_coordination_loop(&mut coordinator, &SHUTDOWN).await;

    // Only reachable if the shutdown flag is ever raised.
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}
