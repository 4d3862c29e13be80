//! Fixed-rate drivers for the two scheduled contexts.
//!
//! Both loops use [`Ticker`], so the period is measured deadline to deadline
//! and doesn't stretch with the work done in a tick. They run until `shutdown`
//! is set; firmware passes a flag that is never raised.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use embassy_time::{Duration, Ticker};
use log::{debug, info};

use crate::clock::Clock;
use crate::collaborators::{Display, Platform};
use crate::coordinator::Coordinator;
use crate::error::StartupError;
use crate::input::EncoderInput;
use crate::render::RenderContext;

pub async fn run_coordination_loop<P: Platform, const N: usize>(
    coordinator: &mut Coordinator<'_, P, N>,
    shutdown: &AtomicBool,
) {
    let period = Duration::from_millis(coordinator.config().coordination_period_ms);
    info!("Coordination loop running every {} ms", period.as_millis());

    let mut ticker = Ticker::every(period);
    while !shutdown.load(Ordering::Acquire) {
        coordinator.tick();
        ticker.next().await;
    }
    info!("Coordination loop stopped");
}

pub async fn run_render_loop<E, C, D, const N: usize>(
    context: &mut RenderContext<'_, E, C, D, N>,
    period: Duration,
    shutdown: &AtomicBool,
) where
    E: EncoderInput,
    C: Clock,
    D: Display,
{
    info!("Render loop running every {} ms", period.as_millis());

    context.init();
    let mut ticker = Ticker::every(period);
    while !shutdown.load(Ordering::Acquire) {
        context.tick();
        ticker.next().await;
    }
    info!("Render loop stopped");
}

const STARTUP_PENDING: u8 = 0;
const STARTUP_OK: u8 = 1;
const STARTUP_FAILED: u8 = 2;

/// One-shot report from a context started on another core back to the core
/// that launched it.
///
/// The launching side blocks in [`wait`](Self::wait) inside its spawn closure,
/// so a task that fails to spawn over there still surfaces as an `Err` from
/// [`Coordinator::start_render_context`].
pub struct StartupHandshake {
    status: AtomicU8,
}

impl Default for StartupHandshake {
    fn default() -> Self {
        Self::new()
    }
}

impl StartupHandshake {
    pub const fn new() -> Self {
        Self {
            status: AtomicU8::new(STARTUP_PENDING),
        }
    }

    /// Called once by the started context. Later reports are ignored.
    pub fn report(&self, started: bool) {
        let status = if started { STARTUP_OK } else { STARTUP_FAILED };
        let _ = self.status.compare_exchange(
            STARTUP_PENDING,
            status,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Spin until the other side reports or `timeout_ms` passes on `clock`.
    pub fn wait<C: Clock>(&self, clock: &C, timeout_ms: u64) -> Result<(), StartupError> {
        let since = clock.now_ms();
        loop {
            match self.status.load(Ordering::Acquire) {
                STARTUP_OK => return Ok(()),
                STARTUP_FAILED => return Err(StartupError::Failed),
                _ => {}
            }
            if clock.now_ms().saturating_sub(since) >= timeout_ms {
                debug!("Startup handshake timed out after {timeout_ms} ms");
                return Err(StartupError::TimedOut(timeout_ms));
            }
            core::hint::spin_loop();
        }
    }
}
