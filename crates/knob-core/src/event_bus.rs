//! Bidirectional event bus between the coordination and render contexts.
//!
//! Two independent bounded FIFO queues, one per direction:
//!
//! ```text
//!   render context ──send_to_main──▶ [main-bound] ──receive_from_ui──▶ coordinator
//!   coordinator    ──send_to_ui────▶ [ui-bound]   ──receive_from_main─▶ render context
//! ```
//!
//! Sending never blocks. A full queue drops the event and bumps a per-direction
//! counter that shows up in [`EventBus::status`]. Receiving is either a poll or
//! waits for at most the given budget.
//!
//! The bus is constructed once by the application root and handed to both
//! contexts by reference; the queues themselves are `embassy_sync` channels
//! behind a critical-section mutex so they are safe across cores.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, with_timeout};
use log::{debug, info, warn};

use crate::event::Event;

/// Default depth of each direction's queue.
pub const EVENT_QUEUE_CAPACITY: usize = 16;

/// Counters for one direction of the bus.
struct Lane<const N: usize> {
    queue: Channel<CriticalSectionRawMutex, Event, N>,
    sent: AtomicU32,
    dropped: AtomicU32,
}

impl<const N: usize> Lane<N> {
    const fn new() -> Self {
        Self {
            queue: Channel::new(),
            sent: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    fn send(&self, event: Event, direction: &str) -> bool {
        match self.queue.try_send(event) {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!("Event queue {direction} full, dropped event ({dropped} total)");
                false
            }
        }
    }

    fn try_receive(&self) -> Option<Event> {
        self.queue.try_receive().ok()
    }

    async fn receive(&self, budget: Duration) -> Option<Event> {
        if let Some(event) = self.try_receive() {
            return Some(event);
        }
        if budget == Duration::from_ticks(0) {
            return None;
        }
        with_timeout(budget, self.queue.receive()).await.ok()
    }

    fn snapshot(&self) -> LaneStatus {
        LaneStatus {
            depth: self.queue.len(),
            capacity: N,
            sent: self.sent.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneStatus {
    pub depth: usize,
    pub capacity: usize,
    pub sent: u32,
    pub dropped: u32,
}

/// Point-in-time view of both queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusStatus {
    /// Events waiting for the render context.
    pub to_ui: LaneStatus,
    /// Events waiting for the coordinator.
    pub to_main: LaneStatus,
}

pub struct EventBus<const N: usize = EVENT_QUEUE_CAPACITY> {
    to_ui: Lane<N>,
    to_main: Lane<N>,
    initialized: AtomicBool,
}

impl<const N: usize> Default for EventBus<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EventBus<N> {
    pub const fn new() -> Self {
        Self {
            to_ui: Lane::new(),
            to_main: Lane::new(),
            initialized: AtomicBool::new(false),
        }
    }

    /// Mark the bus ready for use. Safe to call more than once; returns
    /// `true` only for the call that did the work.
    pub fn initialize(&self) -> bool {
        let first = !self.initialized.swap(true, Ordering::AcqRel);
        if first {
            info!("Event bus initialized ({N} slots per direction)");
        } else {
            debug!("Event bus already initialized");
        }
        first
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Queue an event for the render context. Returns `false` if it was
    /// dropped because the queue was full.
    pub fn send_to_ui(&self, event: Event) -> bool {
        self.to_ui.send(event, "to-ui")
    }

    /// Queue an event for the coordinator. Returns `false` if it was dropped
    /// because the queue was full.
    pub fn send_to_main(&self, event: Event) -> bool {
        self.to_main.send(event, "to-main")
    }

    /// Next event sent by the render context, without waiting.
    pub fn try_receive_from_ui(&self) -> Option<Event> {
        self.to_main.try_receive()
    }

    /// Next event sent by the coordinator, without waiting.
    pub fn try_receive_from_main(&self) -> Option<Event> {
        self.to_ui.try_receive()
    }

    /// Next event sent by the render context, waiting at most `budget`.
    pub async fn receive_from_ui(&self, budget: Duration) -> Option<Event> {
        self.to_main.receive(budget).await
    }

    /// Next event sent by the coordinator, waiting at most `budget`.
    pub async fn receive_from_main(&self, budget: Duration) -> Option<Event> {
        self.to_ui.receive(budget).await
    }

    pub fn status(&self) -> BusStatus {
        BusStatus {
            to_ui: self.to_ui.snapshot(),
            to_main: self.to_main.snapshot(),
        }
    }

    pub fn log_status(&self) {
        let status = self.status();
        info!(
            "Event bus: to-ui {}/{} (sent {}, dropped {}), to-main {}/{} (sent {}, dropped {})",
            status.to_ui.depth,
            status.to_ui.capacity,
            status.to_ui.sent,
            status.to_ui.dropped,
            status.to_main.depth,
            status.to_main.capacity,
            status.to_main.sent,
            status.to_main.dropped,
        );
    }
}
