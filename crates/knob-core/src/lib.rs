//! Hardware-independent core library for the knob interface device.
//!
//! This crate contains everything that doesn't touch the ESP32-S3 peripherals
//! directly: the gesture recognizer that turns encoder and button samples into
//! discrete events, the bidirectional event bus between the two scheduled
//! contexts, and the system coordinator that sequences boot, network hand-off
//! and user-input reactions.
//!
//! Board-specific code lives in `knob-firmware` and the desktop runner lives in
//! `knob-simulator`. Both talk to the core through the traits in
//! [`collaborators`] and [`input`].

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod collaborators;
pub mod config;
pub mod console;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod input;
pub mod network;
pub mod render;
pub mod runtime;
pub mod state;

pub use clock::{Clock, EmbassyClock};
pub use config::{CoreConfig, GestureConfig};
pub use coordinator::Coordinator;
pub use error::{ConfigError, CoreError, StartupError};
pub use event::{Event, EventKind};
pub use event_bus::{BusStatus, EventBus};
pub use input::{EncoderInput, GestureRecognizer, Level};
pub use render::RenderContext;
pub use state::SystemState;
