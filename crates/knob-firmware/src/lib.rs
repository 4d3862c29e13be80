//! Board support for the knob device on the ESP32-S3.
//!
//! The encoder is decoded in hardware by PCNT unit 0; the push-button is a
//! plain GPIO with the internal pull-up. The console rides on an RTT down
//! channel next to the RTT log output.

#![no_std]

pub mod encoder;
pub mod system;

use knob_core::EmbassyClock;
use knob_core::collaborators::Platform;

pub use encoder::PcntEncoder;
pub use system::EspSystem;

/// Collaborators available on this board. LED ring, WiFi, audio and the
/// application layer are not wired up yet and run as no-ops.
pub struct Board;

impl Platform for Board {
    type Clock = EmbassyClock;
    type Led = ();
    type Network = ();
    type Web = ();
    type App = ();
    type Audio = ();
    type System = EspSystem;
}

pub type BoardRenderContext = knob_core::RenderContext<'static, PcntEncoder, EmbassyClock, ()>;
