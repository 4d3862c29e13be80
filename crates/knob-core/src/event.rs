//! Event values exchanged between the coordination and render contexts.

use core::fmt::Write;

/// Maximum byte length of an event's text payload.
pub const EVENT_TEXT_CAPACITY: usize = 64;

/// Bounded text payload carried by display events.
pub type EventText = heapless::String<EVENT_TEXT_CAPACITY>;

/// Every kind of event the core produces or reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // Encoder gestures (render -> coordination)
    EncoderRotation,
    EncoderClick,
    EncoderDoubleClick,
    EncoderLongPress,
    EncoderUltraLongPress,
    EncoderPressAndRotate,
    EncoderPressTime,
    EncoderButtonReleased,

    // Network lifecycle (coordination -> application)
    WifiConnecting,
    WifiConnected,
    WifiDisconnected,

    // Display requests (coordination -> render)
    DisplayWifiConnecting,
    DisplayWifiApMode,
    DisplayWifiSetupUrl,
    DisplayWakeUp,
    DisplayHome,

    BootingComplete,
}

impl EventKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::EncoderRotation => "encoder-rotation",
            Self::EncoderClick => "encoder-click",
            Self::EncoderDoubleClick => "encoder-double-click",
            Self::EncoderLongPress => "encoder-long-press",
            Self::EncoderUltraLongPress => "encoder-ultra-long-press",
            Self::EncoderPressAndRotate => "encoder-press-and-rotate",
            Self::EncoderPressTime => "encoder-press-time",
            Self::EncoderButtonReleased => "encoder-button-released",
            Self::WifiConnecting => "wifi-connecting",
            Self::WifiConnected => "wifi-connected",
            Self::WifiDisconnected => "wifi-disconnected",
            Self::DisplayWifiConnecting => "display-wifi-connecting",
            Self::DisplayWifiApMode => "display-wifi-ap-mode",
            Self::DisplayWifiSetupUrl => "display-wifi-setup-url",
            Self::DisplayWakeUp => "display-wake-up",
            Self::DisplayHome => "display-home",
            Self::BootingComplete => "booting-complete",
        }
    }

}

/// An immutable event: a kind tag with at most one payload.
///
/// Constructors only ever set one of the integer or text payloads. Events are
/// cloned by value into the bus, so nothing is shared between contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    kind: EventKind,
    value: Option<i32>,
    text: Option<EventText>,
}

impl Event {
    pub const fn new(kind: EventKind) -> Self {
        Self {
            kind,
            value: None,
            text: None,
        }
    }

    pub const fn with_value(kind: EventKind, value: i32) -> Self {
        Self {
            kind,
            value: Some(value),
            text: None,
        }
    }

    /// Build an event with a text payload, truncating at a character boundary
    /// when `text` exceeds [`EVENT_TEXT_CAPACITY`].
    pub fn with_text(kind: EventKind, text: &str) -> Self {
        Self {
            kind,
            value: None,
            text: Some(truncated(text)),
        }
    }

    /// Build an event whose text payload is produced by `format_args!`.
    pub fn with_formatted(kind: EventKind, args: core::fmt::Arguments<'_>) -> Self {
        let mut writer = TruncatingWriter::default();
        // The writer never reports an error; overflow just stops appending.
        let _ = writer.write_fmt(args);
        Self {
            kind,
            value: None,
            text: Some(writer.text),
        }
    }

    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    pub const fn value(&self) -> Option<i32> {
        self.value
    }

    /// Integer payload, or zero when absent.
    pub fn value_or_zero(&self) -> i32 {
        self.value.unwrap_or(0)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

fn truncated(text: &str) -> EventText {
    let mut writer = TruncatingWriter::default();
    let _ = writer.write_str(text);
    writer.text
}

/// Keeps the longest prefix that fits; once one character is refused nothing
/// more is appended, even if a later one would fit.
#[derive(Default)]
struct TruncatingWriter {
    text: EventText,
    full: bool,
}

impl Write for TruncatingWriter {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        if self.full {
            return Ok(());
        }
        for ch in s.chars() {
            if self.text.push(ch).is_err() {
                self.full = true;
                break;
            }
        }
        Ok(())
    }
}
