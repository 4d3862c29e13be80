//! Serial console line assembly and command parsing.

use log::warn;

pub const CONSOLE_LINE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Reboot,
    HardReset,
    GetUuid,
    Unknown(heapless::String<CONSOLE_LINE_CAPACITY>),
}

impl Command {
    /// Parse one line. Surrounding whitespace and case are ignored; blank
    /// lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let mut lowered = heapless::String::<CONSOLE_LINE_CAPACITY>::new();
        'chars: for ch in line.chars() {
            for lower in ch.to_lowercase() {
                if lowered.push(lower).is_err() {
                    break 'chars;
                }
            }
        }

        Some(match lowered.as_str() {
            "help" => Self::Help,
            "status" => Self::Status,
            "reboot" => Self::Reboot,
            "hard reset" => Self::HardReset,
            "get uuid" => Self::GetUuid,
            _ => Self::Unknown(lowered),
        })
    }
}

/// Help text printed for `help`.
pub const HELP_LINES: &[&str] = &[
    "Available commands:",
    "  help        - show this list",
    "  status      - system state, uptime and network details",
    "  get uuid    - print the device identity",
    "  reboot      - restart the device",
    "  hard reset  - erase settings and restart",
];

/// Accumulates console bytes into lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    line: heapless::Vec<u8, CONSOLE_LINE_CAPACITY>,
    overflowed: bool,
}

impl LineBuffer {
    pub const fn new() -> Self {
        Self {
            line: heapless::Vec::new(),
            overflowed: false,
        }
    }

    /// Feed one byte. Returns a parsed command when `byte` ends a line.
    pub fn push(&mut self, byte: u8) -> Option<Command> {
        match byte {
            b'\r' | b'\n' => self.finish(),
            _ => {
                if self.line.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    fn finish(&mut self) -> Option<Command> {
        let overflowed = core::mem::take(&mut self.overflowed);
        let command = if overflowed {
            warn!("Console line longer than {CONSOLE_LINE_CAPACITY} bytes discarded");
            None
        } else {
            match core::str::from_utf8(&self.line) {
                Ok(text) => Command::parse(text),
                Err(_) => {
                    warn!("Console line is not valid UTF-8");
                    None
                }
            }
        };
        self.line.clear();
        command
    }
}
