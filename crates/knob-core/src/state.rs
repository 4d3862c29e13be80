//! Top-level system state.

use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    Booting,
    Initializing,
    WifiConnecting,
    WifiApMode,
    Ready,
    Running,
    Error,
}

impl SystemState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Booting => "BOOTING",
            Self::Initializing => "INITIALIZING",
            Self::WifiConnecting => "WIFI_CONNECTING",
            Self::WifiApMode => "WIFI_AP_MODE",
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Error => "ERROR",
        }
    }
}

/// The current [`SystemState`] and when it was entered.
#[derive(Debug, Clone, Copy)]
pub struct StateMachine {
    current: SystemState,
    entered_at_ms: u64,
}

impl StateMachine {
    pub const fn new(initial: SystemState, now_ms: u64) -> Self {
        Self {
            current: initial,
            entered_at_ms: now_ms,
        }
    }

    pub const fn current(&self) -> SystemState {
        self.current
    }

    pub const fn entered_at_ms(&self) -> u64 {
        self.entered_at_ms
    }

    pub fn time_in_state(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.entered_at_ms)
    }

    /// Move to `next`. Re-entering the current state does nothing and keeps
    /// the original entry time. Returns whether a transition happened.
    pub fn transition_to(&mut self, next: SystemState, now_ms: u64) -> bool {
        if next == self.current {
            return false;
        }
        info!(
            "System state: {} -> {}",
            self.current.label(),
            next.label()
        );
        self.current = next;
        self.entered_at_ms = now_ms;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_records_entry_time() {
        let mut sm = StateMachine::new(SystemState::Booting, 0);
        assert!(sm.transition_to(SystemState::Initializing, 4000));
        assert_eq!(sm.current(), SystemState::Initializing);
        assert_eq!(sm.entered_at_ms(), 4000);
        assert_eq!(sm.time_in_state(4500), 500);
    }

    #[test]
    fn test_self_transition_is_noop() {
        let mut sm = StateMachine::new(SystemState::Ready, 100);
        assert!(!sm.transition_to(SystemState::Ready, 900));
        assert_eq!(sm.entered_at_ms(), 100);
    }
}
