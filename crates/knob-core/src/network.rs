//! Network state as reported by the WiFi collaborator, and the edge
//! detectors the coordinator uses to react to it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    Disconnected,
    Connecting,
    Connected,
    CredentialNotFound,
    Timeout,
    Error,
    ApMode,
}

impl NetworkState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::CredentialNotFound => "credential-not-found",
            Self::Timeout => "timeout",
            Self::Error => "error",
            Self::ApMode => "ap-mode",
        }
    }

    /// States that send the device into access-point setup.
    pub const fn needs_setup(self) -> bool {
        matches!(self, Self::CredentialNotFound | Self::Timeout | Self::Error)
    }
}

/// Reports a network state only when it differs from the last one seen.
#[derive(Debug, Clone, Copy)]
pub struct StateWatch {
    last: NetworkState,
}

impl Default for StateWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl StateWatch {
    /// Starts out assuming `Disconnected`, so an initial `Disconnected` is not a change.
    pub const fn new() -> Self {
        Self {
            last: NetworkState::Disconnected,
        }
    }

    pub fn observe(&mut self, state: NetworkState) -> Option<NetworkState> {
        if state == self.last {
            return None;
        }
        self.last = state;
        Some(state)
    }
}

/// Rising-edge detector for "a client joined the setup access point".
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientWatch {
    had_client: bool,
}

impl ClientWatch {
    pub const fn new() -> Self {
        Self { had_client: false }
    }

    /// True only on the sample where a client newly appears. Re-arms once the
    /// client leaves.
    pub fn observe(&mut self, has_client: bool) -> bool {
        let joined = has_client && !self.had_client;
        self.had_client = has_client;
        joined
    }
}
