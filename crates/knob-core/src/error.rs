use thiserror_no_std::Error;

/// Rejected configuration values.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("click timeout ({click_ms} ms) must be shorter than the long-press threshold ({long_ms} ms)")]
    ClickNotBelowLong { click_ms: u32, long_ms: u32 },
    #[error("long-press threshold ({long_ms} ms) must not exceed the ultra-long threshold ({ultra_ms} ms)")]
    LongAboveUltra { long_ms: u32, ultra_ms: u32 },
    #[error("edges per detent must be positive, got {0}")]
    NonPositiveEdgesPerDetent(i32),
    #[error("{0} period must be non-zero")]
    ZeroPeriod(&'static str),
}

/// Why a context launched on another core did not come up.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupError {
    #[error("the context reported a failed start")]
    Failed,
    #[error("no start report within {0} ms")]
    TimedOut(u64),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("failed to start the render context")]
    ContextSpawn,
}
