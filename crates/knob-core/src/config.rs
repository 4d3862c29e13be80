//! Tunable timing for gestures and the two scheduled contexts.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Thresholds that decide which gesture a press/release cycle becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// A release shorter than this counts as a click.
    pub click_timeout_ms: u32,
    /// A hold at least this long counts as a long press.
    pub long_press_ms: u32,
    /// A hold at least this long counts as an ultra-long press.
    pub ultra_long_press_ms: u32,
    /// How long after a click release a second click still pairs with it.
    pub double_click_window_ms: u32,
    /// Raw quadrature edges per mechanical detent.
    pub edges_per_detent: i32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            click_timeout_ms: 500,
            long_press_ms: 1000,
            ultra_long_press_ms: 3000,
            double_click_window_ms: 400,
            edges_per_detent: 4,
        }
    }
}

impl GestureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.click_timeout_ms >= self.long_press_ms {
            return Err(ConfigError::ClickNotBelowLong {
                click_ms: self.click_timeout_ms,
                long_ms: self.long_press_ms,
            });
        }
        if self.long_press_ms > self.ultra_long_press_ms {
            return Err(ConfigError::LongAboveUltra {
                long_ms: self.long_press_ms,
                ultra_ms: self.ultra_long_press_ms,
            });
        }
        if self.edges_per_detent <= 0 {
            return Err(ConfigError::NonPositiveEdgesPerDetent(self.edges_per_detent));
        }
        Ok(())
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Time spent in `Booting` before initialization starts.
    pub boot_delay_ms: u64,
    /// When false the device skips the network hand-off and goes straight to `Ready`.
    pub wifi_required: bool,
    /// Period of the coordination loop.
    pub coordination_period_ms: u64,
    /// Period of the render loop (~30 FPS by default).
    pub render_period_ms: u64,
    /// Interval between health reports.
    pub health_interval_ms: u64,
    pub gesture: GestureConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            boot_delay_ms: 4000,
            wifi_required: true,
            coordination_period_ms: 50,
            render_period_ms: 33,
            health_interval_ms: 5000,
            gesture: GestureConfig::default(),
        }
    }
}

impl CoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.coordination_period_ms == 0 {
            return Err(ConfigError::ZeroPeriod("coordination"));
        }
        if self.render_period_ms == 0 {
            return Err(ConfigError::ZeroPeriod("render"));
        }
        if self.health_interval_ms == 0 {
            return Err(ConfigError::ZeroPeriod("health"));
        }
        self.gesture.validate()
    }
}
