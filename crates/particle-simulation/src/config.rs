//! Engine-wide configuration.

use crate::capability::CalibrationConfig;
use crate::click::ClickConfig;
use crate::clock::ClockConfig;
use crate::view::ZoomConfig;

/// Set to `1`/`true` to skip the startup calibration run.
pub const SKIP_CALIBRATION_ENV: &str = "PARTICLE_LIFE_SKIP_CALIBRATION";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineConfig {
    pub clock: ClockConfig,
    pub calibration: CalibrationConfig,
    pub click: ClickConfig,
    pub zoom: ZoomConfig,
}

impl EngineConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(SKIP_CALIBRATION_ENV) {
            config.apply_skip_calibration(&value);
        }
        config
    }

    fn apply_skip_calibration(&mut self, value: &str) {
        let skip = matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
        if skip {
            log::info!("{SKIP_CALIBRATION_ENV} set, calibration disabled");
            self.calibration.enabled = false;
        }
    }
}
