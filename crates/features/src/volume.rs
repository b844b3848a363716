//! Abnormal trading volume.

use dynafactor_math::RollingWindow;
use dynafactor_primitives::{AssetFrame, columns::VOLUME};
use dynafactor_traits::{ConfigurableFeature, Feature, FeatureColumns, FeatureError, FeatureKind};
use serde::{Deserialize, Serialize};

use crate::series::{input, positive};

/// Configuration for [`VolumeShock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeShockConfig {
    /// One `vol_shock_{W}` column per window.
    pub windows: Vec<RollingWindow>,
}

impl Default for VolumeShockConfig {
    fn default() -> Self {
        Self { windows: vec![RollingWindow::new(15, 10), RollingWindow::new(30, 20)] }
    }
}

/// Log volume in excess of its trailing mean, `vol_shock_{W}`.
///
/// The trailing mean includes the current row. Non-positive volume is
/// missing before the logarithm, so the shock is missing on such rows.
#[derive(Debug, Clone)]
pub struct VolumeShock {
    config: VolumeShockConfig,
}

impl VolumeShock {
    /// Create the feature with the default windows.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(VolumeShockConfig::default())
    }
}

impl Default for VolumeShock {
    fn default() -> Self {
        Self::new()
    }
}

impl Feature for VolumeShock {
    fn name(&self) -> &str {
        "volume_shock"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::Volume
    }

    fn required_columns(&self) -> Vec<String> {
        vec![VOLUME.to_string()]
    }

    fn output_columns(&self) -> Vec<String> {
        self.config.windows.iter().map(|w| format!("vol_shock_{}", w.window)).collect()
    }

    fn compute(&self, frame: &AssetFrame) -> Result<FeatureColumns, FeatureError> {
        let log_volume = positive(input(frame, VOLUME)?).mapv(f64::ln);

        self.config
            .windows
            .iter()
            .map(|window| {
                window.validate().map_err(|e| FeatureError::InvalidConfig(e.to_string()))?;
                let shock = &log_volume - &window.mean(&log_volume);
                Ok((format!("vol_shock_{}", window.window), shock))
            })
            .collect()
    }
}

impl ConfigurableFeature for VolumeShock {
    type Config = VolumeShockConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}
