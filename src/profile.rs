//! Device models and their flash memory layouts
//!
//! The decoders are parametrized by four region base offsets. Each supported device
//! model has a built-in [`MemoryLayout`]; a [`DeviceProfile`] loaded from YAML can
//! override individual regions for firmware revisions that moved them.
//!
//! ```yaml
//! model: rider20
//! layout:
//!   logpoints: 0xAE018
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{DecodeError, Result};

/// Supported device models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum DeviceModel {
    Rider20,
}

impl DeviceModel {
    /// Built-in memory layout for this model.
    pub fn layout(self) -> MemoryLayout {
        match self {
            DeviceModel::Rider20 => MemoryLayout {
                trackpoints: 0x36000 + 24,
                logpoints: 0xAE000 + 24,
                summaries: 0x11000,
                history: 0x8e94,
            },
        }
    }
}

/// Absolute base offsets of the flash regions the decoders read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryLayout {
    /// Base of the trackpoint segment chain region
    pub trackpoints: u32,
    /// Base of the logpoint segment region
    pub logpoints: u32,
    /// Base of the lap and ride summary region
    pub summaries: u32,
    /// Absolute offset of the history table
    pub history: u32,
}

/// Partial layout used to override a model's built-in regions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutOverrides {
    #[serde(default)]
    pub trackpoints: Option<u32>,
    #[serde(default)]
    pub logpoints: Option<u32>,
    #[serde(default)]
    pub summaries: Option<u32>,
    #[serde(default)]
    pub history: Option<u32>,
}

/// Device model plus optional layout overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceProfile {
    pub model: DeviceModel,
    #[serde(default)]
    pub layout: LayoutOverrides,
}

impl From<DeviceModel> for DeviceProfile {
    fn from(model: DeviceModel) -> Self {
        Self { model, layout: LayoutOverrides::default() }
    }
}

impl DeviceProfile {
    /// Parse a profile from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Err(DecodeError::config_error("Profile parsing", "profile YAML is empty"));
        }
        let profile: DeviceProfile = serde_yaml_ng::from_str(yaml)?;
        debug!(model = ?profile.model, overrides = ?profile.layout, "Loaded device profile");
        Ok(profile)
    }

    /// Load a profile from a YAML file.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(&path)
            .map_err(|e| DecodeError::file_error(path.as_ref().to_path_buf(), e))?;
        Self::from_yaml(&yaml)
    }

    /// Effective layout: the model's regions with any overrides applied.
    pub fn layout(&self) -> MemoryLayout {
        let base = self.model.layout();
        MemoryLayout {
            trackpoints: self.layout.trackpoints.unwrap_or(base.trackpoints),
            logpoints: self.layout.logpoints.unwrap_or(base.logpoints),
            summaries: self.layout.summaries.unwrap_or(base.summaries),
            history: self.layout.history.unwrap_or(base.history),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rider20_layout_constants() {
        let layout = DeviceModel::Rider20.layout();
        assert_eq!(layout.trackpoints, 0x36018);
        assert_eq!(layout.logpoints, 0xAE018);
        assert_eq!(layout.summaries, 0x11000);
        assert_eq!(layout.history, 0x8e94);
    }

    #[test]
    fn overrides_replace_only_named_regions() {
        let profile = DeviceProfile::from_yaml("model: rider20\nlayout:\n  summaries: 4096\n")
            .expect("profile should parse");
        let layout = profile.layout();

        assert_eq!(layout.summaries, 4096);
        assert_eq!(layout.trackpoints, DeviceModel::Rider20.layout().trackpoints);
        assert_eq!(layout.history, DeviceModel::Rider20.layout().history);
    }

    #[test]
    fn model_only_profile_uses_builtin_layout() {
        let profile = DeviceProfile::from_yaml("model: rider20").expect("profile should parse");
        assert_eq!(profile, DeviceProfile::from(DeviceModel::Rider20));
        assert_eq!(profile.layout(), DeviceModel::Rider20.layout());
    }

    #[test]
    fn unknown_keys_and_models_are_rejected() {
        let unknown_key = DeviceProfile::from_yaml("model: rider20\nlayout:\n  laps: 1\n");
        assert!(matches!(unknown_key, Err(DecodeError::Config { .. })));

        let unknown_model = DeviceProfile::from_yaml("model: rider99");
        assert!(matches!(unknown_model, Err(DecodeError::Config { .. })));

        let empty = DeviceProfile::from_yaml("   ");
        assert!(matches!(empty, Err(DecodeError::Config { .. })));
    }
}
