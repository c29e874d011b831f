use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating a [`WorldConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("window dimensions must be finite and positive, got {width}x{height}")]
    InvalidWindow { width: f32, height: f32 },
}

/// Size of the host window in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: f32,
    pub height: f32,
}

impl WindowSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Horizontal midpoint of the initial window (the spawn column).
    pub fn midpoint_x(&self) -> f32 {
        self.width * 0.5
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// The only external inputs of the generator, fixed for a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub seed: i64,
    #[serde(default)]
    pub window: WindowSize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 1000,
            window: WindowSize::default(),
        }
    }
}

impl WorldConfig {
    pub fn new(seed: i64, window: WindowSize) -> Self {
        Self { seed, window }
    }

    /// Reject configurations no generator can be built from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let WindowSize { width, height } = self.window;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::InvalidWindow { width, height });
        }
        Ok(())
    }

    /// Load and validate a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the config to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = WorldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window.midpoint_x(), 400.0);
    }

    #[test]
    fn rejects_degenerate_window() {
        let config = WorldConfig::new(1, WindowSize::new(0.0, 600.0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWindow { .. })
        ));

        let config = WorldConfig::new(1, WindowSize::new(800.0, f32::NAN));
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let config = WorldConfig::new(77, WindowSize::new(1024.0, 768.0));
        config.save(tmp.path()).unwrap();

        let loaded = WorldConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn window_defaults_when_missing() {
        let config: WorldConfig = serde_json::from_str(r#"{ "seed": 5 }"#).unwrap();
        assert_eq!(config.seed, 5);
        assert_eq!(config.window, WindowSize::default());
    }

    #[test]
    fn load_rejects_invalid_window() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            r#"{ "seed": 5, "window": { "width": -1.0, "height": 600.0 } }"#,
        )
        .unwrap();
        assert!(matches!(
            WorldConfig::load(tmp.path()),
            Err(ConfigError::InvalidWindow { .. })
        ));
    }
}
