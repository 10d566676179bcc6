use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors from loading a renderer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid renderer config: {0}")]
    Invalid(&'static str),
}

/// Batch capacities, fixed when a renderer is constructed.
///
/// Missing fields in a config file take their default values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Quads per 2D batch; vertex and index limits derive from it.
    pub max_quads: u32,
    /// Texture slots per 2D batch, including the white texture in slot 0.
    pub max_texture_slots: u32,
    /// Instances per 3D primitive per batch.
    pub max_instances: u32,
    /// Line width used when line batches are flushed.
    pub line_width: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_quads: 20_000,
            max_texture_slots: 32,
            max_instances: 10_000,
            line_width: 2.0,
        }
    }
}

impl RendererConfig {
    pub fn max_vertices(&self) -> u32 {
        self.max_quads * 4
    }

    pub fn max_indices(&self) -> u32 {
        self.max_quads * 6
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_quads == 0 {
            return Err(ConfigError::Invalid("max_quads must be at least 1"));
        }
        if self.max_texture_slots < 2 {
            return Err(ConfigError::Invalid("max_texture_slots must be at least 2"));
        }
        if self.max_instances == 0 {
            return Err(ConfigError::Invalid("max_instances must be at least 1"));
        }
        Ok(())
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RendererConfig::default();
        assert_eq!(config.max_vertices(), 80_000);
        assert_eq!(config.max_indices(), 120_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = RendererConfig::from_yaml("max_quads: 8\n").unwrap();
        assert_eq!(config.max_quads, 8);
        assert_eq!(config.max_texture_slots, 32);
        assert_eq!(config.line_width, 2.0);
    }

    #[test]
    fn rejects_single_texture_slot() {
        let err = RendererConfig::from_yaml("max_texture_slots: 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "max_instances: 3\nline_width: 1.5\n").unwrap();
        let config = RendererConfig::load(tmp.path()).unwrap();
        assert_eq!(config.max_instances, 3);
        assert_eq!(config.line_width, 1.5);
    }
}
