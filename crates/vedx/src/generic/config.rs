use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};

/// Size of push constant block every vendor guarantees.
pub const PORTABLE_PUSH_CONSTANTS_SIZE: u32 = 128;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file")]
    Io(#[from] io::Error),

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

/// Tunables of layout construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Push constant blocks above this size trigger a portability warning.
    pub push_constants_portable_size: u32,

    /// Pool size of descriptor sets declared without explicit one.
    pub default_pool_size: u32,

    /// Emit composition summaries of created layouts.
    pub trace_layouts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            push_constants_portable_size: PORTABLE_PUSH_CONSTANTS_SIZE,
            default_pool_size: 1,
            trace_layouts: true,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path)?;
        Config::from_toml_str(&s)
    }
}
