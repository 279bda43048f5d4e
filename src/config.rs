use std::fs;
use std::path::Path;

use serde::Deserialize;
use tilemap_atlas::PackConfig;

/// Tool settings, read from an optional TOML file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub atlas: PackConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(p) => {
                let s = fs::read_to_string(p)?;
                Ok(Self::from_toml_str(&s)?)
            }
            None => Ok(Self::default()),
        }
    }
}
