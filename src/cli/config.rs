// FILE: src/cli/config.rs

use crate::config::{CombinatorConfig, MergeConfig};
use crate::error::{CascadeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub merge: Option<MergeConfig>,
    pub combinator: Option<CombinatorConfig>,
    /// Stylesheet directories loaded before every `combine`
    pub css_dirs: Option<Vec<String>>,
    pub strict: Option<bool>,
}

pub fn load(config_path: &str) -> Result<ConfigFile> {
    let config_content = fs::read_to_string(config_path).map_err(|e| {
        CascadeError::FileNotFound {
            path: format!("Config file {}: {}", config_path, e),
        }
    })?;

    let config: ConfigFile = if config_path.ends_with(".json") {
        serde_json::from_str(&config_content).map_err(|e| CascadeError::InvalidFormat {
            message: format!("Invalid JSON config: {}", e),
        })?
    } else if config_path.ends_with(".toml") {
        toml::from_str(&config_content).map_err(|e| CascadeError::InvalidFormat {
            message: format!("Invalid TOML config: {}", e),
        })?
    } else {
        return Err(CascadeError::InvalidFormat {
            message: "Config file must be .json or .toml format".to_string(),
        });
    };

    if let Some(merge) = &config.merge {
        merge.validate()?;
    }
    if let Some(combinator) = &config.combinator {
        combinator.validate()?;
    }
    log::info!("Loaded configuration from {}", config_path);
    Ok(config)
}
