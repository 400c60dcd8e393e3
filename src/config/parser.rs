use crate::config::{validate, MirrorConfig};
use crate::ConfigResult;
use std::path::Path;

/// Loads and validates a TOML run configuration.
pub fn load_config(path: &Path) -> ConfigResult<MirrorConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: MirrorConfig = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}
