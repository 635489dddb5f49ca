//! Loading [`Config`] from TOML.

pub use cf_core::config::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Locations searched, in order, when no config file is given.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./clipforge.toml",
    "~/.config/clipforge/config.toml",
    "/etc/clipforge/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);

    let warnings = config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;
    for warning in warnings {
        tracing::warn!("{warning}");
    }

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    if let Some(path) = find_default_config() {
        return load_config(&path);
    }

    Ok(Config::default())
}

/// The first default location that exists.
pub fn find_default_config() -> Option<PathBuf> {
    DEFAULT_CONFIG_PATHS
        .iter()
        .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
        .find(|p| p.exists())
}

/// Expand `~` in every configured path.
fn expand_paths(config: &mut Config) {
    let expand = |p: &mut Option<PathBuf>| {
        if let Some(path) = p.as_mut() {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            *path = PathBuf::from(expanded);
        }
    };
    expand(&mut config.work_dir);
    expand(&mut config.tools.ffmpeg_path);
    expand(&mut config.tools.ffprobe_path);
}
