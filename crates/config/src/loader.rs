use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::MerchbellConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "merchbell.toml",
    "merchbell.yaml",
    "merchbell.yml",
    "merchbell.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<MerchbellConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::message(format!("failed to read {}: {e}", path.display())))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./merchbell.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/merchbell/merchbell.{toml,yaml,yml,json}` (user-global)
///
/// Returns `MerchbellConfig::default()` if no config file is found.
pub fn discover_and_load() -> MerchbellConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    MerchbellConfig::default()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/merchbell/
    if let Some(dirs) = directories::ProjectDirs::from("", "", "merchbell") {
        let config_dir = dirs.config_dir();
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/merchbell/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "merchbell").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<MerchbellConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::message(format!("unsupported config format: .{ext}"))),
    }
}
