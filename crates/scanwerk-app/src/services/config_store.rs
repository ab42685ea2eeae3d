// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Config file persistence.

use std::path::{Path, PathBuf};

use scanwerk_core::config::AcquireConfig;
use scanwerk_core::error::Result;
use tracing::{info, warn};

pub const CONFIG_FILE: &str = "config.json";

/// Default location of the config file inside `data_dir`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Read and validate the config at `path`. `Ok(None)` if there is no file.
pub fn load_config(path: &Path) -> Result<Option<AcquireConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    let config: AcquireConfig = serde_json::from_str(&data)?;
    config.validate()?;
    Ok(Some(config))
}

/// The config at `path`, or the defaults when it is missing or unusable.
pub fn load_or_default(path: &Path) -> AcquireConfig {
    match load_config(path) {
        Ok(Some(config)) => {
            info!(path = %path.display(), "config loaded");
            config
        }
        Ok(None) => AcquireConfig::default(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "config ignored, using defaults");
            AcquireConfig::default()
        }
    }
}

pub fn persist_config(path: &Path, config: &AcquireConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}
