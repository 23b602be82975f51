// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use figment::providers::{Env, Format};
use figment::{providers::Toml, Figment};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_PREFIX: &str = "JENKINS_TUI_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    // Server
    pub url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,

    // Tree
    /// How many folder levels one listing request asks the server for.
    pub folder_depth: usize,

    // UI
    pub sidebar_width: u16,
    pub suggestion_limit: usize,
    pub max_typo_cost: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 10,
            folder_depth: 10,
            sidebar_width: 40,
            suggestion_limit: 10,
            max_typo_cost: 2,
        }
    }
}

impl Settings {
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }
}

/// Config and data directories for the application, created if missing.
pub fn get_app_paths() -> Option<(PathBuf, PathBuf)> {
    if let Some(proj_dirs) = ProjectDirs::from("io", "jenkins", "jenkins-tui") {
        let config_dir = proj_dirs.config_dir().to_path_buf();
        let data_dir = proj_dirs.data_local_dir().to_path_buf();

        fs::create_dir_all(&config_dir).ok()?;
        fs::create_dir_all(&data_dir).ok()?;

        Some((config_dir, data_dir))
    } else {
        None
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    get_app_paths().map(|(config_dir, _)| config_dir.join(CONFIG_FILE_NAME))
}

/// Reads the config file (if any) and lets `JENKINS_TUI_*` variables override it.
pub fn load_settings(config_path: Option<PathBuf>) -> Result<Settings, figment::Error> {
    let mut figment = Figment::new();
    if let Some(path) = config_path.or_else(default_config_path) {
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
        .extract()
}

/// Writes the settings next to `path` first and renames, so a crash never leaves half a file.
pub fn save_settings(settings: &Settings, path: &Path) -> io::Result<()> {
    let temp_file_path = path.with_extension("toml.tmp");
    let content = toml::to_string_pretty(settings).map_err(io::Error::other)?;
    fs::write(&temp_file_path, content)?;
    fs::rename(&temp_file_path, path)?;
    Ok(())
}
