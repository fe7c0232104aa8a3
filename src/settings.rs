use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::timer::state::NEAR_EXPIRY_SECS;

const DEBUG_ENV: &str = "TREADMILL_DEBUG";
const DEBUG_TICK_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackSettings {
    pub tick_interval_ms: u64,
    pub near_expiry_secs: u32,
    pub bell_enabled: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            near_expiry_secs: NEAR_EXPIRY_SECS,
            bell_enabled: true,
        }
    }
}

impl PlaybackSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    playback: PlaybackSettings,
}

/// Read-only settings loaded from an optional JSON file.
pub struct SettingsStore {
    path: Option<PathBuf>,
    data: UserSettings,
    debug_mode: bool,
}

impl SettingsStore {
    /// Loads settings from `path`. A missing file means defaults; a file that
    /// fails to parse is logged and also falls back to defaults.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            parse_settings(&contents, &path)
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path: Some(path),
            data,
            debug_mode: debug_mode_from_env(),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: UserSettings::default(),
            debug_mode: debug_mode_from_env(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Effective playback settings, with the debug env override applied.
    pub fn playback(&self) -> PlaybackSettings {
        let mut playback = self.data.playback.clone();
        if self.debug_mode {
            playback.tick_interval_ms = DEBUG_TICK_INTERVAL_MS;
        }
        playback
    }
}

fn parse_settings(contents: &str, path: &Path) -> UserSettings {
    serde_json::from_str(contents).unwrap_or_else(|err| {
        warn!(
            "Ignoring malformed settings in {}: {}; using defaults",
            path.display(),
            err
        );
        UserSettings::default()
    })
}

fn debug_mode_from_env() -> bool {
    is_truthy(std::env::var(DEBUG_ENV).ok().as_deref())
}

fn is_truthy(value: Option<&str>) -> bool {
    value
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
