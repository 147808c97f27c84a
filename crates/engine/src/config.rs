use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::atomic_io::write_text_atomic;
use crate::app::PacerSettings;

pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Persistent client settings. Missing fields take their defaults so older
/// settings files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub gfx_max_fps: u32,
    pub gfx_limit_fps: bool,
    pub gfx_vsync: bool,
    pub gfx_async_render: bool,
    pub gfx_fullscreen: bool,
    pub gfx_borderless: bool,
    pub gfx_screen: usize,
    pub gfx_screen_width: u32,
    pub gfx_screen_height: u32,
    /// Milliseconds slept at the end of every loop iteration.
    pub cl_cpu_throttle: u64,
    pub cl_auto_screenshot: bool,
    pub cl_auto_statscreenshot: bool,
    /// Auto screenshots kept per prefix; 0 keeps everything.
    pub cl_auto_screenshot_max: usize,
    pub debug: bool,
    pub dbg_graphs: bool,
    pub dbg_focus: bool,
    pub dbg_stress: bool,
    /// One-shot stall in milliseconds, cleared after it fires.
    pub dbg_hitch: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gfx_max_fps: 144,
            gfx_limit_fps: true,
            gfx_vsync: false,
            gfx_async_render: false,
            gfx_fullscreen: false,
            gfx_borderless: false,
            gfx_screen: 0,
            gfx_screen_width: 1280,
            gfx_screen_height: 720,
            cl_cpu_throttle: 0,
            cl_auto_screenshot: false,
            cl_auto_statscreenshot: false,
            cl_auto_screenshot_max: 10,
            debug: false,
            dbg_graphs: false,
            dbg_focus: false,
            dbg_stress: false,
            dbg_hitch: 0,
        }
    }
}

impl ClientConfig {
    pub fn pacer_settings(&self) -> PacerSettings {
        PacerSettings {
            max_fps: self.gfx_max_fps,
            vsync: self.gfx_vsync,
            limit_fps: self.gfx_limit_fps,
            debug: self.debug,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings file {path} at {field}: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// `Ok(None)` when no settings file exists yet.
pub fn load_config(path: &Path) -> Result<Option<ClientConfig>, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_config(path, &raw).map(Some)
}

fn parse_config(path: &Path, raw: &str) -> Result<ClientConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, ClientConfig>(&mut deserializer).map_err(|error| {
        let field = error.path().to_string();
        ConfigError::Parse {
            path: path.to_path_buf(),
            field,
            source: error.into_inner(),
        }
    })
}

pub fn save_config(path: &Path, config: &ClientConfig) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(config).map_err(ConfigError::Encode)?;
    write_text_atomic(path, &json).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "settings_saved");
    Ok(())
}
