use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
mod atomic_io;
pub mod config;
pub mod platform;
pub mod screenshots;

pub use app::{
    run_app, AppError, Client, ClientCommand, ClientError, ClientState, Clock, Collaborators,
    CommandRegistry, Editor, EditorContext, FrameTarget, Graphics, GraphicsError, Input, Key,
    LaunchOptions, LoopControl, Sound, SoundError, SystemClock, TextRender,
};
pub use config::{ClientConfig, ConfigError, SETTINGS_FILE_NAME};

pub const ROOT_ENV_VAR: &str = "LODESTAR_ROOT";
pub const AUTOEXEC_FILE_NAME: &str = "autoexec.cfg";
pub const SCREENSHOTS_DIR_NAME: &str = "screenshots";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub settings_file: PathBuf,
    pub autoexec_file: PathBuf,
    pub screenshots_dir: PathBuf,
}

impl AppPaths {
    pub fn under_root(root: PathBuf) -> Self {
        Self {
            settings_file: root.join(SETTINGS_FILE_NAME),
            autoexec_file: root.join(AUTOEXEC_FILE_NAME),
            screenshots_dir: root.join(SCREENSHOTS_DIR_NAME),
            root,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create screenshots directory at {path}: {source}")]
    CreateScreenshotsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "LODESTAR_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/lodestar\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let paths = AppPaths::under_root(resolve_root()?);

    fs::create_dir_all(&paths.screenshots_dir).map_err(|source| {
        StartupError::CreateScreenshotsDir {
            path: paths.screenshots_dir.clone(),
            source,
        }
    })?;

    Ok(paths)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            find_root_upward(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
