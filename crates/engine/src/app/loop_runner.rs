use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event_loop::EventLoop;
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::config::{load_config, save_config, ClientConfig, ConfigError};
use crate::platform::{BuiltinText, PixelsGraphics, SilentSound, WinitInput};
use crate::{resolve_app_paths, AppPaths, StartupError};

use super::{Client, ClientError, Collaborators, CommandRegistry, Editor};

pub const WINDOW_TITLE: &str = "Lodestar";

#[derive(Debug, Clone, Copy, Default)]
pub struct LaunchOptions {
    /// Start from built-in defaults: skip `settings.json` and `autoexec.cfg`.
    pub use_default_config: bool,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

pub fn run_app(options: LaunchOptions, editor: Box<dyn Editor>) -> Result<(), AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        settings = %app_paths.settings_file.display(),
        screenshots_dir = %app_paths.screenshots_dir.display(),
        use_default_config = options.use_default_config,
        "startup"
    );

    let config = initial_config(&app_paths, options)?;
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(build_window(&event_loop, &config)?);

    let collaborators = Collaborators {
        graphics: Box::new(PixelsGraphics::new(
            Arc::clone(&window),
            config.gfx_vsync,
            app_paths.screenshots_dir.clone(),
        )),
        input: Box::new(WinitInput::new(event_loop, window)),
        sound: Box::new(SilentSound::default()),
        text: Box::new(BuiltinText),
        editor,
    };

    let mut client = Client::new(config, collaborators, app_paths.screenshots_dir.clone());
    client.run_with(|client| {
        if !options.use_default_config {
            run_autoexec(client, &app_paths.autoexec_file);
        }
    })?;

    let config = client.into_config();
    save_config(&app_paths.settings_file, &config)?;
    Ok(())
}

fn run_autoexec(client: &mut Client, path: &Path) {
    let commands = CommandRegistry::with_client_builtins();
    match commands.execute_file(client, path) {
        Ok(true) => info!(path = %path.display(), "autoexec_executed"),
        Ok(false) => {}
        Err(error) => warn!(path = %path.display(), error = %error, "autoexec_failed"),
    }
}

fn initial_config(app_paths: &AppPaths, options: LaunchOptions) -> Result<ClientConfig, AppError> {
    if options.use_default_config {
        return Ok(ClientConfig::default());
    }
    match load_config(&app_paths.settings_file)? {
        Some(config) => Ok(config),
        None => {
            info!(path = %app_paths.settings_file.display(), "settings_defaulted");
            Ok(ClientConfig::default())
        }
    }
}

fn build_window(event_loop: &EventLoop<()>, config: &ClientConfig) -> Result<Window, AppError> {
    let fullscreen = config.gfx_fullscreen.then(|| {
        Fullscreen::Borderless(event_loop.available_monitors().nth(config.gfx_screen))
    });
    let window = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(LogicalSize::new(
            config.gfx_screen_width as f64,
            config.gfx_screen_height as f64,
        ))
        .with_decorations(!config.gfx_borderless)
        .with_fullscreen(fullscreen)
        .build(event_loop)
        .map_err(AppError::CreateWindow)?;

    if !config.gfx_fullscreen {
        if let Some(monitor) = event_loop.available_monitors().nth(config.gfx_screen) {
            window.set_outer_position(monitor.position());
        }
    }
    info!(
        width = config.gfx_screen_width,
        height = config.gfx_screen_height,
        fullscreen = config.gfx_fullscreen,
        borderless = config.gfx_borderless,
        screen = config.gfx_screen,
        "window_created"
    );
    Ok(window)
}
