use lodestar_engine::{Editor, LaunchOptions};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::editor_view::EditorView;

pub(crate) struct AppWiring {
    pub(crate) options: LaunchOptions,
    pub(crate) editor: Box<dyn Editor>,
}

pub(crate) fn build_app(args: impl IntoIterator<Item = String>) -> AppWiring {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "=== Lodestar Startup ===");

    let options = parse_launch_options(args);
    AppWiring {
        options,
        editor: Box::new(EditorView::new()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_launch_options(args: impl IntoIterator<Item = String>) -> LaunchOptions {
    let mut options = LaunchOptions::default();
    for arg in args {
        match arg.as_str() {
            "-d" | "--default" => options.use_default_config = true,
            other => warn!(arg = other, "unknown_argument_ignored"),
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn default_flag_in_either_form() {
        assert!(parse_launch_options(args(&["-d"])).use_default_config);
        assert!(parse_launch_options(args(&["--default"])).use_default_config);
    }

    #[test]
    fn settings_are_loaded_without_flags() {
        assert!(!parse_launch_options(args(&[])).use_default_config);
        assert!(!parse_launch_options(args(&["--verbose"])).use_default_config);
    }
}
