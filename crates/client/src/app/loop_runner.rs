use std::process::ExitCode;

use lodestar_engine::run_app;
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_app(app.options, app.editor) {
        error!(error = %err, "client_failed");
        return ExitCode::FAILURE;
    }

    info!("client_exited");
    ExitCode::SUCCESS
}
