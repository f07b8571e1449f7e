use std::process::ExitCode;

use escape_engine::run_app;
use tracing::{error, info};

use super::bootstrap::{build_app, init_tracing};

pub(crate) fn run() -> ExitCode {
    init_tracing();
    info!("=== Escape Room Startup ===");

    let app = match build_app() {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = run_app(app.config, app.session, app.walker, app.asset_root) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
