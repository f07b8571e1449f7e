use std::env;
use std::path::{Path, PathBuf};

use escape_engine::puzzle::GameSession;
use escape_engine::{load_puzzle_file, resolve_app_paths, AppError, LoopConfig, Walker};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::settings::{load_settings, GameSettings, SettingsError};

const SETTINGS_ENV_VAR: &str = "ESCAPE_SETTINGS";
const ROOMS_FILE_NAME: &str = "rooms.xml";
const SETTINGS_FILE_NAME: &str = "settings.json";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) session: GameSession,
    pub(crate) walker: Walker,
    pub(crate) asset_root: PathBuf,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    App(#[from] AppError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    let paths = resolve_app_paths().map_err(AppError::from)?;
    info!(root = %paths.root.display(), "app_root_resolved");

    let settings = load_game_settings(&paths.base_content_dir)?;
    wire_session(&paths.base_content_dir, &paths.assets_dir, &settings)
}

fn load_game_settings(base_content_dir: &Path) -> Result<GameSettings, SettingsError> {
    let (path, required) = match env::var_os(SETTINGS_ENV_VAR) {
        Some(value) => (PathBuf::from(value), true),
        None => (base_content_dir.join(SETTINGS_FILE_NAME), false),
    };
    let settings = load_settings(&path, required)?;
    info!(
        path = %path.display(),
        inventory_capacity = settings.inventory_capacity,
        target_tps = settings.target_tps,
        "settings_loaded"
    );
    Ok(settings)
}

fn wire_session(
    base_content_dir: &Path,
    asset_root: &Path,
    settings: &GameSettings,
) -> Result<AppWiring, BootstrapError> {
    let definition =
        load_puzzle_file(&base_content_dir.join(ROOMS_FILE_NAME)).map_err(AppError::from)?;
    let session = definition
        .into_session(settings.inventory_capacity)
        .map_err(AppError::from)?;

    Ok(AppWiring {
        config: settings.loop_config(),
        session,
        walker: Walker::new(settings.walker_spawn(), settings.walker_speed),
        asset_root: asset_root.to_path_buf(),
    })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
