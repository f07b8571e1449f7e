use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use escape_engine::puzzle::{Vec2, DEFAULT_INVENTORY_CAPACITY, SCREEN_HEIGHT, SCREEN_WIDTH};
use escape_engine::LoopConfig;
use serde::Deserialize;
use thiserror::Error;

/// Optional tuning read from `settings.json`. Every field has a default, so an
/// empty object is a valid file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameSettings {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_render_fps: Option<u32>,
    pub inventory_capacity: usize,
    pub walker_speed: f32,
    pub walker_spawn: [f32; 2],
}

impl Default for GameSettings {
    fn default() -> Self {
        let loop_defaults = LoopConfig::default();
        Self {
            window_title: loop_defaults.window_title,
            window_width: loop_defaults.window_width,
            window_height: loop_defaults.window_height,
            target_tps: loop_defaults.target_tps,
            max_render_fps: loop_defaults.max_render_fps,
            inventory_capacity: DEFAULT_INVENTORY_CAPACITY,
            walker_speed: 2.0,
            walker_spawn: [SCREEN_WIDTH as f32 / 2.0, 300.0],
        }
    }
}

impl GameSettings {
    pub(crate) fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            window_title: self.window_title.clone(),
            window_width: self.window_width,
            window_height: self.window_height,
            target_tps: self.target_tps,
            max_render_fps: self.max_render_fps,
            ..LoopConfig::default()
        }
    }

    pub(crate) fn walker_spawn(&self) -> Vec2 {
        Vec2::new(self.walker_spawn[0], self.walker_spawn[1])
    }

    fn validate(&self, path: &Path) -> Result<(), SettingsError> {
        let invalid = |field: &'static str, message: &str| SettingsError::Invalid {
            path: path.to_path_buf(),
            field,
            message: message.to_string(),
        };

        if self.window_width == 0 || self.window_height == 0 {
            return Err(invalid("window_width", "window size must be non-zero"));
        }
        if self.target_tps == 0 {
            return Err(invalid("target_tps", "must be at least 1"));
        }
        if self.inventory_capacity == 0 {
            return Err(invalid("inventory_capacity", "must be at least 1"));
        }
        if !self.walker_speed.is_finite() || self.walker_speed <= 0.0 {
            return Err(invalid("walker_speed", "must be a positive number"));
        }
        let [x, y] = self.walker_spawn;
        let on_screen = (0.0..SCREEN_WIDTH as f32).contains(&x)
            && (0.0..SCREEN_HEIGHT as f32).contains(&y);
        if !on_screen {
            return Err(invalid("walker_spawn", "must lie inside the screen"));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings file {path}{location}: {source}")]
    Parse {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid settings in {path}: {field} {message}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

/// Loads settings from `path`. A missing file yields defaults unless
/// `required` is set.
pub(crate) fn load_settings(path: &Path, required: bool) -> Result<GameSettings, SettingsError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == io::ErrorKind::NotFound && !required => {
            return Ok(GameSettings::default());
        }
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let settings = parse_settings_json(path, &raw)?;
    settings.validate(path)?;
    Ok(settings)
}

fn parse_settings_json(path: &Path, raw: &str) -> Result<GameSettings, SettingsError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, GameSettings>(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        let location = if json_path.is_empty() || json_path == "." {
            String::new()
        } else {
            format!(" at {json_path}")
        };
        SettingsError::Parse {
            path: path.to_path_buf(),
            location,
            source: error.into_inner(),
        }
    })
}
