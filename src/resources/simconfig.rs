//! Simulation configuration resource.
//!
//! Settings for the headless frame driver and for how destroyed entities are
//! handled, loaded from an INI file. Defaults are safe; missing keys keep
//! them.
//!
//! # Configuration File Format
//!
//! ```ini
//! [simulation]
//! time_scale = 1.0
//! fixed_dt = 0.016666
//! frames = 600
//!
//! [entities]
//! despawn_destroyed = false
//! debug = false
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_TIME_SCALE: f32 = 1.0;
const DEFAULT_FIXED_DT: f32 = 1.0 / 60.0;
const DEFAULT_FRAMES: u32 = 600;
const DEFAULT_DESPAWN_DESTROYED: bool = false;
const DEFAULT_DEBUG: bool = false;
const DEFAULT_CONFIG_PATH: &str = "./behavior.ini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("failed to save config file {path:?}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Multiplier applied to every frame delta.
    pub time_scale: f32,
    /// Frame delta used by the headless driver, in seconds.
    pub fixed_dt: f32,
    /// Frames the headless driver runs.
    pub frames: u32,
    /// Despawn entities once they are destroyed instead of only pausing them.
    pub despawn_destroyed: bool,
    /// Turn on debug logging for every FSM state.
    pub debug: bool,
    pub config_path: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self {
            time_scale: DEFAULT_TIME_SCALE,
            fixed_dt: DEFAULT_FIXED_DT,
            frames: DEFAULT_FRAMES,
            despawn_destroyed: DEFAULT_DESPAWN_DESTROYED,
            debug: DEFAULT_DEBUG,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file. Missing values keep their
    /// current values; out-of-range values are clamped.
    pub fn load_from_file(&mut self) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config.load(&self.config_path).map_err(|reason| ConfigError::Load {
            path: self.config_path.clone(),
            reason,
        })?;

        // [simulation] section
        if let Some(scale) = config.getfloat("simulation", "time_scale").ok().flatten() {
            self.time_scale = (scale as f32).max(0.0);
        }
        if let Some(dt) = config.getfloat("simulation", "fixed_dt").ok().flatten() {
            self.fixed_dt = (dt as f32).max(0.0);
        }
        if let Some(frames) = config.getuint("simulation", "frames").ok().flatten() {
            self.frames = frames.min(u32::MAX as u64) as u32;
        }

        // [entities] section
        if let Some(despawn) = config.getbool("entities", "despawn_destroyed").ok().flatten() {
            self.despawn_destroyed = despawn;
        }
        if let Some(debug) = config.getbool("entities", "debug").ok().flatten() {
            self.debug = debug;
        }

        info!(
            "Loaded config: time_scale={}, fixed_dt={}, frames={}, despawn_destroyed={}, debug={}",
            self.time_scale, self.fixed_dt, self.frames, self.despawn_destroyed, self.debug
        );
        Ok(())
    }

    /// Save configuration to the INI file.
    pub fn save_to_file(&self) -> Result<(), ConfigError> {
        let mut config = Ini::new();

        config.set("simulation", "time_scale", Some(self.time_scale.to_string()));
        config.set("simulation", "fixed_dt", Some(self.fixed_dt.to_string()));
        config.set("simulation", "frames", Some(self.frames.to_string()));

        config.set(
            "entities",
            "despawn_destroyed",
            Some(self.despawn_destroyed.to_string()),
        );
        config.set("entities", "debug", Some(self.debug.to_string()));

        config
            .write(&self.config_path)
            .map_err(|source| ConfigError::Save {
                path: self.config_path.clone(),
                source,
            })?;

        info!("Saved config to {:?}", self.config_path);
        Ok(())
    }
}
