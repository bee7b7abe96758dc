//! Command-line parsing and validation helpers.

mod defaults;
#[cfg(test)]
mod tests;
mod validation;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub use defaults::{
    DEFAULT_GESTURE_VISUAL_TTL_MS, DEFAULT_MOTION_TICK_MS, DEFAULT_SCREEN_HEIGHT,
    DEFAULT_SCREEN_WIDTH, MAX_GESTURE_VISUAL_TTL_MS, MAX_MOTION_TICK_MS, MAX_SCREEN_EXTENT,
    MAX_SETTINGS_FILE_BYTES, MIN_GESTURE_VISUAL_TTL_MS, MIN_MOTION_TICK_MS,
};

use crate::geometry::ScreenDimensions;

/// CLI options for the keytouch driver.
#[derive(Debug, Parser, Clone)]
#[command(about = "keytouch: drive a touchscreen pointer from key events", author, version)]
pub struct AppConfig {
    /// Screen width in device pixels
    #[arg(long, env = "KEYTOUCH_WIDTH", default_value_t = DEFAULT_SCREEN_WIDTH)]
    pub width: u32,

    /// Screen height in device pixels
    #[arg(long, env = "KEYTOUCH_HEIGHT", default_value_t = DEFAULT_SCREEN_HEIGHT)]
    pub height: u32,

    /// Overlay settings JSON file (camelCase keys, missing keys use defaults)
    #[arg(long, env = "KEYTOUCH_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Pipe read by a privileged gesture helper; preferred over stdout while it exists
    #[arg(long = "helper-pipe", env = "KEYTOUCH_HELPER_PIPE")]
    pub helper_pipe: Option<PathBuf>,

    /// Cursor motion tick interval (milliseconds)
    #[arg(long = "tick-ms", default_value_t = DEFAULT_MOTION_TICK_MS)]
    pub tick_ms: u64,

    /// How long dispatched gestures stay visible (milliseconds)
    #[arg(long = "visual-ttl-ms", default_value_t = DEFAULT_GESTURE_VISUAL_TTL_MS)]
    pub visual_ttl_ms: u64,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "KEYTOUCH_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "KEYTOUCH_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Enable verbose timing logs
    #[arg(long)]
    pub log_timings: bool,
}

impl AppConfig {
    pub fn logging_enabled(&self) -> bool {
        (self.logs || self.log_timings) && !self.no_logs
    }

    pub fn screen_dimensions(&self) -> ScreenDimensions {
        ScreenDimensions::new(self.width, self.height)
    }

    pub fn motion_tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn visual_ttl(&self) -> Duration {
        Duration::from_millis(self.visual_ttl_ms)
    }
}
