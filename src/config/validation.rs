use super::defaults::{
    MAX_GESTURE_VISUAL_TTL_MS, MAX_MOTION_TICK_MS, MAX_SCREEN_EXTENT, MAX_SETTINGS_FILE_BYTES,
    MIN_GESTURE_VISUAL_TTL_MS, MIN_MOTION_TICK_MS,
};
use super::AppConfig;
use crate::settings::OverlaySettings;
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::{fs, path::Path};

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values before anything is wired up.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SCREEN_EXTENT).contains(&self.width) {
            bail!(
                "--width must be between 1 and {MAX_SCREEN_EXTENT}, got {}",
                self.width
            );
        }
        if !(1..=MAX_SCREEN_EXTENT).contains(&self.height) {
            bail!(
                "--height must be between 1 and {MAX_SCREEN_EXTENT}, got {}",
                self.height
            );
        }
        if !(MIN_MOTION_TICK_MS..=MAX_MOTION_TICK_MS).contains(&self.tick_ms) {
            bail!(
                "--tick-ms must be between {MIN_MOTION_TICK_MS} and {MAX_MOTION_TICK_MS}, got {}",
                self.tick_ms
            );
        }
        if !(MIN_GESTURE_VISUAL_TTL_MS..=MAX_GESTURE_VISUAL_TTL_MS).contains(&self.visual_ttl_ms) {
            bail!(
                "--visual-ttl-ms must be between {MIN_GESTURE_VISUAL_TTL_MS} and {MAX_GESTURE_VISUAL_TTL_MS}, got {}",
                self.visual_ttl_ms
            );
        }

        if let Some(path) = &self.settings {
            let metadata = fs::metadata(path)
                .with_context(|| format!("failed to inspect --settings '{}'", path.display()))?;
            if !metadata.is_file() {
                bail!("--settings '{}' is not a file", path.display());
            }
            if metadata.len() > MAX_SETTINGS_FILE_BYTES {
                bail!(
                    "--settings '{}' exceeds {MAX_SETTINGS_FILE_BYTES} bytes",
                    path.display()
                );
            }
        }

        // The pipe itself may appear later (the helper creates it), but its directory must exist.
        if let Some(pipe) = &self.helper_pipe {
            let parent = pipe
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            if !parent.is_dir() {
                bail!(
                    "--helper-pipe directory '{}' does not exist",
                    parent.display()
                );
            }
        }

        Ok(())
    }

    /// Load the settings file, or defaults when none was given.
    ///
    /// Invalid files are rejected with every violation listed rather than sanitized,
    /// so a typo never silently turns into a clamped value.
    pub fn load_settings(&self) -> Result<OverlaySettings> {
        let Some(path) = &self.settings else {
            return Ok(OverlaySettings::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings '{}'", path.display()))?;
        let settings: OverlaySettings = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse settings '{}'", path.display()))?;
        settings
            .validate()
            .map_err(|err| anyhow!("invalid settings '{}': {err}", path.display()))?;
        Ok(settings)
    }
}
