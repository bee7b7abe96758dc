use super::{AppConfig, DEFAULT_MOTION_TICK_MS, MAX_SCREEN_EXTENT};
use crate::geometry::ScreenDimensions;
use crate::keys::{KEY_1, KEY_STAR};
use crate::settings::ControlScheme;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn temp_settings_file(name: &str, contents: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "keytouch_{name}_{}_{stamp}.json",
        std::process::id()
    ));
    fs::write(&path, contents).expect("write settings file");
    path
}

#[test]
fn accepts_valid_defaults() {
    let cfg = AppConfig::parse_from(["test-app"]);
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.screen_dimensions(), ScreenDimensions::new(1080, 1920));
    assert_eq!(cfg.motion_tick(), Duration::from_millis(DEFAULT_MOTION_TICK_MS));
}

#[test]
fn rejects_screen_extent_out_of_bounds() {
    let cfg = AppConfig::parse_from(["test-app", "--width", "0"]);
    assert!(cfg.validate().is_err());

    let too_tall = (MAX_SCREEN_EXTENT + 1).to_string();
    let cfg = AppConfig::parse_from(["test-app", "--height", too_tall.as_str()]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_tick_interval_out_of_bounds() {
    let cfg = AppConfig::parse_from(["test-app", "--tick-ms", "1"]);
    assert!(cfg.validate().is_err());
    let cfg = AppConfig::parse_from(["test-app", "--tick-ms", "500"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_visual_ttl_out_of_bounds() {
    let cfg = AppConfig::parse_from(["test-app", "--visual-ttl-ms", "10"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_missing_settings_file() {
    let cfg = AppConfig::parse_from(["test-app", "--settings", "/definitely/not/here.json"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_helper_pipe_in_missing_directory() {
    let cfg = AppConfig::parse_from(["test-app", "--helper-pipe", "/definitely/not/here/pipe"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn accepts_helper_pipe_in_existing_directory() {
    let pipe = std::env::temp_dir().join("keytouch_helper_pipe_test");
    let pipe = pipe.to_string_lossy().to_string();
    let cfg = AppConfig::parse_from(["test-app", "--helper-pipe", pipe.as_str()]);
    assert!(cfg.validate().is_ok());
}

#[test]
fn logging_flags_resolve() {
    let cfg = AppConfig::parse_from(["test-app", "--logs"]);
    assert!(cfg.logging_enabled());
    let cfg = AppConfig::parse_from(["test-app", "--logs", "--no-logs"]);
    assert!(!cfg.logging_enabled());
    let cfg = AppConfig::parse_from(["test-app", "--log-timings"]);
    assert!(cfg.logging_enabled());
}

#[test]
fn loads_partial_settings_file_with_defaults() {
    let path = temp_settings_file(
        "partial",
        r#"{"gridLevels": 3, "controlScheme": "numpad", "gridActivationKey": 8}"#,
    );
    let path_arg = path.to_string_lossy().to_string();
    let cfg = AppConfig::parse_from(["test-app", "--settings", path_arg.as_str()]);
    cfg.validate().expect("settings path is valid");
    let settings = cfg.load_settings().expect("settings load");
    assert_eq!(settings.grid_levels, 3);
    assert_eq!(settings.control_scheme, ControlScheme::Numpad);
    assert_eq!(settings.grid_activation_key, KEY_1);
    assert_eq!(settings.cursor_activation_key, KEY_STAR);
    let _ = fs::remove_file(path);
}

#[test]
fn rejects_settings_file_with_key_collision() {
    let path = temp_settings_file(
        "collision",
        r#"{"gridActivationKey": 17, "cursorActivationKey": 17}"#,
    );
    let path_arg = path.to_string_lossy().to_string();
    let cfg = AppConfig::parse_from(["test-app", "--settings", path_arg.as_str()]);
    let err = cfg.load_settings().expect_err("collision must be rejected");
    assert!(format!("{err:#}").contains("activation keys must be different"));
    let _ = fs::remove_file(path);
}

#[test]
fn rejects_malformed_settings_json() {
    let path = temp_settings_file("malformed", "{ not json");
    let path_arg = path.to_string_lossy().to_string();
    let cfg = AppConfig::parse_from(["test-app", "--settings", path_arg.as_str()]);
    assert!(cfg.load_settings().is_err());
    let _ = fs::remove_file(path);
}

#[test]
fn no_settings_file_means_defaults() {
    let cfg = AppConfig::parse_from(["test-app"]);
    let settings = cfg.load_settings().expect("defaults");
    assert_eq!(settings, crate::settings::OverlaySettings::default());
}
