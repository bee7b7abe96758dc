pub const DEFAULT_SCREEN_WIDTH: u32 = 1080;
pub const DEFAULT_SCREEN_HEIGHT: u32 = 1920;
pub const MAX_SCREEN_EXTENT: u32 = 16_384;

/// Motion ticker cadence; 16ms keeps cursor motion at roughly 60Hz.
pub const DEFAULT_MOTION_TICK_MS: u64 = 16;
pub const MIN_MOTION_TICK_MS: u64 = 4;
pub const MAX_MOTION_TICK_MS: u64 = 100;

/// How long a dispatched gesture path stays on the visualization stream.
pub const DEFAULT_GESTURE_VISUAL_TTL_MS: u64 = 1_000;
pub const MIN_GESTURE_VISUAL_TTL_MS: u64 = 100;
pub const MAX_GESTURE_VISUAL_TTL_MS: u64 = 10_000;

/// Settings files are small JSON documents; anything larger is a mistake.
pub const MAX_SETTINGS_FILE_BYTES: u64 = 64 * 1024;
