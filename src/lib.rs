//! keytouch: drive a touchscreen pointer from hardware key events.
//!
//! Two mutually exclusive modes turn key presses into synthetic touch input:
//! a recursive 3x3 grid for jumping to a spot and a virtual cursor for fine
//! steering. [`OverlayService`] wires the pieces together behind one handle.

pub mod config;
pub mod cursor;
pub mod geometry;
pub mod gesture;
pub mod grid;
pub mod keys;
mod lock;
mod logging;
pub mod mode;
pub mod router;
pub mod service;
pub mod settings;
mod telemetry;
pub mod watch;

pub(crate) use lock::lock_or_recover;
pub use logging::{
    crash_log_path, init_logging, install_panic_hook, log_debug, log_file_path, log_panic,
};
pub use service::{OverlayService, ServiceOptions};
pub use telemetry::init_tracing;
