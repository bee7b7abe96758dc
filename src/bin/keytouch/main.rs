//! keytouch driver: feeds a key script through the overlay core.
//!
//! Reads commands from stdin, one per line, and routes the resulting key
//! events through [`OverlayService`]. Every dispatched gesture is written to
//! stdout as a JSON line, interleaved with driver events (key results and mode
//! changes). When a helper pipe is configured and present, gestures go there
//! first and stdout only takes the fallbacks.
//!
//! # Script
//!
//! ```text
//! down <key> | up <key> | press <key> | hold <key> <ms>
//! screen <width> <height> | grid | cursor | hide | wait <ms> | quit
//! ```
//!
//! Keys are names (`0`-`9`, `star`, `pound`, `up`, `center`, `enter`, `back`,
//! `numpad_5`, ...) or raw codes written `code:<n>`.

mod runner;
mod script;

use anyhow::Result;
use crossbeam_channel::bounded;
use keytouch::config::AppConfig;
use keytouch::gesture::{GestureBackends, HelperPipeBackend, JsonLinesBackend};
use keytouch::{
    init_logging, init_tracing, install_panic_hook, log_debug, log_file_path, OverlayService,
    ServiceOptions,
};
use std::sync::Arc;

use crate::runner::{emit, DriverEvent, ScriptRunner};
use crate::script::spawn_script_thread;

/// Max parsed script lines waiting for the runner.
const SCRIPT_CHANNEL_CAPACITY: usize = 256;

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_logging(&config);
    init_tracing(&config);
    install_panic_hook();
    log_debug("=== keytouch Started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));

    let settings = config.load_settings()?;
    let mut backends = GestureBackends::new(Arc::new(JsonLinesBackend::stdout()));
    if let Some(pipe) = &config.helper_pipe {
        log_debug(&format!("privileged helper pipe: {}", pipe.display()));
        backends = backends.with_privileged(Arc::new(HelperPipeBackend::new(pipe)));
    }
    let backend_names: Vec<String> = backends.names().into_iter().map(str::to_string).collect();

    let screen = config.screen_dimensions();
    let service = OverlayService::start(
        settings,
        screen,
        backends,
        ServiceOptions::from_config(&config),
    )?;
    emit(&DriverEvent::Ready {
        width: screen.width,
        height: screen.height,
        backends: backend_names,
    })?;

    let (script_tx, script_rx) = bounded(SCRIPT_CHANNEL_CAPACITY);
    // Detached: a blocking stdin read cannot be interrupted after `quit`.
    let _script_thread = spawn_script_thread(script_tx);

    let mut runner = ScriptRunner::new(service.clone());
    let result = runner.run(&script_rx);

    service.shutdown();
    log_debug("=== keytouch Exiting ===");
    result
}
