//! Executes script commands against the overlay service and reports on stdout.

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use keytouch::geometry::ScreenDimensions;
use keytouch::keys::{KeyAction, KeyCode, KeyEvent};
use keytouch::mode::OverlayMode;
use keytouch::watch::Subscription;
use keytouch::{log_debug, OverlayService};
use serde::Serialize;
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use crate::script::{ScriptCommand, ScriptEvent};

/// Spacing between synthetic auto-repeat events during `hold`.
pub(crate) const HOLD_REPEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Driver output, one JSON object per line next to the gesture lines.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub(crate) enum DriverEvent {
    Ready {
        width: u32,
        height: u32,
        backends: Vec<String>,
    },
    Key {
        action: KeyAction,
        code: KeyCode,
        repeat: u32,
        consumed: bool,
    },
    Mode {
        mode: OverlayMode,
    },
    Screen {
        width: u32,
        height: u32,
        applied: bool,
    },
    Error {
        message: String,
    },
}

pub(crate) fn emit(event: &DriverEvent) -> Result<()> {
    let line = serde_json::to_string(event).context("failed to encode driver event")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}").context("failed to write driver event")?;
    stdout.flush().context("failed to flush stdout")
}

pub(crate) struct ScriptRunner {
    service: OverlayService,
    modes: Subscription<OverlayMode>,
}

impl ScriptRunner {
    pub(crate) fn new(service: OverlayService) -> Self {
        let modes = service.mode_stream().subscribe();
        Self { service, modes }
    }

    /// Run until `quit` or until the script source closes.
    pub(crate) fn run(&mut self, rx: &Receiver<ScriptEvent>) -> Result<()> {
        for event in rx.iter() {
            match event {
                ScriptEvent::Command(ScriptCommand::Quit) => {
                    log_debug("script requested quit");
                    break;
                }
                ScriptEvent::Command(command) => self.execute(command)?,
                ScriptEvent::Invalid { line, message } => {
                    log_debug(&format!("script line {line} rejected: {message}"));
                    emit(&DriverEvent::Error {
                        message: format!("line {line}: {message}"),
                    })?;
                }
            }
            self.report_mode()?;
        }
        Ok(())
    }

    fn execute(&mut self, command: ScriptCommand) -> Result<()> {
        match command {
            ScriptCommand::Down(code) => self.send_key(KeyEvent::down(code)),
            ScriptCommand::Up(code) => self.send_key(KeyEvent::up(code)),
            ScriptCommand::Press(code) => {
                self.send_key(KeyEvent::down(code))?;
                self.report_mode()?;
                self.send_key(KeyEvent::up(code))
            }
            ScriptCommand::Hold(code, duration) => self.hold(code, duration),
            ScriptCommand::Screen(width, height) => {
                let applied = self
                    .service
                    .update_screen(ScreenDimensions::new(width, height));
                emit(&DriverEvent::Screen {
                    width,
                    height,
                    applied,
                })
            }
            ScriptCommand::Grid => self.report_activation(self.service.activate_grid()),
            ScriptCommand::Cursor => self.report_activation(self.service.activate_cursor()),
            ScriptCommand::Hide => {
                self.service.force_hide_all_overlays();
                Ok(())
            }
            ScriptCommand::Wait(duration) => {
                thread::sleep(duration);
                Ok(())
            }
            ScriptCommand::Quit => Ok(()),
        }
    }

    /// Initial down, auto-repeats until the duration elapses, then the up.
    fn hold(&mut self, code: KeyCode, duration: Duration) -> Result<()> {
        let started = Instant::now();
        self.send_key(KeyEvent::down(code))?;
        self.report_mode()?;
        let mut repeat = 0;
        while started.elapsed() + HOLD_REPEAT_INTERVAL <= duration {
            thread::sleep(HOLD_REPEAT_INTERVAL);
            repeat += 1;
            self.send_key(KeyEvent::repeat(code, repeat))?;
        }
        if let Some(rest) = duration.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
        self.send_key(KeyEvent::up(code))
    }

    fn send_key(&self, event: KeyEvent) -> Result<()> {
        let consumed = self.service.handle_key_event(&event);
        emit(&DriverEvent::Key {
            action: event.action,
            code: event.code,
            repeat: event.repeat,
            consumed,
        })
    }

    fn report_activation<E: std::fmt::Display>(&self, result: Result<(), E>) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(err) => emit(&DriverEvent::Error {
                message: err.to_string(),
            }),
        }
    }

    fn report_mode(&mut self) -> Result<()> {
        if let Some(mode) = self.modes.try_changed() {
            emit(&DriverEvent::Mode { mode: *mode })?;
        }
        Ok(())
    }
}
