use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{BackendError, GestureBackend};
use crate::gesture::{GestureKind, GesturePath};

/// Privileged backend that hands paths to an elevated helper over a named pipe.
///
/// The helper creates the pipe when it starts, so availability is simply
/// whether the path exists. Each gesture opens the pipe, writes one JSON line
/// and closes it again, which lets the helper restart between gestures.
pub struct HelperPipeBackend {
    path: PathBuf,
}

impl HelperPipeBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GestureBackend for HelperPipeBackend {
    fn name(&self) -> &str {
        "helper"
    }

    fn is_available(&self) -> bool {
        self.path.exists()
    }

    fn supports(&self, _kind: GestureKind) -> bool {
        true
    }

    fn dispatch(&self, path: &GesturePath) -> Result<(), BackendError> {
        let json =
            serde_json::to_string(path).map_err(|err| BackendError::Failed(err.to_string()))?;
        let mut pipe = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|err| {
                BackendError::Unavailable(format!("{}: {err}", self.path.display()))
            })?;
        writeln!(pipe, "{json}").map_err(|err| BackendError::Failed(err.to_string()))
    }
}
