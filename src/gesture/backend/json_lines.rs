use std::io::{self, Write};
use std::sync::Mutex;

use super::{BackendError, GestureBackend};
use crate::gesture::{GestureKind, GesturePath};
use crate::lock_or_recover;

/// Standard backend that writes each path as one JSON line.
///
/// The host side of the pipe (an accessibility service, an emulator bridge,
/// a test harness) replays the line as touch input.
pub struct JsonLinesBackend {
    name: String,
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesBackend {
    pub fn new(name: &str, out: Box<dyn Write + Send>) -> Self {
        Self {
            name: name.to_string(),
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new("stdout", Box::new(io::stdout()))
    }
}

impl GestureBackend for JsonLinesBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, _kind: GestureKind) -> bool {
        true
    }

    fn dispatch(&self, path: &GesturePath) -> Result<(), BackendError> {
        let json =
            serde_json::to_string(path).map_err(|err| BackendError::Failed(err.to_string()))?;
        let mut out = lock_or_recover(&self.out, "JsonLinesBackend::dispatch");
        writeln!(out, "{json}").map_err(|err| BackendError::Failed(err.to_string()))?;
        out.flush()
            .map_err(|err| BackendError::Failed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, ScreenDimensions};
    use crate::gesture::GestureRequest;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_one_json_line_per_gesture() {
        let buf = SharedBuf::default();
        let backend = JsonLinesBackend::new("test", Box::new(buf.clone()));
        let path = GestureRequest::Tap(Point::new(12.0, 34.0))
            .build(ScreenDimensions::new(100, 100))
            .unwrap();
        backend.dispatch(&path).unwrap();
        backend.dispatch(&path).unwrap();

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["kind"], "tap");
        assert_eq!(value["points"][0]["x"], 12.0);
        assert_eq!(value["duration_ms"], 50);
    }
}
