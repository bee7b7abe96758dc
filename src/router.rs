//! Key event routing across the mode handlers.

use anyhow::Result;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::cursor::CursorActionHandler;
use crate::grid::GridActionHandler;
use crate::keys::{Handled, KeyEvent};
use crate::log_debug;

/// One routable handler. Dispatch is a plain match; no handler knows the others.
#[derive(Clone)]
pub enum ModeHandler {
    Grid(Arc<GridActionHandler>),
    Cursor(Arc<CursorActionHandler>),
    #[cfg(test)]
    Scripted(&'static str, Arc<dyn Fn(&KeyEvent) -> Result<Handled> + Send + Sync>),
}

impl ModeHandler {
    pub fn label(&self) -> &'static str {
        match self {
            ModeHandler::Grid(_) => "grid",
            ModeHandler::Cursor(_) => "cursor",
            #[cfg(test)]
            ModeHandler::Scripted(label, _) => *label,
        }
    }

    pub fn try_handle(&self, event: &KeyEvent) -> Result<Handled> {
        match self {
            ModeHandler::Grid(handler) => handler.try_handle(event),
            ModeHandler::Cursor(handler) => handler.try_handle(event),
            #[cfg(test)]
            ModeHandler::Scripted(_, handler) => (handler.as_ref())(event),
        }
    }
}

/// Offers each key event to the handlers in a fixed order; the first one that
/// consumes it wins. A failing handler never takes the input pipeline down:
/// errors and panics end routing for that event as "not consumed".
pub struct KeyEventRouter {
    handlers: Vec<ModeHandler>,
}

impl KeyEventRouter {
    pub fn new(grid: Arc<GridActionHandler>, cursor: Arc<CursorActionHandler>) -> Self {
        Self::with_handlers(vec![ModeHandler::Grid(grid), ModeHandler::Cursor(cursor)])
    }

    pub fn with_handlers(handlers: Vec<ModeHandler>) -> Self {
        Self { handlers }
    }

    pub fn handle(&self, event: &KeyEvent) -> bool {
        for handler in &self.handlers {
            match catch_unwind(AssertUnwindSafe(|| handler.try_handle(event))) {
                Ok(Ok(Handled::Consumed)) => return true,
                Ok(Ok(Handled::NotConsumed)) => {}
                Ok(Err(err)) => {
                    tracing::warn!(
                        handler = handler.label(),
                        code = event.code,
                        error = %err,
                        "key handler failed"
                    );
                    log_debug(&format!(
                        "{} handler failed on key {}: {err:#}",
                        handler.label(),
                        event.code
                    ));
                    return false;
                }
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::warn!(
                        handler = handler.label(),
                        code = event.code,
                        panic = %message,
                        "key handler panicked"
                    );
                    log_debug(&format!(
                        "{} handler panicked on key {}: {message}",
                        handler.label(),
                        event.code
                    ));
                    return false;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KEY_1, KEY_5, KEY_9};
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scripted<F>(label: &'static str, f: F) -> ModeHandler
    where
        F: Fn(&KeyEvent) -> Result<Handled> + Send + Sync + 'static,
    {
        ModeHandler::Scripted(label, Arc::new(f))
    }

    fn counting(label: &'static str, calls: &Arc<AtomicUsize>, result: Handled) -> ModeHandler {
        let calls = Arc::clone(calls);
        scripted(label, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(result)
        })
    }

    #[test]
    fn first_consumer_wins_and_later_handlers_are_skipped() {
        let grid_calls = Arc::new(AtomicUsize::new(0));
        let cursor_calls = Arc::new(AtomicUsize::new(0));
        let router = KeyEventRouter::with_handlers(vec![
            counting("grid", &grid_calls, Handled::Consumed),
            counting("cursor", &cursor_calls, Handled::Consumed),
        ]);
        assert!(router.handle(&KeyEvent::down(KEY_5)));
        assert_eq!(grid_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cursor_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unclaimed_events_reach_every_handler() {
        let grid_calls = Arc::new(AtomicUsize::new(0));
        let cursor_calls = Arc::new(AtomicUsize::new(0));
        let router = KeyEventRouter::with_handlers(vec![
            counting("grid", &grid_calls, Handled::NotConsumed),
            counting("cursor", &cursor_calls, Handled::NotConsumed),
        ]);
        assert!(!router.handle(&KeyEvent::down(KEY_5)));
        assert_eq!(grid_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cursor_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_panic_is_not_consumed_and_routing_recovers() {
        let cursor_calls = Arc::new(AtomicUsize::new(0));
        let router = KeyEventRouter::with_handlers(vec![
            scripted("grid", |event| {
                if event.code == KEY_9 {
                    panic!("grid exploded on {}", event.code);
                }
                Ok(Handled::Consumed)
            }),
            counting("cursor", &cursor_calls, Handled::Consumed),
        ]);
        assert!(!router.handle(&KeyEvent::down(KEY_9)));
        assert_eq!(cursor_calls.load(Ordering::SeqCst), 0);
        assert!(router.handle(&KeyEvent::down(KEY_1)));
    }

    #[test]
    fn static_str_panic_payload_is_contained() {
        let router = KeyEventRouter::with_handlers(vec![scripted("grid", |_| {
            std::panic::panic_any("static payload")
        })]);
        assert!(!router.handle(&KeyEvent::down(KEY_1)));
        assert!(!router.handle(&KeyEvent::up(KEY_1)));
    }

    #[test]
    fn handler_error_stops_routing_as_not_consumed() {
        let cursor_calls = Arc::new(AtomicUsize::new(0));
        let router = KeyEventRouter::with_handlers(vec![
            scripted("grid", |_| bail!("gesture queue closed")),
            counting("cursor", &cursor_calls, Handled::Consumed),
        ]);
        assert!(!router.handle(&KeyEvent::up(KEY_5)));
        assert_eq!(cursor_calls.load(Ordering::SeqCst), 0);
    }
}
