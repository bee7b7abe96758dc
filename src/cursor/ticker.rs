use crossbeam_channel::tick;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use super::manager::CursorStateManager;
use crate::log_debug;

#[derive(Clone)]
pub(crate) struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Periodic motion driver for one burst of held direction keys.
///
/// The thread exits on its own once the manager reports nothing is held, or
/// as soon as it is stopped. It is never joined from the key path.
pub(crate) struct MotionTicker {
    token: StopToken,
    handle: thread::JoinHandle<()>,
}

impl MotionTicker {
    pub(crate) fn spawn(manager: Arc<CursorStateManager>, ticker_id: u64) -> Self {
        let token = StopToken::new();
        let thread_token = token.clone();
        let interval = manager.tick_interval();
        let handle = thread::spawn(move || {
            for _ in tick(interval).iter() {
                if thread_token.is_stopped() || !manager.tick(ticker_id) {
                    break;
                }
            }
            tracing::trace!(ticker_id, "motion ticker exited");
        });
        Self { token, handle }
    }

    /// Signal the thread to exit. A thread that already exited is reaped here
    /// so a panic inside the tick loop still reaches the debug log.
    pub(crate) fn stop(self) {
        self.token.stop();
        if self.handle.is_finished() && self.handle.join().is_err() {
            log_debug("motion ticker panicked");
            tracing::warn!("motion ticker panicked");
        }
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
