// src/timer.rs
//! Countdown between sets.
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    Finished,
    Cancelled,
}

/// Formats seconds as `m:ss`.
pub fn format_countdown(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// A running countdown. `on_tick` receives the remaining seconds once per
/// interval, ending with 0. Cancelling or dropping the handle stops the
/// countdown; once [`RestTimer::cancel`] returns no further tick is delivered.
pub struct RestTimer {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<TimerOutcome>>,
}

impl RestTimer {
    pub fn start<F>(seconds: u32, interval: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(u32) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let worker = thread::spawn(move || {
            let mut remaining = seconds;
            while remaining > 0 {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        remaining -= 1;
                        on_tick(remaining);
                    }
                    // Explicit stop or the handle went away.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        return TimerOutcome::Cancelled;
                    }
                }
            }
            TimerOutcome::Finished
        });
        Self {
            stop: Some(stop_tx),
            worker: Some(worker),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stops the countdown and waits for the worker to exit.
    pub fn cancel(mut self) -> TimerOutcome {
        self.shutdown()
    }

    /// Blocks until the countdown runs out (or was cancelled).
    pub fn wait(mut self) -> TimerOutcome {
        let outcome = self
            .worker
            .take()
            .map_or(TimerOutcome::Cancelled, |w| {
                w.join().unwrap_or(TimerOutcome::Cancelled)
            });
        self.stop = None;
        outcome
    }

    fn shutdown(&mut self) -> TimerOutcome {
        if let Some(stop) = self.stop.take() {
            // The worker may already be gone, which is fine.
            let _ = stop.send(());
        }
        self.worker
            .take()
            .map_or(TimerOutcome::Cancelled, |w| {
                w.join().unwrap_or(TimerOutcome::Cancelled)
            })
    }
}

impl Drop for RestTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
