//! Repeating timer on a dedicated thread.
//!
//! ```text
//!   schedule()                         cancel()
//!      │                                  │
//!      ▼                                  ▼
//!   ┌────────────────────────────┐   stopped = true
//!   │ loop:                      │   notify_all ──────┐
//!   │   wait_until(deadline) ◄───┼────────────────────┘
//!   │   stopped? ─► exit         │
//!   │   task()                   │
//!   │   deadline += interval     │
//!   └────────────────────────────┘
//! ```
//!
//! Deadlines advance by a fixed step from the previous deadline, not from
//! when the task finished, so a slow tick does not push every later tick
//! back. If a tick overruns a whole interval the schedule is re-anchored at
//! the current instant instead of firing a burst of catch-up ticks.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

struct Signal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Handle to a repeating background task. Cancelled on drop.
pub struct Ticker {
    name: String,
    interval: Duration,
    signal: Arc<Signal>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawns a thread named `name` that runs `task` every `interval`,
    /// first one `interval` from now.
    ///
    /// Fails if `interval` is zero or the thread cannot be spawned.
    pub fn schedule<F>(name: impl Into<String>, interval: Duration, task: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        if interval.is_zero() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "ticker interval must be non-zero",
            ));
        }

        let name = name.into();
        let signal = Arc::new(Signal {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });

        let worker_signal = Arc::clone(&signal);
        let worker_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run(&worker_name, &worker_signal, interval, task))?;

        debug!(ticker = %name, ?interval, "ticker scheduled");
        Ok(Self {
            name,
            interval,
            signal,
            handle: Some(handle),
        })
    }

    /// Stops the ticker and waits for an in-flight tick to finish.
    ///
    /// Idempotent. Called from inside the ticker's own task it only signals
    /// the stop; the thread exits after the task returns.
    pub fn cancel(&mut self) {
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();

        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            warn!(ticker = %self.name, "ticker task panicked");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.signal.stopped.lock()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticker")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

fn run<F: FnMut()>(name: &str, signal: &Signal, interval: Duration, mut task: F) {
    let mut deadline = Instant::now() + interval;
    loop {
        {
            let mut stopped = signal.stopped.lock();
            while !*stopped {
                if signal.wake.wait_until(&mut stopped, deadline).timed_out() {
                    break;
                }
            }
            if *stopped {
                break;
            }
        }

        task();

        deadline += interval;
        let now = Instant::now();
        if deadline <= now {
            warn!(
                ticker = name,
                ?interval,
                behind = ?(now - deadline),
                "tick overran its interval; re-anchoring schedule"
            );
            deadline = now + interval;
        }
    }
    trace!(ticker = name, "ticker stopped");
}
