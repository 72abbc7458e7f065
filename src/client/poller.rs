//! The polling loop.
//!
//! One thread per polled container view. Polls are issued sequentially on
//! a cadence governed by the server's refresh-interval signal; a control
//! channel supersedes the in-flight wait whenever the interval changes or
//! the poller shuts down. A failed or timed-out fetch leaves the view
//! untouched and is retried on the next tick; past a configured run of
//! consecutive failures the cadence backs off instead of failing outright.

use super::view::FeedView;
use crate::error::Result;
use crate::query::PollWindow;
use crate::types::{DeltaBatch, Timestamp};
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

/// Client-side transport seam: fetch one delta for a window.
///
/// Implementations enforce their own deadline and surface
/// [`FeedError::Timeout`](crate::FeedError::Timeout) when they exceed it.
pub trait DeltaFetcher: Send + 'static {
    fn fetch(&mut self, window: PollWindow, per_page: usize) -> Result<DeltaBatch>;
}

impl<F> DeltaFetcher for F
where
    F: FnMut(PollWindow, usize) -> Result<DeltaBatch> + Send + 'static,
{
    fn fetch(&mut self, window: PollWindow, per_page: usize) -> Result<DeltaBatch> {
        self(window, per_page)
    }
}

/// Poller configuration.
#[derive(Clone, Debug)]
pub struct PollerConfig {
    /// Initial cadence in seconds, replaced by the server's
    /// refresh-interval signal once polls succeed.
    pub interval: u64,

    /// Page size reported back with deltas, for pagination drift tracking.
    pub per_page: usize,

    /// Consecutive failures tolerated before the cadence backs off.
    pub failure_threshold: u32,

    /// Backoff clamp, in seconds.
    pub max_interval: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: 10,
            per_page: 20,
            failure_threshold: 3,
            max_interval: 120,
        }
    }
}

enum Control {
    SetInterval(u64),
    Shutdown,
}

/// Handle to a running polling loop.
pub struct Poller {
    control: Sender<Control>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Start polling into a shared view.
    ///
    /// `render_gate` is the caller's live "safe to render now" signal: when
    /// set, freshly polled entries enter the rendered list immediately;
    /// when clear they buffer (see [`FeedView::apply_poll`]).
    pub fn spawn<F>(
        config: PollerConfig,
        fetcher: F,
        view: Arc<Mutex<FeedView>>,
        render_gate: Arc<AtomicBool>,
    ) -> Self
    where
        F: DeltaFetcher,
    {
        let (control, inbox) = unbounded();
        let handle = std::thread::spawn(move || {
            run_loop(config, fetcher, view, render_gate, inbox);
        });

        Self {
            control,
            handle: Some(handle),
        }
    }

    /// Change the polling cadence. Supersedes the in-flight wait: the loop
    /// restarts immediately at the new interval.
    pub fn set_interval(&self, seconds: u64) {
        let _ = self.control.send(Control::SetInterval(seconds));
    }

    /// Stop the loop and join the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.control.send(Control::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop<F>(
    config: PollerConfig,
    mut fetcher: F,
    view: Arc<Mutex<FeedView>>,
    render_gate: Arc<AtomicBool>,
    inbox: crossbeam_channel::Receiver<Control>,
) where
    F: DeltaFetcher,
{
    // `base` is the bucket width and the steady cadence; `cadence` is the
    // actual wait, which backoff may stretch.
    let mut base = config.interval.max(1);
    let mut cadence = base;
    let mut failures = 0u32;

    loop {
        match inbox.recv_timeout(Duration::from_secs(cadence)) {
            Ok(Control::SetInterval(seconds)) => {
                base = seconds.max(1);
                cadence = base;
                failures = 0;
                debug!(interval = base, "polling cadence changed, restarting loop");
                continue;
            }
            Ok(Control::Shutdown) | Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let last_known = view.lock().last_record_time();
        let window = PollWindow::bucketed(last_known, Timestamp::now(), base);
        if window.is_empty() {
            continue;
        }

        match fetcher.fetch(window, config.per_page) {
            Ok(batch) => {
                failures = 0;

                let server_interval = batch.refresh_interval.max(1);
                view.lock()
                    .apply_poll(&batch, render_gate.load(Ordering::Relaxed));

                if server_interval != base {
                    debug!(
                        from = base,
                        to = server_interval,
                        "server changed refresh interval"
                    );
                    base = server_interval;
                }
                cadence = base;
            }
            Err(err) => {
                // The view is untouched; the cycle is simply skipped.
                failures += 1;
                if failures >= config.failure_threshold {
                    cadence = (cadence.saturating_mul(2)).min(config.max_interval.max(base));
                    warn!(failures, cadence, error = %err, "polling backing off");
                }
            }
        }
    }
}
