//! Hang detection for step output
//!
//! A [`HangDetector`] watches a sink for writes. A background task checks the
//! sink once per tick and sends a single liveness-lost signal after `threshold`
//! consecutive ticks pass without any output. Writers never wait on the task:
//! they only set an atomic flag that the task swaps back on every tick.
//!
//! After firing, the detector stays quiet until it is re-armed, either by new
//! output or by the caller through [`HangDetector::reset`].

pub mod counter;
pub mod ticker;

pub use counter::SilenceCounter;
pub use ticker::{ChannelTicker, IntervalTicker, TickHandle, TickSource};

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Sink decorator that records every write as activity.
pub struct ActivityWriter<W: Write> {
    inner: W,
    activity: Arc<AtomicBool>,
}

impl<W: Write> ActivityWriter<W> {
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ActivityWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.activity.store(true, Ordering::Release);
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

pub struct HangDetector<T: TickSource> {
    ticker: Option<T>,
    threshold: u32,
    activity: Arc<AtomicBool>,
    signal_tx: mpsc::Sender<()>,
    signal_rx: mpsc::Receiver<()>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl<T: TickSource> HangDetector<T> {
    pub fn new(ticker: T, threshold: u32) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(1);
        Self {
            ticker: Some(ticker),
            threshold,
            activity: Arc::new(AtomicBool::new(false)),
            signal_tx,
            signal_rx,
            shutdown: None,
            task: None,
        }
    }

    /// Wraps `sink` so its writes count as activity for this detector.
    pub fn wrap_sink<W: Write>(&self, sink: W) -> ActivityWriter<W> {
        ActivityWriter {
            inner: sink,
            activity: Arc::clone(&self.activity),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Spawns the monitoring task on the current tokio runtime.
    ///
    /// A detector runs at most once; later calls only log a warning.
    pub fn start(&mut self) {
        let Some(ticker) = self.ticker.take() else {
            warn!("Hang detector already started");
            return;
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown = Some(shutdown_tx);
        self.task = Some(tokio::spawn(monitor(
            ticker,
            SilenceCounter::new(self.threshold),
            Arc::clone(&self.activity),
            self.signal_tx.clone(),
            shutdown_rx,
        )));
        debug!("Hang detector started with threshold {}", self.threshold);
    }

    /// Stops monitoring and waits for the task to exit. Safe to call again.
    pub async fn stop(&mut self) {
        self.ticker = None;
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Hang detector task failed: {}", e);
            }
        }
    }

    /// Re-arms after a handled hang: drops any queued signal and restarts
    /// the silent streak from the next tick.
    pub fn reset(&mut self) {
        while self.signal_rx.try_recv().is_ok() {}
        self.activity.store(true, Ordering::Release);
        debug!("Hang detector reset");
    }

    /// Receives one message per detected hang.
    pub fn signal(&mut self) -> &mut mpsc::Receiver<()> {
        &mut self.signal_rx
    }
}

impl<T: TickSource> Drop for HangDetector<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn monitor<T: TickSource>(
    mut ticker: T,
    mut counter: SilenceCounter,
    activity: Arc<AtomicBool>,
    signal: mpsc::Sender<()>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            tick = ticker.tick() => {
                if tick.is_none() {
                    debug!("Tick source closed, hang detector exiting");
                    break;
                }
                let active = activity.swap(false, Ordering::AcqRel);
                if counter.observe(active) {
                    warn!("No output for {} consecutive ticks", counter.threshold());
                    // nobody listening is fine; the first signal is still queued
                    let _ = signal.try_send(());
                }
            }
        }
    }
}
