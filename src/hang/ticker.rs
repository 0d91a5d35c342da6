//! Tick sources that drive the hang detector

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

#[async_trait]
pub trait TickSource: Send + 'static {
    /// Waits for the next tick; `None` ends monitoring.
    async fn tick(&mut self) -> Option<()>;
}

/// Ticks on a fixed period, the first one a full period after creation.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait]
impl TickSource for IntervalTicker {
    async fn tick(&mut self) -> Option<()> {
        self.interval.tick().await;
        Some(())
    }
}

/// Ticks pushed by hand through a [`TickHandle`].
pub struct ChannelTicker {
    rx: mpsc::Receiver<()>,
}

#[derive(Clone)]
pub struct TickHandle {
    tx: mpsc::Sender<()>,
}

impl ChannelTicker {
    pub fn new() -> (Self, TickHandle) {
        let (tx, rx) = mpsc::channel(1);
        (Self { rx }, TickHandle { tx })
    }
}

impl TickHandle {
    /// Sends one tick. Returns false once the ticker is gone.
    pub async fn tick(&self) -> bool {
        self.tx.send(()).await.is_ok()
    }
}

#[async_trait]
impl TickSource for ChannelTicker {
    async fn tick(&mut self) -> Option<()> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_interval_first_tick_after_one_period() {
        let start = Instant::now();
        let mut ticker = IntervalTicker::new(Duration::from_secs(2));
        assert_eq!(ticker.period(), Duration::from_secs(2));

        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_channel_ticker_ends_when_handles_drop() {
        let (mut ticker, handle) = ChannelTicker::new();
        assert!(handle.tick().await);
        assert_eq!(ticker.tick().await, Some(()));

        drop(handle);
        assert_eq!(ticker.tick().await, None);
    }

    #[tokio::test]
    async fn test_tick_handle_reports_closed_ticker() {
        let (ticker, handle) = ChannelTicker::new();
        drop(ticker);
        assert!(!handle.tick().await);
    }
}
