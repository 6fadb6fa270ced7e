//! Watcher: owns the reconnecting orderbook stream and drives the cache.
//!
//! Tickers of interest are registered dynamically by Brain as it builds
//! threshold maps (spec §4.3); `WatcherHandle::subscribe` is the channel
//! that carries those registrations into the running stream task.

mod cache;
mod reconnect;
mod stream;

pub use cache::{ApplyOutcome, OrderBookCache};
pub use reconnect::ReconnectingStream;
pub use stream::{MarketEvent, OrderBookStream};

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::model::MarketTicker;

/// Handle for registering new tickers with a running Watcher task.
#[derive(Clone)]
pub struct WatcherHandle {
    subscribe_tx: mpsc::Sender<Vec<MarketTicker>>,
}

impl WatcherHandle {
    pub async fn subscribe(&self, tickers: Vec<MarketTicker>) {
        let _ = self.subscribe_tx.send(tickers).await;
    }
}

pub struct Watcher<S: OrderBookStream> {
    stream: S,
    cache: Arc<OrderBookCache>,
    subscribe_rx: mpsc::Receiver<Vec<MarketTicker>>,
}

impl<S: OrderBookStream> Watcher<S> {
    pub fn new(stream: S, cache: Arc<OrderBookCache>) -> (Self, WatcherHandle) {
        let (subscribe_tx, subscribe_rx) = mpsc::channel(64);
        (
            Self { stream, cache, subscribe_rx },
            WatcherHandle { subscribe_tx },
        )
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        if let Err(e) = self.stream.connect().await {
            warn!(error = %e, "watcher initial connect failed, will reconnect in background");
        }

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                Some(tickers) = self.subscribe_rx.recv() => {
                    if let Err(e) = self.stream.subscribe(&tickers).await {
                        warn!(error = %e, tickers = tickers.len(), "watcher subscribe failed");
                    }
                }
                event = self.stream.next_event() => {
                    match event {
                        Some(MarketEvent::Snapshot(update)) | Some(MarketEvent::Delta(update)) => {
                            let ticker = update.ticker.clone();
                            match self.cache.apply(update) {
                                ApplyOutcome::GapDetected => {
                                    debug!(%ticker, "sequence gap, requesting re-snapshot");
                                    self.cache.mark_stale(&[ticker.clone()]);
                                    if let Err(e) = self.stream.subscribe(&[ticker]).await {
                                        warn!(error = %e, "re-snapshot subscribe failed");
                                    }
                                }
                                ApplyOutcome::Applied | ApplyOutcome::Snapshotted => {}
                            }
                        }
                        Some(MarketEvent::Disconnected { reason }) => {
                            warn!(reason, "watcher stream reported disconnect");
                        }
                        None => break,
                    }
                }
            }
        }
    }
}
