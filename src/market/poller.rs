use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use log::{info, warn, error};

use crate::board::message::{BoardEvent, BoardMessage, Quote, QuoteTable};
use crate::board::{NotificationHub, QuoteStore};
use crate::market::fetcher::QuoteFetcher;

/// Background poller: one fetch cycle per interval tick. Each cycle
/// snapshots the symbol set, fetches every symbol sequentially, swaps a
/// fresh table into the store and publishes one update event.
pub struct QuotePoller {
    store: Arc<QuoteStore>,
    hub: Arc<NotificationHub>,
    fetcher: Arc<dyn QuoteFetcher>,
    interval_secs: u64,
}

impl QuotePoller {
    pub fn new(
        store: Arc<QuoteStore>,
        hub: Arc<NotificationHub>,
        fetcher: Arc<dyn QuoteFetcher>,
        interval_secs: u64,
    ) -> Self {
        Self {
            store,
            hub,
            fetcher,
            interval_secs,
        }
    }

    /// Runs forever. The first tick completes immediately, so clients
    /// connecting right after startup see real data without waiting a
    /// full interval.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = interval(Duration::from_secs(self.interval_secs));
            info!("Quote poller started (every {}s)", self.interval_secs);

            loop {
                timer.tick().await;
                self.poll_once().await;
            }
        })
    }

    /// One fetch cycle. A failed symbol is recorded inline and never
    /// aborts the cycle; the next cycle is the retry.
    pub async fn poll_once(&self) {
        let symbols = match self.store.symbols() {
            Ok(symbols) => symbols,
            Err(e) => {
                error!("Could not snapshot symbol set: {}", e);
                return;
            }
        };

        if symbols.is_empty() {
            warn!("Symbol set is empty - skipping poll cycle");
            return;
        }

        let mut quotes = QuoteTable::new();
        let mut failures = 0;
        for symbol in &symbols {
            let quote = match self.fetcher.fetch(symbol).await {
                Ok(price) => Quote::priced(symbol.clone(), price),
                Err(e) => {
                    failures += 1;
                    warn!("Fetch failed for {}: {}", symbol, e);
                    Quote::failed(symbol.clone(), e.to_string())
                }
            };
            quotes.insert(symbol.clone(), quote);
        }

        if let Err(e) = self.store.replace_quotes(quotes.clone()) {
            error!("Could not store quote table: {}", e);
            return;
        }

        info!(
            "Poll cycle complete: {} symbols, {} failed",
            symbols.len(),
            failures
        );
        self.hub.publish(BoardMessage::Event(BoardEvent::Update { quotes }));
    }
}
