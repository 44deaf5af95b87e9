use std::sync::{Arc, Mutex};
use log::info;

use crate::board::message::QuoteTable;

#[cfg(test)]
use crate::board::message::Quote;

struct StoreInner {
    symbols: Vec<String>,
    quotes: QuoteTable,
}

/// Shared state store: the symbol set and the latest quote table behind
/// one lock. Both are replaced as whole units, never partially mutated,
/// so readers only ever see a complete table.
pub struct QuoteStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl QuoteStore {
    pub fn new(symbols: Vec<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                symbols,
                quotes: QuoteTable::new(),
            })),
        }
    }

    /// Snapshot of the symbol set, taken by the poller at the start of
    /// each cycle.
    pub fn symbols(&self) -> Result<Vec<String>, String> {
        let inner = self.inner.lock().map_err(|_| "Lock poisoned".to_string())?;
        Ok(inner.symbols.clone())
    }

    /// Replaces the symbol set as a whole. The in-flight poll cycle keeps
    /// the snapshot it already took; the next cycle observes the new set.
    pub fn replace_symbols(&self, symbols: Vec<String>) -> Result<(), String> {
        let mut inner = self.inner.lock().map_err(|_| "Lock poisoned".to_string())?;
        info!("Symbol set replaced: {}", symbols.join(","));
        inner.symbols = symbols;
        Ok(())
    }

    /// Swaps in the freshly built quote table from a completed cycle.
    pub fn replace_quotes(&self, quotes: QuoteTable) -> Result<(), String> {
        let mut inner = self.inner.lock().map_err(|_| "Lock poisoned".to_string())?;
        inner.quotes = quotes;
        Ok(())
    }

    /// Current quote table, or `None` before the first completed cycle.
    pub fn snapshot(&self) -> Result<Option<QuoteTable>, String> {
        let inner = self.inner.lock().map_err(|_| "Lock poisoned".to_string())?;
        if inner.quotes.is_empty() {
            Ok(None)
        } else {
            Ok(Some(inner.quotes.clone()))
        }
    }

    pub fn symbol_count(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.symbols.len())
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub fn insert_quote(&self, quote: Quote) {
        let mut inner = self.inner.lock().unwrap();
        inner.quotes.insert(quote.symbol.clone(), quote);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_empty_until_first_cycle() {
        let store = QuoteStore::new(vec!["THYAO.IS".to_string()]);
        assert_eq!(store.snapshot().unwrap(), None);

        store.insert_quote(Quote::priced("THYAO.IS".to_string(), 310.0));
        let table = store.snapshot().unwrap().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table["THYAO.IS"].price, Some(310.0));
    }

    #[test]
    fn test_replace_symbols_is_whole_unit() {
        let store = QuoteStore::new(vec!["THYAO.IS".to_string(), "GARAN.IS".to_string()]);

        store
            .replace_symbols(vec!["ASELS.IS".to_string()])
            .unwrap();
        assert_eq!(store.symbols().unwrap(), vec!["ASELS.IS"]);

        // Replaying the same replacement leaves the set unchanged.
        store
            .replace_symbols(vec!["ASELS.IS".to_string()])
            .unwrap();
        assert_eq!(store.symbols().unwrap(), vec!["ASELS.IS"]);
        assert_eq!(store.symbol_count(), 1);
    }

    #[test]
    fn test_replace_quotes_replaces_not_merges() {
        let store = QuoteStore::new(vec![]);
        store.insert_quote(Quote::priced("OLD".to_string(), 1.0));

        let mut fresh = QuoteTable::new();
        fresh.insert("NEW".to_string(), Quote::priced("NEW".to_string(), 2.0));
        store.replace_quotes(fresh).unwrap();

        let table = store.snapshot().unwrap().unwrap();
        assert!(!table.contains_key("OLD"));
        assert!(table.contains_key("NEW"));
    }
}
