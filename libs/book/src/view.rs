//! Presentation of book state with the symbol resolved.

use symbols::SymbolRegistry;

use crate::order_book::OrderBook;

/// Top-of-book summary for display and reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct BookView {
    pub symbol: String,
    pub sequence: u64,
    pub best_bid: Option<(f64, f64)>,
    pub best_ask: Option<(f64, f64)>,
    pub spread: Option<f64>,
    pub bid_depth: usize,
    pub ask_depth: usize,
}

impl BookView {
    /// Registry access happens here and nowhere deeper in book state; an
    /// unresolved hash renders as hex rather than holding up the view.
    pub fn of(book: &OrderBook, registry: &SymbolRegistry) -> Self {
        let symbol = match registry.resolve(book.symbol_hash()) {
            Some(canonical) => canonical.to_string(),
            None => format!("{:#018x}", book.symbol_hash()),
        };
        Self {
            symbol,
            sequence: book.sequence(),
            best_bid: book.best_bid(),
            best_ask: book.best_ask(),
            spread: book.spread(),
            bid_depth: book.bid_depth(),
            ask_depth: book.ask_depth(),
        }
    }
}
