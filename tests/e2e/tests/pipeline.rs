//! The full consumer pipeline over a live relay: envelopes in, a named,
//! queryable order book out. Exercises symbol interning, snapshot plus
//! delta reconstruction, and early-delta buffering end to end.

use book::{BookView, DeltaOutcome, Reconstructor};
use codec::{decode, extract_tlv, find_tlv, parse_book_snapshot, parse_symbol_mapping, Frame};
use relay_core::RelayConfig;
use relay_market_data::MarketDataLogic;
use symbols::{hash_symbol, SymbolRegistry};
use tickbus_e2e_tests::{
    connect_settled, delta_envelope, init_test_logging, mapping_envelope, read_frames,
    snapshot_envelope, start_relay,
};
use tokio::io::AsyncWriteExt;
use types::{BookDeltaTlv, BookLevel, BookSide, DeltaAction, TlvType};

/// Feed one relay frame through the consumer-side routing a strategy
/// service would run.
fn route_frame(frame: &Frame, registry: &SymbolRegistry, recon: &mut Reconstructor) -> Option<DeltaOutcome> {
    let envelope = decode(&frame.bytes).unwrap();
    if let Some(value) = find_tlv(envelope.payload, TlvType::SymbolMapping).unwrap() {
        let (hash, canonical) = parse_symbol_mapping(value).unwrap();
        registry.insert_mapping(hash, canonical);
        return None;
    }
    if let Some(value) = find_tlv(envelope.payload, TlvType::BookSnapshot).unwrap() {
        let (header, bids, asks) = parse_book_snapshot(value).unwrap();
        recon.on_snapshot(&header, &bids, &asks);
        return None;
    }
    let delta: BookDeltaTlv = extract_tlv(envelope.payload, TlvType::BookDelta).unwrap();
    Some(recon.on_delta(&delta).unwrap())
}

#[tokio::test]
async fn test_mapping_snapshot_delta_builds_named_book() {
    init_test_logging();
    let relay = start_relay(MarketDataLogic, RelayConfig::market_data_defaults()).await;

    let mut consumer = connect_settled(&relay).await;
    let mut producer = connect_settled(&relay).await;

    let canonical = "kraken:BTC/USD";
    let hash = hash_symbol(canonical);
    let bids = [BookLevel::new(64_000.0, 1.5), BookLevel::new(63_999.0, 2.0)];
    let asks = [BookLevel::new(64_001.0, 1.0)];
    let delta = BookDeltaTlv::new(hash, 11, 64_000.5, 0.75, BookSide::Bid, DeltaAction::Set);

    let mut wire = Vec::new();
    wire.extend_from_slice(&mapping_envelope(0, hash, canonical));
    wire.extend_from_slice(&snapshot_envelope(1, hash, 10, &bids, &asks));
    wire.extend_from_slice(&delta_envelope(2, &delta));
    producer.write_all(&wire).await.unwrap();

    let frames = read_frames(&mut consumer, 3).await;

    let registry = SymbolRegistry::new();
    let mut recon = Reconstructor::new();
    for frame in &frames {
        route_frame(frame, &registry, &mut recon);
    }

    assert!(recon.is_live(hash));
    let book = recon.book(hash).unwrap();
    assert_eq!(book.sequence(), 11);
    assert_eq!(book.best_bid(), Some((64_000.5, 0.75)));
    assert_eq!(book.best_ask(), Some((64_001.0, 1.0)));
    assert_eq!(book.bid_depth(), 3);

    let view = BookView::of(book, &registry);
    assert_eq!(view.symbol, "kraken:BTC/USD");
    assert_eq!(view.best_bid, Some((64_000.5, 0.75)));
}

#[tokio::test]
async fn test_early_delta_buffered_until_snapshot() {
    init_test_logging();
    let relay = start_relay(MarketDataLogic, RelayConfig::market_data_defaults()).await;

    let mut consumer = connect_settled(&relay).await;
    let mut producer = connect_settled(&relay).await;

    let hash = hash_symbol("kraken:ETH/USD");
    let delta = BookDeltaTlv::new(hash, 11, 3_000.5, 4.0, BookSide::Ask, DeltaAction::Set);
    let bids = [BookLevel::new(2_999.0, 1.0)];
    let asks = [BookLevel::new(3_001.0, 2.0)];

    // Delta arrives before the snapshot that makes the book live.
    let mut wire = Vec::new();
    wire.extend_from_slice(&delta_envelope(0, &delta));
    wire.extend_from_slice(&snapshot_envelope(1, hash, 10, &bids, &asks));
    producer.write_all(&wire).await.unwrap();

    let frames = read_frames(&mut consumer, 2).await;

    let registry = SymbolRegistry::new();
    let mut recon = Reconstructor::new();
    let outcome = route_frame(&frames[0], &registry, &mut recon);
    assert_eq!(outcome, Some(DeltaOutcome::Buffered));
    assert!(!recon.is_live(hash));

    route_frame(&frames[1], &registry, &mut recon);
    assert!(recon.is_live(hash));

    // The buffered delta was replayed on top of the snapshot.
    let book = recon.book(hash).unwrap();
    assert_eq!(book.sequence(), 11);
    assert_eq!(book.best_ask(), Some((3_000.5, 4.0)));
}
