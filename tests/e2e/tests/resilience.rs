//! Fault scenarios on the producer side of the relay: garbage in the byte
//! stream, corrupted payloads, and producer reconnects. Consumers should
//! only ever see clean, complete envelopes.

use relay_core::RelayConfig;
use relay_market_data::MarketDataLogic;
use tickbus_e2e_tests::{
    connect_settled, init_test_logging, read_bytes, start_relay, trade_envelope,
};
use tokio::io::AsyncWriteExt;
use types::Source;

#[tokio::test]
async fn test_stream_resyncs_past_garbage() {
    init_test_logging();
    let relay = start_relay(MarketDataLogic, RelayConfig::market_data_defaults()).await;

    let mut consumer = connect_settled(&relay).await;
    let mut producer = connect_settled(&relay).await;

    // 0xAA can never match the first magic byte, so the relay must slip
    // past every one of these before finding the envelope.
    let garbage = vec![0xAAu8; 37];
    let envelope = trade_envelope(Source::KrakenCollector, 0, 0xB007, 99.5);
    producer.write_all(&garbage).await.unwrap();
    producer.write_all(&envelope).await.unwrap();

    assert_eq!(read_bytes(&mut consumer, envelope.len()).await, envelope);
    assert_eq!(relay.metrics.bytes_skipped(), garbage.len() as u64);
    assert_eq!(relay.metrics.envelopes_forwarded(), 1);
}

#[tokio::test]
async fn test_corrupt_envelope_dropped_clean_one_forwarded() {
    init_test_logging();
    let relay = start_relay(MarketDataLogic, RelayConfig::market_data_defaults()).await;

    let mut consumer = connect_settled(&relay).await;
    let mut producer = connect_settled(&relay).await;

    // Flip one payload byte; the header still frames correctly but the
    // checksum no longer matches, so the whole envelope must be dropped.
    let mut corrupt = trade_envelope(Source::KrakenCollector, 0, 0xB007, 99.5);
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0xFF;
    let clean = trade_envelope(Source::KrakenCollector, 1, 0xB007, 100.5);

    producer.write_all(&corrupt).await.unwrap();
    producer.write_all(&clean).await.unwrap();

    assert_eq!(read_bytes(&mut consumer, clean.len()).await, clean);
    assert_eq!(relay.metrics.checksum_drops(), 1);
    assert_eq!(relay.metrics.envelopes_forwarded(), 1);
}

#[tokio::test]
async fn test_producer_reconnect_stream_continues() {
    init_test_logging();
    let relay = start_relay(MarketDataLogic, RelayConfig::market_data_defaults()).await;

    let mut consumer = connect_settled(&relay).await;

    let mut first_half = Vec::new();
    let mut second_half = Vec::new();
    for seq in 0..2u64 {
        first_half.extend_from_slice(&trade_envelope(Source::KrakenCollector, seq, 0xB007, 10.0));
    }
    for seq in 2..4u64 {
        second_half.extend_from_slice(&trade_envelope(Source::KrakenCollector, seq, 0xB007, 11.0));
    }

    {
        let mut producer = connect_settled(&relay).await;
        producer.write_all(&first_half).await.unwrap();
        assert_eq!(read_bytes(&mut consumer, first_half.len()).await, first_half);
        // Producer drops here.
    }

    let mut producer = connect_settled(&relay).await;
    producer.write_all(&second_half).await.unwrap();

    assert_eq!(read_bytes(&mut consumer, second_half.len()).await, second_half);
    assert_eq!(relay.metrics.envelopes_forwarded(), 4);
    // Sequences stayed contiguous across the reconnect, so no gap was logged.
    assert_eq!(relay.metrics.sequence_gaps(), 0);
}
