//! Fan-out guarantees: every consumer of a channel sees the same bytes in
//! the same order, a late joiner starts from the live stream with no
//! backfill, and each channel forwards only its own domain.

use relay_core::RelayConfig;
use relay_market_data::MarketDataLogic;
use relay_signal::SignalLogic;
use tickbus_e2e_tests::{
    connect_settled, init_test_logging, read_bytes, signal_envelope, start_relay, trade_envelope,
};
use tokio::io::AsyncWriteExt;
use types::Source;

#[tokio::test]
async fn test_two_consumers_receive_identical_bytes() {
    init_test_logging();
    let relay = start_relay(MarketDataLogic, RelayConfig::market_data_defaults()).await;

    let mut consumer_a = connect_settled(&relay).await;
    let mut consumer_b = connect_settled(&relay).await;
    let mut producer = connect_settled(&relay).await;

    let mut sent = Vec::new();
    for seq in 0..5u64 {
        sent.extend_from_slice(&trade_envelope(
            Source::KrakenCollector,
            seq,
            0xB007,
            64_000.0 + seq as f64,
        ));
    }
    producer.write_all(&sent).await.unwrap();

    let got_a = read_bytes(&mut consumer_a, sent.len()).await;
    let got_b = read_bytes(&mut consumer_b, sent.len()).await;
    assert_eq!(got_a, sent, "consumer A must see the producer's exact bytes");
    assert_eq!(got_b, sent, "consumer B must see the producer's exact bytes");
    assert_eq!(relay.metrics.envelopes_forwarded(), 5);
}

#[tokio::test]
async fn test_late_joiner_starts_from_live_stream() {
    init_test_logging();
    let relay = start_relay(MarketDataLogic, RelayConfig::market_data_defaults()).await;

    let mut early = connect_settled(&relay).await;
    let mut producer = connect_settled(&relay).await;

    let batch1: Vec<u8> = (0..3u64)
        .flat_map(|seq| trade_envelope(Source::KrakenCollector, seq, 0xB007, 50.0))
        .collect();
    producer.write_all(&batch1).await.unwrap();
    // Early consumer receiving the batch proves it has been broadcast.
    assert_eq!(read_bytes(&mut early, batch1.len()).await, batch1);

    let mut late = connect_settled(&relay).await;

    let batch2: Vec<u8> = (3..6u64)
        .flat_map(|seq| trade_envelope(Source::KrakenCollector, seq, 0xB007, 51.0))
        .collect();
    producer.write_all(&batch2).await.unwrap();

    // The late joiner's stream starts at the second batch; nothing is
    // replayed from before it connected.
    assert_eq!(read_bytes(&mut late, batch2.len()).await, batch2);
    assert_eq!(read_bytes(&mut early, batch2.len()).await, batch2);
}

#[tokio::test]
async fn test_signal_channel_ignores_market_data() {
    init_test_logging();
    let relay = start_relay(SignalLogic, RelayConfig::signal_defaults()).await;

    let mut consumer = connect_settled(&relay).await;
    let mut producer = connect_settled(&relay).await;

    let market = trade_envelope(Source::KrakenCollector, 0, 0xB007, 10.0);
    let signal = signal_envelope(0, 7);
    producer.write_all(&market).await.unwrap();
    producer.write_all(&signal).await.unwrap();

    // The first thing the consumer sees is the signal; the market envelope
    // was parsed, counted as liveness, and dropped.
    assert_eq!(read_bytes(&mut consumer, signal.len()).await, signal);
    assert_eq!(relay.metrics.envelopes_forwarded(), 1);
}
