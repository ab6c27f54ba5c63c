use std::time::Duration;

use awardwatch::{
    classifier::{EligibilityTier, SpotClassifier},
    history::Mode,
    membership::MemberLevel,
    roster::RosterEntry,
    stream::{SpotStream, StreamStats},
};
use time::macros::date;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::support::{NOW, member, seeded_cache, spot, worked_members};

fn warm_cache() -> std::sync::Arc<awardwatch::cache::EligibilityCache> {
    let (mut entries, history) = worked_members("W", 98, MemberLevel::Member);
    entries.push(RosterEntry::current(member(
        "N0NEW",
        "30000",
        MemberLevel::Member,
        date!(2021 - 01 - 01),
    )));
    let (cache, _, _) = seeded_cache(entries, history);
    cache.get_snapshot().expect("snapshot should build");
    cache
}

#[tokio::test]
async fn given_invalid_spot_in_stream_when_running_then_it_is_skipped_and_stream_continues() {
    let cache = warm_cache();
    let (spot_tx, spot_rx) = mpsc::channel(8);
    let (result_tx, mut result_rx) = mpsc::channel(8);
    let stream = SpotStream::new(
        SpotClassifier::default(),
        cache,
        spot_rx,
        result_tx,
        CancellationToken::new(),
    );
    let task = tokio::spawn(stream.run());

    spot_tx
        .send(spot("N0NEW", Mode::Cw, NOW))
        .await
        .expect("stream should accept spots");
    spot_tx
        .send(spot("", Mode::Cw, NOW))
        .await
        .expect("stream should accept spots");
    spot_tx
        .send(spot("DL1XYZ", Mode::Cw, NOW))
        .await
        .expect("stream should accept spots");
    drop(spot_tx);

    let stats = task.await.expect("stream task should not panic");
    assert_eq!(
        stats,
        StreamStats {
            classified: 2,
            skipped: 1
        }
    );

    let first = result_rx.recv().await.expect("first result should arrive");
    assert_eq!(first.spot.station_id, "N0NEW");
    assert_eq!(first.result.tier, EligibilityTier::Critical);
    let second = result_rx.recv().await.expect("second result should arrive");
    assert_eq!(second.spot.station_id, "DL1XYZ");
    assert_eq!(second.result.tier, EligibilityTier::None);
    assert!(result_rx.recv().await.is_none());
}

#[tokio::test]
async fn given_cancellation_when_stream_is_idle_then_run_returns() {
    let cache = warm_cache();
    let (_spot_tx, spot_rx) = mpsc::channel(8);
    let (result_tx, _result_rx) = mpsc::channel(8);
    let shutdown = CancellationToken::new();
    let stream = SpotStream::new(
        SpotClassifier::default(),
        cache,
        spot_rx,
        result_tx,
        shutdown.clone(),
    );
    let task = tokio::spawn(stream.run());

    shutdown.cancel();
    let stats = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("stream should stop after cancellation")
        .expect("stream task should not panic");
    assert_eq!(stats, StreamStats::default());
}

#[tokio::test]
async fn given_result_receiver_dropped_when_spot_arrives_then_stream_stops() {
    let cache = warm_cache();
    let (spot_tx, spot_rx) = mpsc::channel(8);
    let (result_tx, result_rx) = mpsc::channel(8);
    drop(result_rx);
    let stream = SpotStream::new(
        SpotClassifier::default(),
        cache,
        spot_rx,
        result_tx,
        CancellationToken::new(),
    );
    let task = tokio::spawn(stream.run());

    spot_tx
        .send(spot("N0NEW", Mode::Cw, NOW))
        .await
        .expect("stream should accept spots");
    let stats = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("stream should stop once results cannot be delivered")
        .expect("stream task should not panic");
    assert_eq!(stats.classified, 0);
}

#[tokio::test]
async fn given_cache_shut_down_when_queued_spots_drain_then_published_snapshot_still_serves_them() {
    let cache = warm_cache();
    let (spot_tx, spot_rx) = mpsc::channel(8);
    let (result_tx, mut result_rx) = mpsc::channel(8);
    spot_tx
        .send(spot("N0NEW", Mode::Cw, NOW))
        .await
        .expect("stream should accept spots");
    cache.shutdown();
    drop(spot_tx);

    let stream = SpotStream::new(
        SpotClassifier::default(),
        cache.clone(),
        spot_rx,
        result_tx,
        CancellationToken::new(),
    );
    let stats = tokio::time::timeout(Duration::from_secs(5), stream.run())
        .await
        .expect("stream should drain and stop");
    assert_eq!(stats.classified, 1);

    let drained = result_rx.recv().await.expect("queued spot should be classified");
    assert_eq!(drained.result.tier, EligibilityTier::Critical);
    assert_eq!(drained.result.explanation, "Need 2 more for Centurion.");
    assert!(cache.shutdown_token().is_cancelled());
}
