mod support;

use std::sync::Arc;

use market::protocol::ServerEvent;

use support::{app, later};

#[tokio::test]
async fn every_subscriber_gets_each_tick_in_order() {
    let state = app(None);
    let mut a = state.broadcaster.subscribe();
    let mut b = state.broadcaster.subscribe();
    assert_eq!(state.broadcaster.subscriber_count(), 2);

    let t = later();
    let first = state.scheduler.fast_tick(t).await;
    let second = state.scheduler.fast_tick(t + 10_000).await;
    assert_eq!(second.subscribers, 2);

    for sub in [&mut a, &mut b] {
        assert!(Arc::ptr_eq(&sub.next().await.unwrap(), &first.snapshot));
        assert!(Arc::ptr_eq(&sub.next().await.unwrap(), &second.snapshot));
    }
}

#[tokio::test]
async fn late_joiner_starts_from_the_latest_snapshot() {
    let state = app(None);
    let report = state.scheduler.fast_tick(later()).await;

    let sub = state.broadcaster.subscribe();
    assert!(Arc::ptr_eq(&sub.initial(), &report.snapshot));

    let hello = ServerEvent::initial(state.cities.cities(), sub.initial().as_ref().clone());
    let json = serde_json::to_value(&hello).unwrap();
    assert_eq!(json["event"], "initialData");
    assert_eq!(json["data"]["cities"].as_array().unwrap().len(), 20);
    assert!(json["data"]["prices"]["mumbai"].is_object());
}

#[tokio::test]
async fn dropped_subscriber_does_not_block_publishing() {
    let state = app(None);
    let gone = state.broadcaster.subscribe();
    drop(gone);

    let report = state.scheduler.fast_tick(later()).await;
    assert_eq!(report.subscribers, 0);
    assert!(Arc::ptr_eq(&state.broadcaster.latest(), &report.snapshot));
}
