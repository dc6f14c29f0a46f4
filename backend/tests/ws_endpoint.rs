mod support;

use std::sync::Arc;
use std::time::Duration;

use backend::api;
use backend::state::AppState;
use futures::{SinkExt, StreamExt};
use market::protocol::{ClientEvent, ServerEvent};
use market::{Metal, Purity};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use support::{app, later};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serve the full router on an ephemeral port and return the push url.
async fn serve(state: Arc<AppState>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = api::router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("ws://{addr}/ws")
}

async fn connect(url: &str) -> Ws {
    connect_async(url).await.unwrap().0
}

async fn next_event(ws: &mut Ws) -> ServerEvent {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("no frame within 5s")
            .unwrap()
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send(ws: &mut Ws, event: &ClientEvent) {
    let text = serde_json::to_string(event).unwrap();
    ws.send(Message::Text(text.into())).await.unwrap();
}

/// True when nothing arrives within `window`.
async fn stays_quiet(ws: &mut Ws, window: Duration) -> bool {
    tokio::time::timeout(window, ws.next()).await.is_err()
}

#[tokio::test]
async fn every_connection_opens_with_the_full_table() {
    let state = app(None);
    let url = serve(Arc::clone(&state)).await;

    let mut first = connect(&url).await;
    let ServerEvent::InitialData(hello) = next_event(&mut first).await else {
        panic!("first frame must be initialData");
    };
    assert_eq!(hello.cities.len(), state.cities.cities().len());
    assert_eq!(hello.snapshot.len(), state.cities.cities().len());
    assert_eq!(hello.snapshot.updated_ms, state.store.last_update_ms());

    let report = state.scheduler.fast_tick(later()).await;

    let ServerEvent::PriceUpdate(pushed) = next_event(&mut first).await else {
        panic!("expected a priceUpdate after the tick");
    };
    assert_eq!(pushed.updated_ms, report.snapshot.updated_ms);

    // a later subscriber starts from the table as it is now
    let mut second = connect(&url).await;
    let ServerEvent::InitialData(hello) = next_event(&mut second).await else {
        panic!("first frame must be initialData");
    };
    assert_eq!(hello.snapshot.updated_ms, report.snapshot.updated_ms);
    assert_eq!(
        hello.snapshot.get("mumbai").unwrap().price(Metal::Gold, Purity::K24),
        report.snapshot.get("mumbai").unwrap().price(Metal::Gold, Purity::K24),
    );
}

#[tokio::test]
async fn subscribe_is_advisory_and_updates_stay_full() {
    let state = app(None);
    let url = serve(Arc::clone(&state)).await;

    let mut ws = connect(&url).await;
    next_event(&mut ws).await;

    send(
        &mut ws,
        &ClientEvent::Subscribe {
            city_ids: vec!["mumbai".into()],
        },
    )
    .await;
    ws.send(Message::Text("not an event".into())).await.unwrap();

    state.scheduler.fast_tick(later()).await;

    let ServerEvent::PriceUpdate(pushed) = next_event(&mut ws).await else {
        panic!("expected a priceUpdate");
    };
    assert_eq!(pushed.len(), state.cities.cities().len());
}

#[tokio::test]
async fn refresh_request_resends_only_when_behind() {
    let state = app(None);
    let url = serve(Arc::clone(&state)).await;

    let mut ws = connect(&url).await;
    next_event(&mut ws).await;

    // already holding the latest table: nothing to resend
    send(&mut ws, &ClientEvent::RequestUpdate).await;
    assert!(stays_quiet(&mut ws, Duration::from_millis(300)).await);

    let report = state.scheduler.fast_tick(later()).await;
    send(&mut ws, &ClientEvent::RequestUpdate).await;

    // the tick and the refresh race; either way the snapshot arrives once
    let ServerEvent::PriceUpdate(pushed) = next_event(&mut ws).await else {
        panic!("expected a priceUpdate");
    };
    assert_eq!(pushed.updated_ms, report.snapshot.updated_ms);
    assert!(stays_quiet(&mut ws, Duration::from_millis(300)).await);

    // refresh never writes to the store
    assert_eq!(state.store.last_update_ms(), report.snapshot.updated_ms);
}

#[tokio::test]
async fn closing_the_socket_releases_the_subscription() {
    let state = app(None);
    let url = serve(Arc::clone(&state)).await;

    let mut ws = connect(&url).await;
    next_event(&mut ws).await;
    assert_eq!(state.broadcaster.subscriber_count(), 1);

    ws.close(None).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while state.broadcaster.subscriber_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscription still registered after close");
}
