use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use crew_api_types::CrewEvent;
use crew_client::{ConnectionState, RealtimeChannel};
use crew_core::config::RealtimeConfig;
use serde_json::json;

/// WebSocket endpoint that drops the first `drops` connections without a
/// close frame and streams two events on the next one.
struct Flaky {
    connections: AtomicUsize,
    drops: usize,
}

impl Flaky {
    fn new(drops: usize) -> Arc<Self> {
        Arc::new(Self {
            connections: AtomicUsize::new(0),
            drops,
        })
    }

    fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(flaky): State<Arc<Flaky>>) -> impl IntoResponse {
    let n = flaky.connections.fetch_add(1, Ordering::SeqCst);
    let drop_it = n < flaky.drops;
    ws.on_upgrade(move |socket| serve_socket(socket, drop_it))
}

async fn serve_socket(mut socket: WebSocket, drop_it: bool) {
    if drop_it {
        drop(socket);
        return;
    }
    for frame in [
        json!({"type": "agent_started", "agent": "Researcher"}),
        json!({"type": "agent_completed", "agent": "Researcher"}),
    ] {
        if socket.send(Message::Text(frame.to_string().into())).await.is_err() {
            return;
        }
    }
    // Stay open until the client goes away.
    while let Some(Ok(_)) = socket.recv().await {}
}

async fn spawn_server(flaky: Arc<Flaky>) -> String {
    let router = Router::new()
        .route("/ws/{id}", get(ws_handler))
        .with_state(flaky);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind to ephemeral port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("ws://{addr}/ws/sess-1")
}

fn retry(max_reconnects: u32) -> RealtimeConfig {
    RealtimeConfig {
        max_reconnects,
        reconnect_delay_ms: 10,
    }
}

async fn recv(channel: &RealtimeChannel) -> CrewEvent {
    tokio::time::timeout(Duration::from_secs(5), channel.recv())
        .await
        .expect("event arrived in time")
        .expect("channel still open")
}

#[tokio::test]
async fn reconnects_after_abnormal_drop() {
    let flaky = Flaky::new(1);
    let url = spawn_server(flaky.clone()).await;

    let channel = RealtimeChannel::connect(url.clone(), &retry(2));
    assert_eq!(channel.url(), url);

    let first = recv(&channel).await;
    let second = recv(&channel).await;
    assert!(matches!(first, CrewEvent::AgentStarted(_)), "{first:?}");
    assert!(matches!(second, CrewEvent::AgentCompleted(_)), "{second:?}");

    let mut state = channel.watch_state();
    let settled = tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == ConnectionState::Open),
    )
    .await
    .expect("state settled in time")
    .expect("reader still publishing")
    .clone();
    assert_eq!(settled, ConnectionState::Open);
    assert_eq!(flaky.connections(), 2);
}

#[tokio::test]
async fn gives_up_when_reconnects_run_out() {
    let flaky = Flaky::new(usize::MAX);
    let url = spawn_server(flaky.clone()).await;

    let channel = RealtimeChannel::connect(url, &retry(1));

    let mut state = channel.watch_state();
    let settled = tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| matches!(s, ConnectionState::Failed(_))),
    )
    .await
    .expect("state settled in time")
    .expect("reader still publishing")
    .clone();
    assert!(matches!(settled, ConnectionState::Failed(_)), "{settled:?}");

    // One initial attempt plus one reconnect.
    assert_eq!(flaky.connections(), 2);
    assert!(channel.recv().await.is_none());
    assert_eq!(channel.state(), channel.ready().await);
}
