//! Socket-level integration tests: a real server on an ephemeral port,
//! driven by real WebSocket clients.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use events::{ClientEvent, Position, RoomObject, ServerEvent};
use replica::{CanvasSession, ConnectionStatus};
use roomsync::routes;
use roomsync::state::AppState;
use roomsync::store::RoomStore;

type WsClient =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn spawn_server() -> (AppState, String) {
    let state = AppState::new(RoomStore::new());
    let app = routes::app(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server failed");
    });

    (state, format!("ws://{addr}/ws"))
}

async fn connect(url: &str) -> WsClient {
    let (stream, _) = connect_async(url).await.expect("ws connect");
    stream
}

async fn send(client: &mut WsClient, event: &ClientEvent) {
    client
        .send(Message::Text(events::encode_event(event).into()))
        .await
        .expect("ws send");
}

async fn recv(client: &mut WsClient) -> ServerEvent {
    loop {
        let message = timeout(Duration::from_millis(500), client.next())
            .await
            .expect("receive timed out")
            .expect("stream ended")
            .expect("ws error");
        if let Message::Text(text) = message {
            return events::decode_server_event(&text).expect("decode server event");
        }
    }
}

async fn assert_silent(client: &mut WsClient) {
    assert!(
        timeout(Duration::from_millis(150), client.next()).await.is_err(),
        "expected no event on this connection"
    );
}

async fn join(client: &mut WsClient, room_id: &str) -> Vec<RoomObject> {
    send(client, &ClientEvent::JoinRoom { room_id: room_id.to_owned() }).await;
    match recv(client).await {
        ServerEvent::RoomState(objects) => objects,
        other => panic!("expected room_state, got {other:?}"),
    }
}

fn object(id: &str, kind: &str, x: f64, y: f64) -> RoomObject {
    RoomObject::new(id, kind, x, y)
}

#[tokio::test]
async fn join_checkpoint_delivers_the_full_snapshot_exactly_once() {
    let (state, url) = spawn_server().await;
    {
        let mut store = state.store.write().await;
        store.add("r1", object("a", "sticky", 1.0, 1.0));
        store.add("r1", object("b", "sticky", 2.0, 2.0));
        store.add("r1", object("c", "sticky", 3.0, 3.0));
    }

    let mut client = connect(&url).await;
    let objects = join(&mut client, "r1").await;

    assert_eq!(objects.len(), 3);
    assert_silent(&mut client).await;
}

#[tokio::test]
async fn create_reaches_peers_but_is_never_echoed() {
    let (_state, url) = spawn_server().await;
    let mut a = connect(&url).await;
    let mut b = connect(&url).await;
    join(&mut a, "r1").await;
    join(&mut b, "r1").await;

    let mut created = object("o1", "sticky", 10.0, 10.0);
    created.extra.insert("color".to_owned(), serde_json::json!("#D94B4B"));
    send(&mut a, &ClientEvent::CreateObject(created.clone())).await;

    assert_eq!(recv(&mut b).await, ServerEvent::ObjectCreated(created));
    assert_silent(&mut a).await;
}

#[tokio::test]
async fn end_to_end_create_and_forced_drag_through_sessions() {
    let (_state, url) = spawn_server().await;
    let mut socket_a = connect(&url).await;
    let mut socket_b = connect(&url).await;

    let mut session_a = CanvasSession::new();
    session_a.set_status(ConnectionStatus::Connected);
    let mut session_b = CanvasSession::new();
    session_b.set_status(ConnectionStatus::Connected);

    send(&mut socket_a, &session_a.join_room("r1")).await;
    session_a.apply_server(recv(&mut socket_a).await);
    send(&mut socket_b, &session_b.join_room("r1")).await;
    session_b.apply_server(recv(&mut socket_b).await);

    // A creates o1 optimistically and emits.
    let event = session_a
        .create_object(object("o1", "x", 10.0, 10.0))
        .expect("connected create emits");
    send(&mut socket_a, &event).await;

    // B receives the exact payload and mirrors it.
    let created = recv(&mut socket_b).await;
    assert_eq!(created, ServerEvent::ObjectCreated(object("o1", "x", 10.0, 10.0)));
    session_b.apply_server(created);
    assert!(session_b.get("o1").is_some());

    // A ends a drag at (50, 50): forced emission, never throttled away.
    let event = session_a
        .end_drag("o1", Position { x: 50.0, y: 50.0 })
        .expect("forced update emits");
    send(&mut socket_a, &event).await;

    session_b.apply_server(recv(&mut socket_b).await);
    let mirrored = session_b.get("o1").expect("o1 on B");
    assert!((mirrored.x - 50.0).abs() < f64::EPSILON);
    assert!((mirrored.y - 50.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn mutations_before_join_never_reach_the_store() {
    let (_state, url) = spawn_server().await;
    let mut client = connect(&url).await;

    send(&mut client, &ClientEvent::CreateObject(object("o1", "sticky", 0.0, 0.0))).await;

    // Same connection, FIFO: the join snapshot proves the create was
    // dropped, not applied.
    let objects = join(&mut client, "r1").await;
    assert!(objects.is_empty());
}

#[tokio::test]
async fn update_of_unknown_object_is_not_forwarded() {
    let (_state, url) = spawn_server().await;
    let mut a = connect(&url).await;
    let mut b = connect(&url).await;
    join(&mut a, "r1").await;
    join(&mut b, "r1").await;

    send(
        &mut a,
        &ClientEvent::UpdateObject {
            object_id: "ghost".to_owned(),
            position: Position { x: 1.0, y: 1.0 },
        },
    )
    .await;

    assert_silent(&mut b).await;
}

#[tokio::test]
async fn delete_is_broadcast_and_objects_outlive_their_creator() {
    let (state, url) = spawn_server().await;
    let mut a = connect(&url).await;
    let mut b = connect(&url).await;
    join(&mut a, "r1").await;
    join(&mut b, "r1").await;

    send(&mut a, &ClientEvent::CreateObject(object("o1", "sticky", 0.0, 0.0))).await;
    assert!(matches!(recv(&mut b).await, ServerEvent::ObjectCreated(_)));

    // Creator disconnects: B hears peer_left, the object stays.
    drop(a);
    assert!(matches!(recv(&mut b).await, ServerEvent::PeerLeft { .. }));
    assert_eq!(state.store.read().await.list("r1").len(), 1);

    send(&mut b, &ClientEvent::DeleteObject { object_id: "o1".to_owned() }).await;
    assert_silent(&mut b).await;
    assert!(state.store.read().await.list("r1").is_empty());
}

#[tokio::test]
async fn cursor_moves_are_relayed_but_never_stored() {
    let (state, url) = spawn_server().await;
    let mut a = connect(&url).await;
    let mut b = connect(&url).await;
    join(&mut a, "r1").await;
    join(&mut b, "r1").await;

    send(&mut a, &ClientEvent::CursorMoved { x: 5.0, y: 6.0 }).await;

    match recv(&mut b).await {
        ServerEvent::CursorMoved { x, y, .. } => {
            assert!((x - 5.0).abs() < f64::EPSILON);
            assert!((y - 6.0).abs() < f64::EPSILON);
        }
        other => panic!("expected cursor_moved, got {other:?}"),
    }
    assert!(state.store.read().await.list("r1").is_empty());
}
