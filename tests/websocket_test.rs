// End-to-end test: real warp server on an ephemeral port, real websocket clients

use chrono::{Duration as ChronoDuration, Utc};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};

use murmur::config::ServerConfig;
use murmur::core::RoomServer;
use murmur::handlers::routes;
use murmur::security::WordListFilter;
use murmur::storage::{MemoryMessageStore, MemoryRoomStore, MemorySessionStore, StoredRoom};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> SocketAddr {
    let config = ServerConfig::for_testing();
    let rooms = Arc::new(MemoryRoomStore::new());
    let now = Utc::now();
    rooms
        .insert(StoredRoom::new("WSROOM", "Socket room".to_string(), now, now + ChronoDuration::hours(24)))
        .await;

    let server = Arc::new(RoomServer::new(
        config.policy.clone(),
        rooms,
        Arc::new(MemorySessionStore::new()),
        Arc::new(MemoryMessageStore::new()),
        Arc::new(WordListFilter::new(["darn"])),
    ));

    let (addr, serve) = warp::serve(routes(server)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(serve);
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let url = format!("ws://{}/ws", addr);
    let (client, _) = connect_async(url).await.expect("websocket connect failed");
    client
}

async fn send_json(client: &mut Client, value: Value) {
    client
        .send(Message::Text(value.to_string()))
        .await
        .expect("send failed");
}

async fn next_json(client: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("server sent invalid json");
        }
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let addr = start_server().await;
    let body = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_join_send_and_receive_over_websocket() {
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    send_json(&mut alice, json!({ "type": "join-room", "roomCode": "wsroom", "anonId": "A" })).await;
    let joined = next_json(&mut alice).await;
    assert_eq!(joined["type"], "joined-room");
    assert_eq!(joined["roomCode"], "WSROOM");
    assert_eq!(joined["roomName"], "Socket room");
    assert_eq!(joined["isVerified"], false);
    let recent = next_json(&mut alice).await;
    assert_eq!(recent["type"], "recent-messages");
    assert_eq!(recent["messages"].as_array().unwrap().len(), 0);

    send_json(&mut bob, json!({ "type": "join-room", "roomCode": "WSROOM", "anonId": "B" })).await;
    next_json(&mut bob).await;
    next_json(&mut bob).await;

    send_json(
        &mut alice,
        json!({ "type": "send-message", "roomCode": "WSROOM", "anonId": "A", "content": "  darn hello " }),
    )
    .await;

    for client in [&mut alice, &mut bob] {
        let event = next_json(client).await;
        assert_eq!(event["type"], "new-message");
        assert_eq!(event["content"], "**** hello");
        assert_eq!(event["anonId"], "A");
        assert_eq!(event["roomCode"], "WSROOM");
        assert!(event["id"].as_str().is_some());
        assert!(event["createdAt"].as_str().is_some());
        assert!(event["expiresAt"].as_str().is_some());
    }
}

#[tokio::test]
async fn test_errors_go_to_the_acting_connection() {
    let addr = start_server().await;
    let mut client = connect(addr).await;

    send_json(&mut client, json!({ "type": "join-room", "roomCode": "WSROOM" })).await;
    let event = next_json(&mut client).await;
    assert_eq!(event["type"], "error");
    assert_eq!(event["code"], "MISSING_FIELDS");

    client.send(Message::Text("garbage".to_string())).await.unwrap();
    let event = next_json(&mut client).await;
    assert_eq!(event["code"], "INVALID_MESSAGE");

    send_json(&mut client, json!({ "type": "report-message", "messageId": "nope", "anonId": "A" })).await;
    let event = next_json(&mut client).await;
    assert_eq!(event["code"], "MESSAGE_NOT_FOUND");
}
