use chrono::Utc;
use futures_util::sink::SinkExt;
use futures_util::stream::StreamExt;
use log::{debug, error, info};
use std::convert::Infallible;
use tokio::sync::mpsc;
use warp::ws::{Message, WebSocket};
use warp::Filter;

use crate::constants::WS_PATH;
use crate::core::connection::Connection;
use crate::core::message_handler::RoomSessionHandler;
use crate::core::message_types::ServerEvent;
use crate::core::server::SharedRoomServer;

/// Websocket endpoint plus a health check
pub fn routes(
    server: SharedRoomServer,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let ws_route = warp::path(WS_PATH)
        .and(warp::ws())
        .and(with_server(server))
        .map(|ws: warp::ws::Ws, server: SharedRoomServer| {
            debug!("New websocket connection");
            ws.on_upgrade(move |socket| handle_ws_client(socket, server))
        });

    let health_route = warp::path("health").map(|| "OK");

    ws_route.or(health_route)
}

fn with_server(
    server: SharedRoomServer,
) -> impl Filter<Extract = (SharedRoomServer,), Error = Infallible> + Clone {
    warp::any().map(move || server.clone())
}

// Handle a WebSocket connection
pub async fn handle_ws_client(ws: WebSocket, server: SharedRoomServer) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Spawn a task to forward events from our channel to the WebSocket
    tokio::task::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize outbound event: {}", e);
                    continue;
                }
            };
            if let Err(e) = ws_tx.send(Message::text(text)).await {
                debug!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    let connection = Connection::new(tx);
    let handler = RoomSessionHandler::new(connection.id.clone(), server.clone());
    server.registry().attach(connection);
    info!(
        "Client connected: {} ({} open)",
        handler.connection_id(),
        server.registry().connection_count()
    );

    // Events of one connection are handled strictly in order
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(msg) => {
                if msg.is_close() {
                    break;
                }
                let text = match msg.to_str() {
                    Ok(text) => text,
                    // Only text frames carry events
                    Err(_) => continue,
                };
                let outbound = handler.handle_text(text, Utc::now()).await;
                handler.deliver(outbound);
            }
            Err(e) => {
                error!("WebSocket error on {}: {}", handler.connection_id(), e);
                break;
            }
        }
    }

    handler.on_disconnect();
}
