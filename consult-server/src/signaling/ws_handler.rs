use crate::registry::ConnectionHandle;
use crate::signaling::{Connection, SignalingService};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use consult_core::ServerMessage;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let connection = Connection::open(service, ConnectionHandle::new(tx));
    let connection_id = connection.handle().id();
    info!("New WebSocket connection: {}", connection_id);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize server message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv = async {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => connection.handle_text(text.as_str()).await,
                Message::Close(_) => break,
                _ => {}
            }
        }
    };

    tokio::select! {
        _ = (&mut send_task) => {}
        _ = recv => {}
    };

    send_task.abort();
    connection.close().await;

    info!("WebSocket disconnected: {}", connection_id);
}
