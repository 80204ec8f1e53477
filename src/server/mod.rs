use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use mnemo_core::protocol::{
    operation_descriptors, ClientMessage, MemoryRequest, MessageEnvelope, ServerEvent, ServerInfo,
};
use mnemo_core::RequestHandler;

pub mod stdio;

pub async fn start_server<H>(port: u16, handler: Arc<H>) -> Result<()>
where
    H: RequestHandler + 'static,
{
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await.context("Failed to bind server")?;

    info!("mnemo server listening on: ws://{}", addr);

    while let Ok((stream, peer)) = listener.accept().await {
        let handler = handler.clone();
        tokio::spawn(async move {
            match accept_async(stream).await {
                Ok(ws_stream) => handle_connection(ws_stream, handler).await,
                Err(e) => warn!("WebSocket handshake with {} failed: {}", peer, e),
            }
        });
    }

    Ok(())
}

async fn handle_connection<H>(
    ws_stream: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    handler: Arc<H>,
) where
    H: RequestHandler + 'static,
{
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<(Option<Uuid>, ServerEvent)>();

    // Task to forward ServerEvents to WebSocket
    let send_task = tokio::spawn(async move {
        let mut event_id = 0;
        while let Some((request_id, event)) = rx.recv().await {
            event_id += 1;
            let envelope = MessageEnvelope::event(event, request_id, event_id);
            if let Ok(json) = serde_json::to_string(&envelope) {
                if ws_sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming WebSocket messages
    while let Some(Ok(msg)) = ws_receiver.next().await {
        let Message::Text(text) = msg else {
            continue;
        };
        match serde_json::from_str::<MessageEnvelope<ClientMessage>>(&text) {
            Ok(envelope) => {
                let request_id = envelope.request_id;
                let handler = handler.clone();
                let tx = tx.clone();
                // Calls on different categories may run side by side
                tokio::spawn(async move {
                    let event = dispatch(envelope.payload, handler.as_ref()).await;
                    let _ = tx.send((request_id, event));
                });
            }
            Err(e) => {
                debug!("Unparsable message: {}", e);
                let _ = tx.send((None, malformed(e)));
            }
        }
    }

    drop(tx);
    let _ = send_task.await;
}

/// Answer one client message
pub async fn dispatch<H>(msg: ClientMessage, handler: &H) -> ServerEvent
where
    H: RequestHandler + ?Sized,
{
    match msg {
        ClientMessage::Hello { client } => {
            debug!("Hello from {} {}", client.name, client.version);
            ServerEvent::HelloAck {
                server: ServerInfo {
                    name: "mnemo".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                operations: MemoryRequest::OPERATIONS.to_vec(),
            }
        }
        ClientMessage::ListOperations => ServerEvent::Operations {
            operations: operation_descriptors(),
        },
        ClientMessage::Call { request } => ServerEvent::Result {
            result: handler.handle_value(request).await,
        },
    }
}

fn malformed(err: serde_json::Error) -> ServerEvent {
    ServerEvent::Error {
        code: "INVALID_MESSAGE".to_string(),
        message: err.to_string(),
    }
}
