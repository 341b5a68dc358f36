//! Push channel: import progress over Server-Sent Events and WebSocket.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{SinkExt, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::state::AppState;

/// Control messages sent only on the WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsControl {
    ConnectionStatus { status: &'static str, timestamp: i64 },
    Error { message: String, lagged: u64 },
}

pub async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.events.subscribe();
    let shutdown = state.shutdown.clone();

    let stream = async_stream::stream! {
        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = rx.recv() => received,
            };
            match received {
                Ok(evt) => {
                    if let Ok(data) = serde_json::to_string(&evt) {
                        yield Ok(Event::default().event(evt.event_name()).data(data));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "SSE client lagged");
                    yield Ok(Event::default()
                        .event("error")
                        .data(format!(r#"{{"lagged":{n}}}"#)));
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// GET /api/ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_json<T: Serialize>(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    value: &T,
) -> bool {
    match serde_json::to_string(value) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize websocket message");
            true
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    // Subscribe before greeting so nothing emitted in between is lost.
    let mut event_rx = state.events.subscribe();

    let greeting = WsControl::ConnectionStatus {
        status: "connected",
        timestamp: chrono::Utc::now().timestamp_millis(),
    };
    if !send_json(&mut sender, &greeting).await {
        return;
    }
    tracing::info!("websocket client connected");

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }

            event = event_rx.recv() => {
                match event {
                    Ok(evt) => {
                        if !send_json(&mut sender, &evt).await {
                            tracing::debug!("websocket send failed, closing connection");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        tracing::warn!(lagged = count, "websocket client lagged");
                        let msg = WsControl::Error {
                            message: format!("missed {count} events"),
                            lagged: count,
                        };
                        if !send_json(&mut sender, &msg).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!("event channel closed, closing websocket");
                        break;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "websocket error");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("websocket client disconnected");
}
