use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::demo::DemoProducer;
use crate::session::Session;
use crate::webcast::client::{WebcastClient, WsDialer};
use crate::webcast::connection::GatewayConnection;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
}

/// First frame a widget client must send over the websocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum StartRequest {
    /// Attach to a live room by broadcaster username.
    Start { username: String },
    /// Run against the synthetic gift generator instead.
    Demo,
}

/// Server listener.
pub async fn serve(config: Config) -> std::io::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("widget server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(config)).await
}

pub fn router(config: Config) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(AppState { config }))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| widget_session(socket, state))
}

/// Drives one widget client: read the start frame, spawn the event source
/// and the session, then forward session updates until either side goes
/// away. Everything spawned here is cancelled on exit.
async fn widget_session(mut socket: WebSocket, state: Arc<AppState>) {
    let request = match read_start_request(&mut socket).await {
        Ok(request) => request,
        Err(reason) => {
            warn!(%reason, "rejecting widget client");
            let frame = json!({ "type": "rejected", "reason": reason }).to_string();
            let _ = socket.send(Message::Text(frame.into())).await;
            return;
        }
    };

    let config = state.config.clone();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    match request {
        StartRequest::Start { username } => {
            let connection = GatewayConnection::new(&config.gateway_url, username.trim());
            let client = WebcastClient::new(connection, Arc::new(WsDialer), event_tx);
            tokio::spawn(client.run(cancel.child_token()));
        }

        StartRequest::Demo => {
            let producer = DemoProducer::new(config.demo_interval, event_tx);
            tokio::spawn(producer.run(cancel.child_token()));
        }
    }

    let session = Session::new(config, event_rx, update_tx);
    tokio::spawn(session.run(cancel.child_token()));

    loop {
        tokio::select! {
            update = update_rx.recv() => match update {
                Some(update) => {
                    let frame = match serde_json::to_string(&update) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!("failed to encode widget update: {}", e);
                            continue;
                        }
                    };

                    if socket.send(Message::Text(frame.into())).await.is_err() {
                        debug!("widget client receive side gone");
                        break;
                    }
                }

                // Session ended (stream over); nothing more to forward.
                None => break,
            },

            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // The widget sends nothing after the start frame.
                Some(Ok(_)) => continue,
            },
        }
    }

    cancel.cancel();
}

async fn read_start_request(socket: &mut WebSocket) -> Result<StartRequest, String> {
    let frame = match socket.recv().await {
        Some(Ok(Message::Text(text))) => text,
        _ => return Err("expected a start frame".to_string()),
    };

    let request: StartRequest =
        serde_json::from_str(&frame).map_err(|e| format!("malformed start frame: {e}"))?;

    // Reject a blank identifier before any connection attempt.
    if let StartRequest::Start { username } = &request {
        if username.trim().is_empty() {
            return Err("username is required".to_string());
        }
    }

    Ok(request)
}
