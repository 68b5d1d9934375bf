use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::gift::event::RawGiftEvent;
use crate::webcast::connection::GatewayConnection;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket connection error: {0}")]
    Websocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed gateway frame: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("connection closed")]
    ConnectionClosed,
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;
pub type SocketWriter = Arc<Mutex<SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>>>;
pub type SocketReader = Arc<Mutex<SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>>>;

/// Events surfaced to the session. The demo producer feeds the same enum
/// through the same channel, so the aggregation side never knows whether
/// a gift came from a live room or the generator.
#[derive(Debug, Clone)]
pub enum WebcastEvent {
    Connected {
        username: String,
        room_id: Option<String>,
    },
    Gift(RawGiftEvent),
    /// Terminal for the session: stream over, or transport-level failure.
    Ended {
        reason: String,
    },
}

/// One frame pushed by the gateway: a type tag plus payload.
#[derive(Debug, Deserialize)]
struct GatewayFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn send(&mut self, message: &str) -> TransportResult<()>;
    async fn receive(&mut self) -> TransportResult<Option<String>>;
    async fn close(&mut self) -> TransportResult<()>;
}

#[async_trait]
pub trait Dialer: Send + Sync + fmt::Debug {
    async fn connect(&self, conn: &GatewayConnection) -> TransportResult<Box<dyn Transport>>;
}

#[derive(Debug)]
pub struct WsTransport {
    writer: SocketWriter,
    reader: SocketReader,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, message: &str) -> TransportResult<()> {
        let msg = Message::text(message);
        self.writer
            .lock()
            .await
            .send(msg)
            .await
            .map_err(TransportError::Websocket)?;

        debug!("sent: {}", message);
        Ok(())
    }

    async fn receive(&mut self) -> TransportResult<Option<String>> {
        let mut reader = self.reader.lock().await;
        match reader.next().await {
            Some(Ok(message)) => {
                if let Ok(text) = message.to_text() {
                    Ok(Some(text.to_string()))
                } else {
                    warn!("received non-text message: {:?}", message);
                    Ok(None)
                }
            }
            Some(Err(e)) => {
                error!("websocket error: {:?}", e);
                Err(TransportError::ConnectionClosed)
            }
            None => {
                info!("websocket connection closed");
                Err(TransportError::ConnectionClosed)
            }
        }
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.writer
            .lock()
            .await
            .close()
            .await
            .map_err(TransportError::Websocket)
    }
}

#[derive(Debug)]
pub struct WsDialer;

#[async_trait]
impl Dialer for WsDialer {
    #[instrument(skip(self, conn))]
    async fn connect(&self, conn: &GatewayConnection) -> TransportResult<Box<dyn Transport>> {
        let url = conn.url();
        info!("connecting to {}", &url);

        let (stream, _) = connect_async(url).await.map_err(TransportError::Websocket)?;
        let (w, r) = stream.split();

        Ok(Box::new(WsTransport {
            writer: Arc::new(Mutex::new(w)),
            reader: Arc::new(Mutex::new(r)),
        }))
    }
}

enum Flow {
    Continue,
    Ended,
}

/// Websocket client for one broadcaster's gift stream.
///
/// Any transport-level disconnect or stream-end frame is terminal for the
/// session; reconnection, if wanted, belongs to whoever spawns a new
/// client, never to the aggregation core.
#[derive(Debug)]
pub struct WebcastClient {
    connection: GatewayConnection,
    dialer: Arc<dyn Dialer>,
    events: mpsc::UnboundedSender<WebcastEvent>,
}

impl WebcastClient {
    pub fn new(
        connection: GatewayConnection,
        dialer: Arc<dyn Dialer>,
        events: mpsc::UnboundedSender<WebcastEvent>,
    ) -> Self {
        Self {
            connection,
            dialer,
            events,
        }
    }

    fn emit(&self, event: WebcastEvent) {
        if self.events.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }

    async fn respond_ping(&self, transport: &mut Box<dyn Transport>) -> TransportResult<()> {
        transport.send(r#"{"event":"pong"}"#).await
    }

    fn dispatch_connected(&self, data: &Value) {
        let room_id = data
            .get("roomId")
            .and_then(Value::as_str)
            .map(str::to_string);

        info!(username = %self.connection.username, ?room_id, "live room connected");
        self.emit(WebcastEvent::Connected {
            username: self.connection.username.clone(),
            room_id,
        });
    }

    fn dispatch_gift(&self, data: Value) -> TransportResult<()> {
        let raw: RawGiftEvent = serde_json::from_value(data)?;
        self.emit(WebcastEvent::Gift(raw));
        Ok(())
    }

    async fn process_frame(
        &self,
        transport: &mut Box<dyn Transport>,
        text: &str,
    ) -> TransportResult<Flow> {
        let frame: GatewayFrame = serde_json::from_str(text)?;

        match frame.event.as_str() {
            "gift" => self.dispatch_gift(frame.data)?,
            "connected" => self.dispatch_connected(&frame.data),
            "ping" => self.respond_ping(transport).await?,
            "streamEnd" | "disconnected" => {
                let reason = frame
                    .data
                    .as_str()
                    .unwrap_or("stream ended")
                    .to_string();
                self.emit(WebcastEvent::Ended { reason });
                return Ok(Flow::Ended);
            }
            other => debug!("unhandled gateway event '{}'", other),
        }

        Ok(Flow::Continue)
    }

    /// Connects and pumps gateway frames until the stream ends, the
    /// connection drops, or teardown is requested.
    #[instrument(skip(self, cancel), fields(username = %self.connection.username))]
    pub async fn run(self, cancel: CancellationToken) {
        let mut transport = match self.dialer.connect(&self.connection).await {
            Ok(transport) => transport,
            Err(e) => {
                error!("gateway connection failed: {}", e);
                self.emit(WebcastEvent::Ended {
                    reason: format!("connection failed: {e}"),
                });
                return;
            }
        };

        loop {
            tokio::select! {
                message = transport.receive() => {
                    match message {
                        Ok(Some(text)) => {
                            match self.process_frame(&mut transport, &text).await {
                                Ok(Flow::Continue) => {}
                                Ok(Flow::Ended) => break,
                                // A single malformed frame is dropped, not fatal.
                                Err(e) => warn!("dropping gateway frame: {}", e),
                            }
                        }

                        Ok(None) => continue,
                        Err(e) => {
                            error!("gateway connection error: {:?}", e);
                            self.emit(WebcastEvent::Ended { reason: e.to_string() });
                            break;
                        }
                    }
                }

                _ = cancel.cancelled() => {
                    info!("webcast client shutdown requested");
                    break;
                }
            }
        }

        let _ = transport.close().await;
    }
}
