//! # WebSocket Transport
//!
//! Realtime transport speaking the backend's websocket protocol.
//!
//! One socket per subscription. `subscribe` spawns the connection task and
//! returns at once; the teardown closes the subscription and aborts the task.
//! A dropped connection is re-established with backoff until torn down, unless
//! the server closed it for a policy violation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::{interval_at, sleep, Instant};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use super::errors::{RealtimeError, RealtimeResult};
use super::transport::{MessageHandler, RealtimeTransport, Teardown};
use crate::config::RealtimeConfig;
use crate::observability::{log_event, Event};

/// WebSocket transport configuration
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// REST endpoint the realtime URL is derived from
    pub endpoint: String,

    /// Project id sent in the query string
    pub project_id: String,

    /// Session secret sent after connecting
    pub session: Option<String>,

    /// Heartbeat interval in seconds
    pub heartbeat_interval_secs: u64,
}

impl WebSocketConfig {
    /// Build from the client configuration
    pub fn from_config(config: &RealtimeConfig) -> RealtimeResult<Self> {
        config.validate_remote()?;
        Ok(Self {
            endpoint: config.endpoint.clone().unwrap_or_default(),
            project_id: config.project_id.clone().unwrap_or_default(),
            session: config.session.clone(),
            heartbeat_interval_secs: config.heartbeat_interval_secs,
        })
    }

    fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }
}

/// Frame sent by the client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
enum ClientFrame {
    Ping,
    Authentication { session: String },
}

impl ClientFrame {
    fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Frame sent by the server
#[derive(Debug, Deserialize)]
struct ServerFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// Realtime URL for one channel
///
/// `https://host/v1` becomes `wss://host/v1/realtime?project=<id>&channels%5B%5D=<channel>`.
/// A query string already on the endpoint is kept after the realtime parameters.
pub fn realtime_url(endpoint: &str, project_id: &str, channel: &str) -> RealtimeResult<String> {
    let endpoint = endpoint.trim();

    let (scheme, rest) = endpoint
        .split_once("://")
        .ok_or_else(|| RealtimeError::InvalidEndpoint(format!("missing scheme: '{}'", endpoint)))?;

    let ws_scheme = match scheme.to_ascii_lowercase().as_str() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(RealtimeError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                other
            )))
        }
    };

    let rest = rest.split_once('#').map_or(rest, |(rest, _)| rest);
    let (base, query) = rest.split_once('?').unwrap_or((rest, ""));
    let base = base.trim_end_matches('/');

    if base.is_empty() || base.starts_with('/') {
        return Err(RealtimeError::InvalidEndpoint(format!("missing host: '{}'", endpoint)));
    }

    let mut url = format!(
        "{}://{}/realtime?project={}&channels%5B%5D={}",
        ws_scheme,
        base,
        urlencoding::encode(project_id),
        urlencoding::encode(channel)
    );
    if !query.is_empty() {
        url.push('&');
        url.push_str(query);
    }
    Ok(url)
}

/// Delay before reconnect attempt number `attempt` (0-based)
pub fn reconnect_delay(attempt: u32) -> Duration {
    let secs = match attempt {
        0..=4 => 1,
        5..=14 => 5,
        15..=99 => 10,
        _ => 60,
    };
    Duration::from_secs(secs)
}

/// Reconnect attempts since the last successful connect
#[derive(Debug, Default)]
struct Backoff {
    attempt: u32,
}

impl Backoff {
    /// Delay before the next attempt
    fn next_delay(&mut self) -> Duration {
        let delay = reconnect_delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// How the server ended a connection
#[derive(Debug, PartialEq, Eq)]
enum Closed {
    /// Closed or lost; reconnect
    Normal,
    /// Policy violation; the server will keep refusing
    Rejected(String),
}

fn closed_by(frame: Option<&CloseFrame<'_>>) -> Closed {
    match frame {
        Some(frame) if frame.code == CloseCode::Policy => Closed::Rejected(frame.reason.to_string()),
        _ => Closed::Normal,
    }
}

/// Handle one text frame. Returns a frame to send back, if any.
fn handle_frame(
    text: &str,
    channel: &str,
    handler: &MessageHandler,
    session: Option<&str>,
    closed: &AtomicBool,
) -> Option<String> {
    let frame: ServerFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            log_event(
                Event::MalformedMessage,
                &[("channel", channel), ("error", e.to_string().as_str()), ("envelope", text)],
            );
            return None;
        }
    };

    match frame.kind.as_str() {
        "event" => {
            if !closed.load(Ordering::Acquire) {
                handler(frame.data);
            }
            None
        }
        "connected" => session.map(|session| {
            ClientFrame::Authentication {
                session: session.to_string(),
            }
            .to_text()
        }),
        "error" => {
            log_event(
                Event::TransportError,
                &[("channel", channel), ("error", frame.data.to_string().as_str())],
            );
            None
        }
        _ => None,
    }
}

/// Transport backed by one websocket per subscription
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    config: WebSocketConfig,
}

impl WebSocketTransport {
    /// Create a transport
    pub fn new(config: WebSocketConfig) -> Self {
        Self { config }
    }

    /// Create a transport from the client configuration
    pub fn from_config(config: &RealtimeConfig) -> RealtimeResult<Self> {
        Ok(Self::new(WebSocketConfig::from_config(config)?))
    }
}

impl RealtimeTransport for WebSocketTransport {
    fn subscribe(&self, channel: &str, handler: MessageHandler) -> RealtimeResult<Teardown> {
        let url = realtime_url(&self.config.endpoint, &self.config.project_id, channel)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RealtimeError::TransportUnavailable(format!("no tokio runtime: {}", e)))?;

        let closed = Arc::new(AtomicBool::new(false));
        let connection = Connection {
            id: Uuid::new_v4().to_string(),
            url,
            channel: channel.to_string(),
            handler,
            config: self.config.clone(),
            closed: Arc::clone(&closed),
        };
        let task = runtime.spawn(connection.run());

        Ok(Box::new(move || {
            closed.store(true, Ordering::Release);
            task.abort();
        }))
    }
}

/// State of one subscription's connection task
struct Connection {
    id: String,
    url: String,
    channel: String,
    handler: MessageHandler,
    config: WebSocketConfig,
    closed: Arc<AtomicBool>,
}

impl Connection {
    async fn run(self) {
        let mut backoff = Backoff::default();

        while !self.closed.load(Ordering::Acquire) {
            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    backoff.reset();
                    log_event(
                        Event::TransportConnected,
                        &[("channel", self.channel.as_str()), ("connection_id", self.id.as_str())],
                    );

                    match self.pump(stream).await {
                        Ok(Closed::Normal) => log_event(
                            Event::TransportDisconnected,
                            &[("channel", self.channel.as_str()), ("connection_id", self.id.as_str())],
                        ),
                        Ok(Closed::Rejected(reason)) => {
                            log_event(
                                Event::TransportRejected,
                                &[
                                    ("channel", self.channel.as_str()),
                                    ("connection_id", self.id.as_str()),
                                    ("reason", reason.as_str()),
                                ],
                            );
                            return;
                        }
                        Err(e) => self.report(&e),
                    }
                }
                Err(e) => self.report(&RealtimeError::ConnectionError(e.to_string())),
            }

            sleep(backoff.next_delay()).await;
        }
    }

    fn report(&self, error: &RealtimeError) {
        log_event(
            Event::TransportError,
            &[
                ("channel", self.channel.as_str()),
                ("code", error.code()),
                ("connection_id", self.id.as_str()),
                ("error", error.to_string().as_str()),
            ],
        );
    }

    /// Read frames until the socket closes
    async fn pump(&self, stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> RealtimeResult<Closed> {
        let (mut sink, mut source) = stream.split();

        let period = self.config.heartbeat_interval();
        let mut heartbeat = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    sink.send(Message::Text(ClientFrame::Ping.to_text()))
                        .await
                        .map_err(|e| RealtimeError::ConnectionError(format!("heartbeat failed: {}", e)))?;
                }

                msg = source.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let reply = handle_frame(
                                &text,
                                &self.channel,
                                &self.handler,
                                self.config.session.as_deref(),
                                &self.closed,
                            );
                            if let Some(reply) = reply {
                                sink.send(Message::Text(reply))
                                    .await
                                    .map_err(|e| RealtimeError::ConnectionError(e.to_string()))?;
                            }
                        }
                        Some(Ok(Message::Close(frame))) => return Ok(closed_by(frame.as_ref())),
                        None => return Ok(Closed::Normal),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(RealtimeError::ConnectionError(e.to_string())),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::capture_logs;
    use serde_json::json;
    use std::sync::Mutex;

    const CHANNEL: &str = "databases.main.collections.orders.documents";

    fn collecting_handler() -> (Arc<Mutex<Vec<Value>>>, MessageHandler) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let handler: MessageHandler = Arc::new(move |value: Value| sink.lock().unwrap().push(value));
        (received, handler)
    }

    #[test]
    fn test_realtime_url() {
        let url = realtime_url("https://cloud.example.com/v1/", "portal", CHANNEL).unwrap();
        assert_eq!(
            url,
            "wss://cloud.example.com/v1/realtime?project=portal&channels%5B%5D=databases.main.collections.orders.documents"
        );

        let url = realtime_url("http://localhost:8080/v1", "p", "c").unwrap();
        assert!(url.starts_with("ws://localhost:8080/v1/realtime?"));
    }

    #[test]
    fn test_realtime_url_rejects_bad_endpoints() {
        assert!(matches!(
            realtime_url("cloud.example.com", "p", "c"),
            Err(RealtimeError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            realtime_url("ftp://cloud.example.com", "p", "c"),
            Err(RealtimeError::InvalidEndpoint(_))
        ));
        assert!(matches!(realtime_url("https://", "p", "c"), Err(RealtimeError::InvalidEndpoint(_))));
        assert!(matches!(realtime_url("https:///v1", "p", "c"), Err(RealtimeError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_realtime_url_encodes_components() {
        let url = realtime_url("https://h/v1", "a b&c", "plain-id_1.x").unwrap();
        assert_eq!(url, "wss://h/v1/realtime?project=a%20b%26c&channels%5B%5D=plain-id_1.x");
    }

    #[test]
    fn test_realtime_url_keeps_endpoint_query() {
        let url = realtime_url("https://h/v1/?region=eu#top", "p", "c").unwrap();
        assert_eq!(url, "wss://h/v1/realtime?project=p&channels%5B%5D=c&region=eu");
    }

    #[test]
    fn test_reconnect_delay_backoff() {
        assert_eq!(reconnect_delay(0), Duration::from_secs(1));
        assert_eq!(reconnect_delay(4), Duration::from_secs(1));
        assert_eq!(reconnect_delay(5), Duration::from_secs(5));
        assert_eq!(reconnect_delay(15), Duration::from_secs(10));
        assert_eq!(reconnect_delay(100), Duration::from_secs(60));
        assert_eq!(reconnect_delay(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_backoff_resets_after_connect() {
        let mut backoff = Backoff::default();
        for _ in 0..5 {
            assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        }
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_policy_close_is_rejection() {
        let policy = CloseFrame {
            code: CloseCode::Policy,
            reason: "project disabled".into(),
        };
        assert_eq!(closed_by(Some(&policy)), Closed::Rejected("project disabled".to_string()));

        let normal = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        assert_eq!(closed_by(Some(&normal)), Closed::Normal);
        assert_eq!(closed_by(None), Closed::Normal);
    }

    #[test]
    fn test_client_frames() {
        assert_eq!(ClientFrame::Ping.to_text(), r#"{"type":"ping"}"#);
        let auth: Value = serde_json::from_str(
            &ClientFrame::Authentication { session: "s3cret".into() }.to_text(),
        )
        .unwrap();
        assert_eq!(auth, json!({"type": "authentication", "data": {"session": "s3cret"}}));
    }

    #[test]
    fn test_event_frame_reaches_handler() {
        let (received, handler) = collecting_handler();
        let closed = AtomicBool::new(false);
        let frame = json!({
            "type": "event",
            "data": {"events": ["databases.main.collections.orders.documents.1.create"], "payload": {"id": 1}}
        })
        .to_string();

        assert!(handle_frame(&frame, CHANNEL, &handler, None, &closed).is_none());
        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["payload"]["id"], 1);
    }

    #[test]
    fn test_closed_subscription_drops_events() {
        let (received, handler) = collecting_handler();
        let closed = AtomicBool::new(true);
        let frame = json!({"type": "event", "data": {"events": [], "payload": null}}).to_string();

        handle_frame(&frame, CHANNEL, &handler, None, &closed);
        assert!(received.lock().unwrap().is_empty());
    }

    #[test]
    fn test_connected_frame_authenticates_with_session() {
        let (_, handler) = collecting_handler();
        let closed = AtomicBool::new(false);
        let frame = r#"{"type":"connected","data":{"channels":[]}}"#;

        assert!(handle_frame(frame, CHANNEL, &handler, None, &closed).is_none());
        let reply = handle_frame(frame, CHANNEL, &handler, Some("abc"), &closed).unwrap();
        assert!(reply.contains("authentication"));
        assert!(reply.contains("abc"));
    }

    #[test]
    fn test_error_and_garbage_frames_are_logged() {
        let (received, handler) = collecting_handler();
        let closed = AtomicBool::new(false);

        let lines = capture_logs(|| {
            handle_frame(r#"{"type":"error","data":{"code":1008,"message":"denied"}}"#, CHANNEL, &handler, None, &closed);
            handle_frame("not json", CHANNEL, &handler, None, &closed);
            handle_frame(r#"{"type":"pong"}"#, CHANNEL, &handler, None, &closed);
        });

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("REALTIME_TRANSPORT_ERROR"));
        assert!(lines[1].contains("REALTIME_MALFORMED_MESSAGE"));
        assert!(received.lock().unwrap().is_empty());
    }

    #[test]
    fn test_subscribe_outside_runtime_fails() {
        let transport = WebSocketTransport::new(WebSocketConfig {
            endpoint: "http://127.0.0.1:1/v1".into(),
            project_id: "p".into(),
            session: None,
            heartbeat_interval_secs: 20,
        });
        let (_, handler) = collecting_handler();

        let result = transport.subscribe(CHANNEL, handler);
        assert!(matches!(result, Err(RealtimeError::TransportUnavailable(_))));
    }

    #[test]
    fn test_from_config_requires_remote_settings() {
        assert!(WebSocketTransport::from_config(&RealtimeConfig::default()).is_err());
        assert!(WebSocketTransport::from_config(&RealtimeConfig::remote("https://h/v1", "p")).is_ok());
    }
}
