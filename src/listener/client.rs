//! Scoreboard Feed Client
//!
//! Holds the WebSocket to the game history endpoint, hands each text frame
//! to the [`Dispatcher`], and reconnects with exponential backoff when the
//! socket goes away.

use futures_util::StreamExt;
use serde::Serialize;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message, WebSocketStream};
use url::Url;

use super::dispatch::Dispatcher;
use super::error::{ListenerError, ListenerResult};
use crate::scoreboard::ProtocolError;

/// Path of the game history socket on the scoreboard server
pub const GAME_HISTORY_PATH: &str = "/scoreboard/wsocket/game_history";

/// Build the feed endpoint from a `ws://` / `wss://` base and a path
///
/// The path is appended to the base as-is, so a base carrying its own path
/// prefix keeps it.
pub fn feed_endpoint(base: &str, path: &str) -> ListenerResult<Url> {
    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    let url = Url::parse(&joined).map_err(|e| ListenerError::InvalidUrl {
        url: joined.clone(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(ListenerError::InvalidUrl {
            url: joined,
            reason: format!("scheme must be ws or wss, got {}", other),
        }),
    }
}

/// State of the feed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// When and how often to reconnect
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    /// Consecutive failed attempts before giving up
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
        }
    }
}

impl ReconnectPolicy {
    /// Policy that never reconnects
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Backoff before reconnect attempt number `attempt` (zero-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Install the process-wide TLS provider `wss://` feeds handshake with
fn install_tls_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // Err means another thread installed one first
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
}

/// Long-lived consumer of the scoreboard feed
pub struct ScoreboardListener {
    endpoint: Url,
    policy: ReconnectPolicy,
    dispatcher: Dispatcher,
    state: watch::Sender<ConnectionState>,
}

impl ScoreboardListener {
    pub fn new(endpoint: Url, policy: ReconnectPolicy, dispatcher: Dispatcher) -> Self {
        install_tls_provider();
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            endpoint,
            policy,
            dispatcher,
            state,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Receiver for connection state changes
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run until the feed is gone for good
    ///
    /// With reconnects disabled this returns after the first session ends.
    /// Otherwise it only returns once `max_attempts` consecutive attempts
    /// have failed.
    pub async fn run(mut self) -> ListenerResult<()> {
        let mut attempts = 0u32;

        loop {
            let outcome = self.session(&mut attempts).await;
            self.state.send_replace(ConnectionState::Disconnected);

            match &outcome {
                Ok(()) => tracing::info!(endpoint = %self.endpoint, "Scoreboard feed closed"),
                Err(e) => tracing::warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "Scoreboard feed lost"
                ),
            }

            if !self.policy.enabled {
                return outcome;
            }
            if attempts >= self.policy.max_attempts {
                tracing::error!(attempts, "Reconnect attempts exhausted");
                return Err(ListenerError::RetriesExhausted { attempts });
            }

            let delay = self.policy.delay_for(attempts);
            attempts += 1;
            tracing::info!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting to scoreboard feed"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Connect once and consume frames until the socket ends
    async fn session(&mut self, attempts: &mut u32) -> ListenerResult<()> {
        self.state.send_replace(ConnectionState::Connecting);
        tracing::info!(endpoint = %self.endpoint, "Connecting to scoreboard feed");

        let (stream, _) = connect_async(self.endpoint.as_str()).await?;

        *attempts = 0;
        self.state.send_replace(ConnectionState::Connected);
        tracing::info!(endpoint = %self.endpoint, "Scoreboard feed connected");

        self.consume(stream).await
    }

    async fn consume<S>(&mut self, mut stream: WebSocketStream<S>) -> ListenerResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        while let Some(frame) = stream.next().await {
            match frame? {
                Message::Text(text) => {
                    self.dispatcher.handle_text(text.as_str());
                }
                Message::Binary(_) => {
                    tracing::warn!(error = %ProtocolError::BinaryFrame, "Protocol error on scoreboard feed");
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // tungstenite answers pings itself
                    tracing::trace!("Keepalive frame");
                }
                Message::Close(frame) => {
                    tracing::debug!(frame = ?frame, "Server closed the feed");
                    break;
                }
                Message::Frame(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartAdapter, ChartPoint, ChartSnapshot, SeriesChart};
    use futures_util::SinkExt;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    #[test]
    fn test_feed_endpoint() {
        let url = feed_endpoint("ws://localhost:8888", GAME_HISTORY_PATH).unwrap();
        assert_eq!(
            url.as_str(),
            "ws://localhost:8888/scoreboard/wsocket/game_history"
        );

        let url = feed_endpoint("wss://ctf.example.com/game/", GAME_HISTORY_PATH).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://ctf.example.com/game/scoreboard/wsocket/game_history"
        );
    }

    #[test]
    fn test_feed_endpoint_rejects_non_ws() {
        let err = feed_endpoint("http://localhost:8888", GAME_HISTORY_PATH).unwrap_err();
        assert!(matches!(err, ListenerError::InvalidUrl { .. }));

        let err = feed_endpoint("not a url", GAME_HISTORY_PATH).unwrap_err();
        assert!(matches!(err, ListenerError::InvalidUrl { .. }));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(16_000));
        assert_eq!(policy.delay_for(5), Duration::from_millis(30_000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(30_000));
    }

    #[test]
    fn test_connection_state_serializes() {
        let json = serde_json::to_string(&ConnectionState::Connected).unwrap();
        assert_eq!(json, "\"connected\"");
    }

    fn listener(policy: ReconnectPolicy) -> ScoreboardListener {
        // nothing listens on the discard port
        let endpoint = feed_endpoint("ws://127.0.0.1:9", GAME_HISTORY_PATH).unwrap();
        let (dispatcher, _) = Dispatcher::new(ChartAdapter::new(SeriesChart::default()));
        ScoreboardListener::new(endpoint, policy, dispatcher)
    }

    #[tokio::test]
    async fn test_run_without_reconnect_reports_connect_error() {
        let listener = listener(ReconnectPolicy::disabled());
        let state = listener.connection_state();

        let result = listener.run().await;
        assert!(matches!(result, Err(ListenerError::Socket(_))));
        assert_eq!(*state.borrow(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_run_gives_up_after_max_attempts() {
        let policy = ReconnectPolicy {
            enabled: true,
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };

        let result = listener(policy).run().await;
        assert!(matches!(
            result,
            Err(ListenerError::RetriesExhausted { attempts: 2 })
        ));
    }

    /// Serve `frames` to the first client, then close the socket
    async fn feed_server(frames: Vec<Message>) -> SocketAddr {
        let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = server.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            for frame in frames {
                ws.send(frame).await.unwrap();
            }
            ws.close(None).await.unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        });

        addr
    }

    fn scripted_frames() -> Vec<Message> {
        vec![
            Message::text(r#"{"history": {"Red": [[1000, 2], [2000, 3]]}}"#.to_string()),
            Message::binary(vec![0u8, 1, 2]),
            Message::text(
                r#"{"update": {"timestamp": 3000, "scoreboard": {"Red": {"flags": ["a", "b", "c", "d"]}, "Blue": {"flags": []}}}}"#
                    .to_string(),
            ),
        ]
    }

    fn local_listener(
        addr: SocketAddr,
        policy: ReconnectPolicy,
    ) -> (ScoreboardListener, watch::Receiver<ChartSnapshot>) {
        let base = format!("ws://{}", addr);
        let endpoint = feed_endpoint(&base, GAME_HISTORY_PATH).unwrap();
        let (dispatcher, snapshots) = Dispatcher::new(ChartAdapter::new(SeriesChart::default()));
        (ScoreboardListener::new(endpoint, policy, dispatcher), snapshots)
    }

    #[tokio::test]
    async fn test_session_consumes_frames_and_resets_attempts() {
        let addr = feed_server(scripted_frames()).await;
        let (mut listener, snapshots) = local_listener(addr, ReconnectPolicy::default());
        let state = listener.connection_state();

        let mut attempts = 3;
        listener.session(&mut attempts).await.unwrap();

        assert_eq!(attempts, 0);
        assert_eq!(*state.borrow(), ConnectionState::Connected);

        let snapshot = snapshots.borrow().clone();
        assert_eq!(snapshot.series_count(), 2);
        assert_eq!(
            snapshot.series("Red").unwrap().data,
            vec![
                ChartPoint::new(1_000_000, 2),
                ChartPoint::new(2_000_000, 3),
                ChartPoint::new(3_000_000, 4),
            ]
        );
        assert_eq!(
            snapshot.series("Blue").unwrap().data,
            vec![ChartPoint::new(3_000_000, 0)]
        );
    }

    #[tokio::test]
    async fn test_run_ends_disconnected_after_server_close() {
        let addr = feed_server(scripted_frames()).await;
        let (listener, snapshots) = local_listener(addr, ReconnectPolicy::disabled());
        let state = listener.connection_state();

        listener.run().await.unwrap();

        assert_eq!(*state.borrow(), ConnectionState::Disconnected);
        assert_eq!(snapshots.borrow().series_count(), 2);
    }

    #[tokio::test]
    async fn test_wss_handshake_failure_is_an_error() {
        let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((tcp, _)) = server.accept().await {
                drop(tcp);
            }
        });

        let base = format!("wss://{}", addr);
        let endpoint = feed_endpoint(&base, GAME_HISTORY_PATH).unwrap();
        let (dispatcher, _) = Dispatcher::new(ChartAdapter::new(SeriesChart::default()));
        let listener = ScoreboardListener::new(endpoint, ReconnectPolicy::disabled(), dispatcher);

        let result = tokio::spawn(listener.run()).await;
        assert!(matches!(result, Ok(Err(ListenerError::Socket(_)))));
    }
}
