//! Negotiate → connect → start session bootstrap.
//!
//! # States
//!
//! ```text
//! Idle ──negotiate──► Negotiating ──connect──► Connecting ──start──► Starting ──► Connected
//!   │                     │                        │                     │
//!   └─────────────────────┴────────────────────────┴─────────────────────┴──► Failed
//! ```
//!
//! Each state names the phase most recently entered. A step may only run
//! from its predecessor's state, and any error moves to `Failed`, which is
//! terminal and drops the negotiated token.
//!
//! # Steps
//!
//! 1. **Negotiate**: GET `{endpoint}/negotiate`. 200 stores the escaped
//!    token and adopts the returned endpoint path. 503 aborts at once. Any
//!    other status waits a fixed interval and retries, up to the configured
//!    number of attempts.
//! 2. **Connect**: open the socket at `{endpoint}/connect` over `ws`/`wss`.
//! 3. **Start**: GET `{endpoint}/start`, expect `{"Response":"started"}`,
//!    then read exactly one text frame with `S` = 1.
//!
//! Reconnect is not performed. [`HandshakeCommand::Reconnect`] only
//! documents the URL a resuming client would use.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{Frame, NegotiateResponse, StartResponse};
use crate::transport::{Dialer, HttpClient, Socket, SocketMessage};

use super::core::{Connection, SessionInfo};
use super::endpoint::{Endpoint, HandshakeCommand};
use super::options::ConnectionOptions;

// ============================================================================
// Constants
// ============================================================================

/// Negotiate status that aborts without retry.
const STATUS_UNAVAILABLE: u16 = 503;

// ============================================================================
// HandshakeState
// ============================================================================

/// Phase of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    /// Nothing done yet.
    Idle,
    /// Negotiate running or completed.
    Negotiating,
    /// Socket upgrade running or completed.
    Connecting,
    /// Start confirmation running.
    Starting,
    /// Init frame received; the connection was handed out.
    Connected,
    /// A step failed. Terminal.
    Failed,
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Negotiating => "Negotiating",
            Self::Connecting => "Connecting",
            Self::Starting => "Starting",
            Self::Connected => "Connected",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Handshake
// ============================================================================

/// Runs the three-phase session bootstrap.
///
/// Usually obtained from [`ConnectionBuilder::build`](super::ConnectionBuilder::build).
///
/// # Example
///
/// ```ignore
/// let mut handshake = ConnectionBuilder::new().host("example.com").build()?;
/// handshake.negotiate().await?;
/// let socket = handshake.connect().await?;
/// let connection = handshake.start(socket).await?;
/// ```
pub struct Handshake {
    endpoint: Endpoint,
    options: ConnectionOptions,
    http: Arc<dyn HttpClient>,
    dialer: Arc<dyn Dialer>,
    state: HandshakeState,
    /// URL-escaped token from negotiate.
    connection_token: Option<String>,
    negotiated: Option<NegotiateResponse>,
}

impl fmt::Debug for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handshake")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Handshake {
    /// Creates a handshake in the `Idle` state.
    #[must_use]
    pub fn new(
        endpoint: Endpoint,
        options: ConnectionOptions,
        http: Arc<dyn HttpClient>,
        dialer: Arc<dyn Dialer>,
    ) -> Self {
        Self {
            endpoint,
            options,
            http,
            dialer,
            state: HandshakeState::Idle,
            connection_token: None,
            negotiated: None,
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Endpoint, with the negotiated path once negotiate succeeded.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// URL-escaped connection token, if negotiated.
    #[inline]
    #[must_use]
    pub fn connection_token(&self) -> Option<&str> {
        self.connection_token.as_deref()
    }

    /// Negotiate response, if negotiated.
    #[inline]
    #[must_use]
    pub fn negotiated(&self) -> Option<&NegotiateResponse> {
        self.negotiated.as_ref()
    }

    /// Builds the URL for a step with the current token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the endpoint is not a valid URL.
    pub fn url(&self, command: &HandshakeCommand) -> Result<Url> {
        self.endpoint.url(command, self.connection_token.as_deref())
    }

    /// Runs every step and returns the ready connection.
    ///
    /// # Errors
    ///
    /// Returns the first step's error. The handshake is then `Failed`.
    pub async fn run(mut self) -> Result<Connection> {
        self.negotiate().await?;
        let socket = self.connect().await?;
        self.start(socket).await
    }

    // ========================================================================
    // Negotiate
    // ========================================================================

    /// Performs the negotiate step.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] unless `Idle`
    /// - [`Error::NegotiateUnavailable`] on status 503
    /// - [`Error::NegotiateExhausted`] when every attempt failed
    /// - [`Error::Http`] if a request could not be sent
    /// - [`Error::Handshake`] if the body is malformed
    pub async fn negotiate(&mut self) -> Result<NegotiateResponse> {
        self.enter("negotiate", HandshakeState::Idle, HandshakeState::Negotiating)?;

        match self.try_negotiate().await {
            Ok(response) => Ok(response),
            Err(e) => Err(self.fail("negotiate", e)),
        }
    }

    async fn try_negotiate(&mut self) -> Result<NegotiateResponse> {
        self.connection_token = None;
        self.negotiated = None;

        let url = self.url(&HandshakeCommand::Negotiate)?;
        let attempts = self.options.negotiate_attempts;
        let interval = self.options.negotiate_retry_interval;
        let mut last_status = 0;

        for attempt in 1..=attempts {
            let response = self.http.get(&url).await?;

            match response.status {
                200 => {
                    let parsed = NegotiateResponse::parse(&response.body)?;

                    self.connection_token =
                        Some(urlencoding::encode(&parsed.connection_token).into_owned());
                    self.endpoint.set_path(parsed.url.clone());
                    self.negotiated = Some(parsed.clone());

                    info!(
                        connection_id = %parsed.connection_id,
                        endpoint = %parsed.url,
                        attempt,
                        "Negotiate complete"
                    );
                    return Ok(parsed);
                }

                STATUS_UNAVAILABLE => {
                    return Err(Error::NegotiateUnavailable {
                        status: STATUS_UNAVAILABLE,
                    });
                }

                status => {
                    last_status = status;
                    warn!(attempt, attempts, status, "Negotiate failed");

                    if attempt < attempts {
                        debug!(delay_ms = duration_ms(interval), "Retrying negotiate");
                        sleep(interval).await;
                    }
                }
            }
        }

        Err(Error::NegotiateExhausted {
            attempts,
            status: last_status,
        })
    }

    // ========================================================================
    // Connect
    // ========================================================================

    /// Opens the persistent socket.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] unless negotiated
    /// - [`Error::HandshakeRejected`] if the server refused the upgrade
    /// - [`Error::Connection`] on other dial failures
    pub async fn connect(&mut self) -> Result<Box<dyn Socket>> {
        self.enter("connect", HandshakeState::Negotiating, HandshakeState::Connecting)?;

        let result = match self.url(&HandshakeCommand::Connect) {
            Ok(url) => self.dialer.dial(&url).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(socket) => {
                debug!("Socket connected");
                Ok(socket)
            }
            Err(e) => Err(self.fail("connect", e)),
        }
    }

    // ========================================================================
    // Start
    // ========================================================================

    /// Confirms the session and waits for the init frame.
    ///
    /// The socket is closed if this step fails.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] unless connected
    /// - [`Error::Handshake`] on a bad acknowledgement or init frame
    /// - [`Error::Http`] / [`Error::ConnectionClosed`] on transport failures
    pub async fn start(&mut self, socket: Box<dyn Socket>) -> Result<Connection> {
        if let Err(e) = self.enter("start", HandshakeState::Connecting, HandshakeState::Starting) {
            let _ = socket.close().await;
            return Err(e);
        }

        if let Err(e) = self.try_start(socket.as_ref()).await {
            if let Err(close_err) = socket.close().await {
                debug!(error = %close_err, "Failed to close socket after start error");
            }
            return Err(self.fail("start", e));
        }

        self.state = HandshakeState::Connected;

        let negotiate = self.negotiated.clone().unwrap_or_default();
        let session = SessionInfo {
            connection_id: negotiate.connection_id.clone(),
            connection_token: self.connection_token.clone().unwrap_or_default(),
            endpoint_path: self.endpoint.path().to_string(),
            negotiate,
        };

        info!(connection_id = %session.connection_id, "Connection started");

        Ok(Connection::new(
            Arc::from(socket),
            session,
            self.options.clone(),
        ))
    }

    async fn try_start(&self, socket: &dyn Socket) -> Result<()> {
        let url = self.url(&HandshakeCommand::Start)?;
        let response = self.http.get(&url).await?;

        if !response.is_ok() {
            return Err(Error::handshake(format!(
                "start returned status {}",
                response.status
            )));
        }

        StartResponse::parse(&response.body)?;

        let text = match socket.read_message().await? {
            SocketMessage::Text(text) => text,
            other => {
                return Err(Error::handshake(format!(
                    "unexpected {} frame while waiting for init",
                    other.kind()
                )));
            }
        };

        let frame = Frame::parse(&text)
            .map_err(|e| Error::handshake(format!("malformed init frame: {e}")))?;

        if !frame.is_initialized() {
            return Err(Error::handshake(format!(
                "unexpected S value received from server: {}",
                frame
                    .init
                    .map_or_else(|| "none".to_string(), |s| s.to_string())
            )));
        }

        Ok(())
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn enter(
        &mut self,
        operation: &'static str,
        from: HandshakeState,
        to: HandshakeState,
    ) -> Result<()> {
        if self.state != from {
            return Err(Error::invalid_state(operation, self.state));
        }

        self.state = to;
        Ok(())
    }

    fn fail(&mut self, step: &'static str, err: Error) -> Error {
        error!(step, error = %err, "Handshake failed");

        self.state = HandshakeState::Failed;
        self.connection_token = None;
        self.negotiated = None;
        err
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::connection::endpoint::Scheme;
    use crate::transport::{HttpResponse, MemoryPeer, MemorySocket};

    const NEGOTIATE_OK: &str = r#"{"Url":"/signalr2","ConnectionToken":"tok","ConnectionId":"cid"}"#;
    const STARTED_OK: &str = r#"{"Response":"started"}"#;

    #[test]
    fn test_retry_delay_saturates() {
        assert_eq!(duration_ms(Duration::from_secs(60)), 60_000);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }

    // ------------------------------------------------------------------------
    // Fakes
    // ------------------------------------------------------------------------

    #[derive(Default)]
    struct ScriptedHttp {
        responses: Mutex<VecDeque<HttpResponse>>,
        requests: Mutex<Vec<Url>>,
    }

    impl ScriptedHttp {
        fn new(responses: impl IntoIterator<Item = (u16, &'static str)>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|(status, body)| HttpResponse::new(status, body))
                        .collect(),
                ),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn empty() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn requests(&self) -> Vec<Url> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedHttp {
        async fn get(&self, url: &Url) -> Result<HttpResponse> {
            self.requests.lock().push(url.clone());
            self.responses
                .lock()
                .pop_front()
                .ok_or_else(|| Error::http("no scripted response"))
        }
    }

    #[derive(Default)]
    struct MemoryDialer {
        socket: Mutex<Option<MemorySocket>>,
        dialed: Mutex<Vec<Url>>,
        reject: Option<(u16, &'static str)>,
    }

    impl MemoryDialer {
        fn with_socket() -> (Arc<Self>, MemoryPeer) {
            let (socket, peer) = MemorySocket::pair();
            let dialer = Self {
                socket: Mutex::new(Some(socket)),
                ..Default::default()
            };
            (Arc::new(dialer), peer)
        }

        fn rejecting(status: u16, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reject: Some((status, body)),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl Dialer for MemoryDialer {
        async fn dial(&self, url: &Url) -> Result<Box<dyn Socket>> {
            self.dialed.lock().push(url.clone());
            if let Some((status, body)) = self.reject {
                return Err(Error::handshake_rejected(status, body));
            }
            let socket = self
                .socket
                .lock()
                .take()
                .ok_or_else(|| Error::connection("already dialed"))?;
            Ok(Box::new(socket))
        }
    }

    fn handshake(http: Arc<ScriptedHttp>, dialer: Arc<MemoryDialer>) -> Handshake {
        let endpoint = Endpoint::new(
            Scheme::Https,
            "socket.example.com",
            "/signalr",
            r#"[{"name":"corehub"}]"#,
            "1.5",
        );
        let options =
            ConnectionOptions::new().with_negotiate_retry(5, Duration::from_secs(60));
        Handshake::new(endpoint, options, http, dialer)
    }

    // ------------------------------------------------------------------------
    // Negotiate
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_negotiate_adopts_endpoint_and_token() {
        let http = ScriptedHttp::new([(200, NEGOTIATE_OK), (200, STARTED_OK)]);
        let (dialer, peer) = MemoryDialer::with_socket();
        let mut hs = handshake(Arc::clone(&http), Arc::clone(&dialer));

        let negotiated = hs.negotiate().await.expect("negotiate");
        assert_eq!(negotiated.connection_id.as_str(), "cid");
        assert_eq!(hs.state(), HandshakeState::Negotiating);
        assert_eq!(hs.connection_token(), Some("tok"));
        assert_eq!(hs.endpoint().path(), "/signalr2");

        let socket = hs.connect().await.expect("connect");
        peer.send_text(r#"{"S":1}"#).expect("init");
        hs.start(socket).await.expect("start");

        let dialed = dialer.dialed.lock()[0].clone();
        assert_eq!(dialed.scheme(), "wss");
        assert_eq!(dialed.path(), "/signalr2/connect");
        assert!(dialed.query().expect("query").contains("connectionToken=tok"));

        let requests = http.requests();
        assert_eq!(requests[0].path(), "/signalr/negotiate");
        assert!(!requests[0].query().expect("query").contains("connectionToken"));
        assert_eq!(requests[1].path(), "/signalr2/start");
        assert!(requests[1].query().expect("query").contains("connectionToken=tok"));
    }

    #[tokio::test]
    async fn test_negotiate_escapes_token() {
        let http = ScriptedHttp::new([(
            200,
            r#"{"Url":"/signalr","ConnectionToken":"a+b/c=","ConnectionId":"cid"}"#,
        )]);
        let (dialer, _peer) = MemoryDialer::with_socket();
        let mut hs = handshake(http, dialer);

        hs.negotiate().await.expect("negotiate");
        assert_eq!(hs.connection_token(), Some("a%2Bb%2Fc%3D"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_negotiate_retries_with_fixed_interval() {
        let http = ScriptedHttp::new([
            (500, ""),
            (500, ""),
            (500, ""),
            (500, ""),
            (200, NEGOTIATE_OK),
        ]);
        let (dialer, _peer) = MemoryDialer::with_socket();
        let mut hs = handshake(Arc::clone(&http), dialer);

        let started = tokio::time::Instant::now();
        hs.negotiate().await.expect("negotiate");
        let elapsed = started.elapsed();

        assert_eq!(http.requests().len(), 5);
        assert!(elapsed >= Duration::from_secs(240));
        assert!(elapsed < Duration::from_secs(241));
    }

    #[tokio::test(start_paused = true)]
    async fn test_negotiate_exhausts_attempts() {
        let http = ScriptedHttp::new([(500, ""); 5]);
        let (dialer, _peer) = MemoryDialer::with_socket();
        let mut hs = handshake(Arc::clone(&http), dialer);

        let err = hs.negotiate().await.unwrap_err();
        assert!(matches!(
            err,
            Error::NegotiateExhausted {
                attempts: 5,
                status: 500
            }
        ));
        assert_eq!(http.requests().len(), 5);
        assert_eq!(hs.state(), HandshakeState::Failed);
        assert_eq!(hs.connection_token(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_negotiate_unavailable_aborts() {
        let http = ScriptedHttp::new([(503, ""), (200, NEGOTIATE_OK)]);
        let (dialer, _peer) = MemoryDialer::with_socket();
        let mut hs = handshake(Arc::clone(&http), dialer);

        let started = tokio::time::Instant::now();
        let err = hs.negotiate().await.unwrap_err();

        assert!(matches!(err, Error::NegotiateUnavailable { status: 503 }));
        assert_eq!(http.requests().len(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(hs.state(), HandshakeState::Failed);
    }

    #[tokio::test]
    async fn test_negotiate_transport_error_is_not_retried() {
        let http = ScriptedHttp::empty();
        let (dialer, _peer) = MemoryDialer::with_socket();
        let mut hs = handshake(Arc::clone(&http), dialer);

        let err = hs.negotiate().await.unwrap_err();
        assert!(matches!(err, Error::Http { .. }));
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_negotiate_malformed_body() {
        let http = ScriptedHttp::new([(200, "not json")]);
        let (dialer, _peer) = MemoryDialer::with_socket();
        let mut hs = handshake(http, dialer);

        let err = hs.negotiate().await.unwrap_err();
        assert!(matches!(err, Error::Handshake { .. }));
        assert_eq!(hs.connection_token(), None);
        assert_eq!(hs.endpoint().path(), "/signalr");
    }

    // ------------------------------------------------------------------------
    // Connect
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_connect_rejected_carries_body() {
        let http = ScriptedHttp::new([(200, NEGOTIATE_OK)]);
        let dialer = MemoryDialer::rejecting(400, "invalid connection token");
        let mut hs = handshake(http, dialer);

        hs.negotiate().await.expect("negotiate");
        let err = hs.connect().await.err().expect("should fail");

        match err {
            Error::HandshakeRejected { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "invalid connection token");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(hs.state(), HandshakeState::Failed);
        assert_eq!(hs.connection_token(), None);
    }

    #[tokio::test]
    async fn test_connect_requires_negotiate() {
        let http = ScriptedHttp::empty();
        let (dialer, _peer) = MemoryDialer::with_socket();
        let mut hs = handshake(http, Arc::clone(&dialer));

        let err = hs.connect().await.err().expect("should fail");
        assert!(matches!(err, Error::InvalidState { .. }));
        assert!(dialer.dialed.lock().is_empty());
        assert_eq!(hs.state(), HandshakeState::Idle);
    }

    // ------------------------------------------------------------------------
    // Start
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_start_with_init_frame_connects() {
        let http = ScriptedHttp::new([(200, NEGOTIATE_OK), (200, STARTED_OK)]);
        let (dialer, peer) = MemoryDialer::with_socket();
        let mut hs = handshake(http, dialer);

        hs.negotiate().await.expect("negotiate");
        let socket = hs.connect().await.expect("connect");
        peer.send_text(r#"{"S":1}"#).expect("init");

        let connection = hs.start(socket).await.expect("start");
        assert_eq!(hs.state(), HandshakeState::Connected);
        assert_eq!(connection.session().connection_id.as_str(), "cid");
        assert_eq!(connection.session().connection_token, "tok");
        assert_eq!(connection.session().endpoint_path, "/signalr2");
    }

    #[tokio::test]
    async fn test_start_wrong_sentinel_fails() {
        let http = ScriptedHttp::new([(200, NEGOTIATE_OK), (200, STARTED_OK)]);
        let (dialer, peer) = MemoryDialer::with_socket();
        let mut hs = handshake(http, dialer);

        hs.negotiate().await.expect("negotiate");
        let socket = hs.connect().await.expect("connect");
        peer.send_text(r#"{"S":0}"#).expect("init");

        let err = hs.start(socket).await.unwrap_err();
        assert!(matches!(err, Error::Handshake { .. }));
        assert!(err.to_string().contains("S value"));
        assert_eq!(hs.state(), HandshakeState::Failed);
        assert!(peer.is_closed());
    }

    #[tokio::test]
    async fn test_start_keep_alive_instead_of_init_fails() {
        let http = ScriptedHttp::new([(200, NEGOTIATE_OK), (200, STARTED_OK)]);
        let (dialer, peer) = MemoryDialer::with_socket();
        let mut hs = handshake(http, dialer);

        hs.negotiate().await.expect("negotiate");
        let socket = hs.connect().await.expect("connect");
        peer.send_text("{}").expect("keep-alive");

        assert!(hs.start(socket).await.is_err());
        assert_eq!(hs.state(), HandshakeState::Failed);
    }

    #[tokio::test]
    async fn test_start_binary_frame_fails() {
        let http = ScriptedHttp::new([(200, NEGOTIATE_OK), (200, STARTED_OK)]);
        let (dialer, peer) = MemoryDialer::with_socket();
        let mut hs = handshake(http, dialer);

        hs.negotiate().await.expect("negotiate");
        let socket = hs.connect().await.expect("connect");
        peer.send(SocketMessage::Binary(br#"{"S":1}"#.to_vec()))
            .expect("init");

        let err = hs.start(socket).await.unwrap_err();
        assert!(err.to_string().contains("binary"));
    }

    #[tokio::test]
    async fn test_start_bad_acknowledgement_fails() {
        let http = ScriptedHttp::new([(200, NEGOTIATE_OK), (200, r#"{"Response":"nope"}"#)]);
        let (dialer, peer) = MemoryDialer::with_socket();
        let mut hs = handshake(http, dialer);

        hs.negotiate().await.expect("negotiate");
        let socket = hs.connect().await.expect("connect");
        peer.send_text(r#"{"S":1}"#).expect("init");

        let err = hs.start(socket).await.unwrap_err();
        assert!(err.to_string().contains("started"));
        assert_eq!(hs.state(), HandshakeState::Failed);
    }

    #[tokio::test]
    async fn test_run_full_sequence() {
        let http = ScriptedHttp::new([(200, NEGOTIATE_OK), (200, STARTED_OK)]);
        let (dialer, peer) = MemoryDialer::with_socket();
        peer.send_text(r#"{"C":"s-0","S":1,"M":[]}"#).expect("init");

        let connection = handshake(http, dialer).run().await.expect("run");
        assert_eq!(connection.session().negotiate.url, "/signalr2");
    }

    #[tokio::test]
    async fn test_failed_is_terminal() {
        let http = ScriptedHttp::new([(503, ""), (200, NEGOTIATE_OK)]);
        let (dialer, _peer) = MemoryDialer::with_socket();
        let mut hs = handshake(http, dialer);

        assert!(hs.negotiate().await.is_err());
        let err = hs.negotiate().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(HandshakeState::Negotiating.to_string(), "Negotiating");
        assert_eq!(HandshakeState::Failed.to_string(), "Failed");
    }
}
