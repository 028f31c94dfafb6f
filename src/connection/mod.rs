//! # Connection Module
//!
//! Keeps a live link to the NOVA device.
//!
//! This module handles:
//! - Connecting to the device's WebSocket message endpoint
//! - Decoding frames and dispatching messages to the channel store
//! - Reconnecting on a fixed interval after failures or drops
//! - Prompt shutdown at every suspension point
//!
//! ## State Machine
//!
//! ```text
//!   disconnected --start/retry--> connecting --handshake ok--> connected
//!        ^                            |                            |
//!        +------ handshake failed ----+------ read error/close ----+
//! ```

pub mod transport;

use chrono::Utc;
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{NovaError, Result};
use crate::mapping::Dispatcher;
use crate::protocol::decoder::{decode_binary_frame, decode_frame};
use crate::protocol::message::NOVA_RECONNECT_INTERVAL;
use crate::state::ChannelStore;
use transport::{Connector, Endpoint, Frame, FrameStream};

/// Default handshake timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Link state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        })
    }
}

/// Why a read loop ended
enum ReadExit {
    Shutdown,
    Dropped,
}

/// Owns the device link and drives the connection state machine
///
/// The manager is the only writer of both the connection state and the
/// channel store it was created with.
pub struct ConnectionManager<C> {
    connector: C,
    endpoint: Endpoint,
    reconnect_interval: Duration,
    connect_timeout: Duration,
    dispatcher: Dispatcher,
    store: ChannelStore,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl<C> fmt::Debug for ConnectionManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("endpoint", &self.endpoint)
            .field("reconnect_interval", &self.reconnect_interval)
            .field("connect_timeout", &self.connect_timeout)
            .field("state", &*self.state_tx.borrow())
            .finish_non_exhaustive()
    }
}

impl<C: Connector + 'static> ConnectionManager<C> {
    /// Create a manager with the default reconnect interval and timeout
    ///
    /// A fresh channel store is created for the dispatcher's registry.
    pub fn new(connector: C, endpoint: Endpoint, dispatcher: Dispatcher) -> Self {
        let store = ChannelStore::new(dispatcher.registry());
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            connector,
            endpoint,
            reconnect_interval: NOVA_RECONNECT_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            dispatcher,
            store,
            state_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Create a manager from loaded configuration
    pub fn from_config(connector: C, config: &Config, dispatcher: Dispatcher) -> Self {
        Self::new(connector, Endpoint::from(&config.device), dispatcher)
            .with_reconnect_interval(config.connection.reconnect_interval())
            .with_connect_timeout(config.connection.connect_timeout())
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Channel store this manager writes to
    pub fn store(&self) -> ChannelStore {
        self.store.clone()
    }

    /// Receiver for connection state changes
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Token that stops [`run`](Self::run) when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run on a dedicated task
    pub fn spawn(self) -> ConnectionHandle {
        let handle = ConnectionHandle {
            state: self.state(),
            store: self.store(),
            cancel: self.cancellation_token(),
            task: None,
        };
        let task = tokio::spawn(self.run());
        ConnectionHandle {
            task: Some(task),
            ..handle
        }
    }

    /// Drive the state machine until cancelled
    ///
    /// Transport failures never end the loop; they lead to another attempt
    /// after the fixed reconnect interval.
    pub async fn run(self) {
        info!("Connection manager started for {}", self.endpoint);

        loop {
            self.set_state(ConnectionState::Connecting);
            info!("Connecting to {}", self.endpoint.url());

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.connect() => result,
            };

            match result {
                Ok(stream) => {
                    self.set_state(ConnectionState::Connected);
                    info!("Connected to {}", self.endpoint);

                    if let ReadExit::Shutdown = self.read_frames(stream).await {
                        break;
                    }
                }
                Err(e) => warn!("Failed to connect to {}: {}", self.endpoint, e),
            }

            self.set_state(ConnectionState::Disconnected);
            info!(
                "Reconnecting to {} in {}s",
                self.endpoint,
                self.reconnect_interval.as_secs_f64()
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_interval) => {}
            }
        }

        self.set_state(ConnectionState::Disconnected);
        info!("Connection manager for {} stopped", self.endpoint);
    }

    /// One handshake attempt, bounded by the connect timeout
    async fn connect(&self) -> Result<Box<dyn FrameStream>> {
        match tokio::time::timeout(self.connect_timeout, self.connector.connect(&self.endpoint))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(NovaError::ConnectTimeout(self.endpoint.to_string())),
        }
    }

    async fn read_frames(&self, mut stream: Box<dyn FrameStream>) -> ReadExit {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                next = stream.next_frame() => Some(next),
            };

            match next {
                None => {
                    if let Err(e) = stream.close().await {
                        debug!("Error closing connection to {}: {}", self.endpoint, e);
                    }
                    return ReadExit::Shutdown;
                }
                Some(Some(Ok(frame))) => self.handle_frame(frame),
                Some(Some(Err(e))) => {
                    warn!("Lost connection to {}: {}", self.endpoint, e);
                    return ReadExit::Dropped;
                }
                Some(None) => {
                    warn!("Connection closed by {}", self.endpoint);
                    return ReadExit::Dropped;
                }
            }
        }
    }

    fn handle_frame(&self, frame: Frame) {
        let arrived_at = Utc::now();
        let decoded = match &frame {
            Frame::Text(text) => decode_frame(text),
            Frame::Binary(data) => decode_binary_frame(data),
        };

        let message = match decoded {
            Ok(message) => message,
            Err(e) => {
                debug!("Dropping frame from {}: {}", self.endpoint, e);
                return;
            }
        };

        let batch = self
            .dispatcher
            .dispatch(&message, &self.store.snapshot(), arrived_at);
        if batch.is_empty() {
            debug!("Ignoring {} message with no channel updates", message.kind);
            return;
        }

        let sequence = self.store.apply(&batch);
        debug!(
            "Published batch #{} ({} update(s)) from {} message",
            sequence,
            batch.len(),
            message.kind
        );
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            debug!("Connection state {} -> {}", current, state);
            *current = state;
            true
        });
    }
}

/// Handle to a spawned [`ConnectionManager`]
#[derive(Debug)]
pub struct ConnectionHandle {
    state: watch::Receiver<ConnectionState>,
    store: ChannelStore,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver for connection state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Channel store fed by this connection
    pub fn store(&self) -> &ChannelStore {
        &self.store
    }

    /// Stop the manager and wait for it to finish
    ///
    /// Cancels a pending reconnect delay or connection attempt and closes an
    /// open connection.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Task`] if the connection task panicked
    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChannelValue;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;
    use transport::mocks::{ScriptedStream, Step};
    use transport::MockConnector;

    const INTERVAL: Duration = Duration::from_secs(10);

    const SHOT_FRAME: &str = concat!(
        r#"{"type":"shot","shot_number":4,"ball_speed_meters_per_second":65.2,"#,
        r#""us_customary_units":{"ball_speed_mph":145.9}}"#,
    );

    fn manager<C: Connector + 'static>(connector: C) -> ConnectionManager<C> {
        ConnectionManager::new(
            connector,
            Endpoint::new("nova.test", 2920),
            Dispatcher::nova().unwrap(),
        )
    }

    /// Mock connector that records attempt times and serves streams in order
    fn scripted_connector(
        scripts: Vec<Option<ScriptedStream>>,
        attempts: Arc<Mutex<Vec<Instant>>>,
    ) -> MockConnector {
        let scripts = Arc::new(Mutex::new(std::collections::VecDeque::from(scripts)));
        let mut connector = MockConnector::new();
        let count = scripts.lock().unwrap().len();
        connector
            .expect_connect()
            .times(count)
            .returning(move |_| {
                attempts.lock().unwrap().push(Instant::now());
                match scripts.lock().unwrap().pop_front().flatten() {
                    Some(stream) => Ok(Box::new(stream) as Box<dyn FrameStream>),
                    None => Err(NovaError::Io(std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "Mock connection refused",
                    ))),
                }
            });
        connector
    }

    async fn wait_for_attempts(attempts: &Arc<Mutex<Vec<Instant>>>, n: usize) {
        while attempts.lock().unwrap().len() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Connector whose handshake never completes
    struct HangingConnector {
        attempts: Arc<Mutex<Vec<Instant>>>,
    }

    #[async_trait]
    impl Connector for HangingConnector {
        async fn connect(&self, _endpoint: &Endpoint) -> Result<Box<dyn FrameStream>> {
            self.attempts.lock().unwrap().push(Instant::now());
            std::future::pending().await
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
    }

    #[test]
    fn test_from_config() {
        let config = Config::from_toml(concat!(
            "[device]\nhost = \"10.1.1.1\"\nport = 3000\n",
            "[connection]\nreconnect_interval_ms = 2000\nconnect_timeout_ms = 750\n",
        ))
        .unwrap();
        let manager = ConnectionManager::from_config(
            MockConnector::new(),
            &config,
            Dispatcher::nova().unwrap(),
        );

        assert_eq!(manager.endpoint, Endpoint::new("10.1.1.1", 3000));
        assert_eq!(manager.reconnect_interval, Duration::from_secs(2));
        assert_eq!(manager.connect_timeout, Duration::from_millis(750));
    }

    #[test]
    fn test_initial_state_is_disconnected() {
        let manager = manager(MockConnector::new());
        assert_eq!(*manager.state().borrow(), ConnectionState::Disconnected);
        assert_eq!(manager.reconnect_interval, INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_messages_update_store() {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let stream = ScriptedStream::new(vec![
            Step::text(SHOT_FRAME),
            Step::text(r#"{"type":"status","uptime_seconds":61.7}"#),
        ]);
        let handle = manager(scripted_connector(vec![Some(stream)], attempts)).spawn();

        let mut rx = handle.store().subscribe();
        let snapshot = rx.wait_for(|s| s.sequence() == 2).await.unwrap().clone();

        assert_eq!(snapshot.value("session_shot_count"), Some(&ChannelValue::Integer(5)));
        assert_eq!(snapshot.value("ball_speed"), Some(&ChannelValue::Float(65.2)));
        assert_eq!(snapshot.value("ogc_ball_speed_mph"), Some(&ChannelValue::Float(145.9)));
        assert_eq!(snapshot.value("uptime"), Some(&ChannelValue::Float(62.0)));
        assert!(matches!(
            snapshot.value("last_shot_time"),
            Some(ChannelValue::Timestamp(_))
        ));
        assert_eq!(handle.state(), ConnectionState::Connected);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_frames_keep_connection() {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let stream = ScriptedStream::new(vec![
            Step::text("not json at all"),
            Step::text(r#"{"type":7}"#),
            Step::text(r#"{"no_type":true}"#),
            Step::text(r#"{"type":"firmware","version":"1.2"}"#),
            Step::Frame(Frame::Binary(vec![0xFF, 0x00])),
            Step::Frame(Frame::Binary(br#"{"type":"status","uptime_seconds":10}"#.to_vec())),
        ]);
        let handle = manager(scripted_connector(vec![Some(stream)], attempts.clone())).spawn();

        let mut rx = handle.store().subscribe();
        let snapshot = rx.wait_for(|s| s.sequence() == 1).await.unwrap().clone();

        assert_eq!(snapshot.value("uptime"), Some(&ChannelValue::Integer(10)));
        assert_eq!(handle.state(), ConnectionState::Connected);
        assert_eq!(attempts.lock().unwrap().len(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_failure_reconnects_after_fixed_interval() {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let first = ScriptedStream::new(vec![
            Step::text(r#"{"type":"status","uptime_seconds":1}"#),
            Step::Wait(Duration::from_secs(1)),
            Step::Error,
        ]);
        let second = ScriptedStream::new(vec![]);
        let second_closed = second.closed.clone();

        let manager = manager(scripted_connector(
            vec![Some(first), Some(second)],
            attempts.clone(),
        ));
        let mut state_rx = manager.state();
        let observed = Arc::new(Mutex::new(Vec::new()));
        let observer = {
            let observed = observed.clone();
            tokio::spawn(async move {
                while state_rx.changed().await.is_ok() {
                    observed.lock().unwrap().push(*state_rx.borrow_and_update());
                }
            })
        };

        let start = Instant::now();
        let handle = manager.spawn();
        wait_for_attempts(&attempts, 2).await;
        let mut rx = handle.subscribe_state();
        rx.wait_for(|s| *s == ConnectionState::Connected).await.unwrap();

        let times = attempts.lock().unwrap().clone();
        let gap = times[1] - times[0];
        // 1s of reading, then exactly one reconnect interval
        assert_eq!(times[0], start);
        assert_eq!(gap, Duration::from_secs(1) + INTERVAL);

        handle.shutdown().await.unwrap();
        assert!(second_closed.load(Ordering::SeqCst));
        observer.await.unwrap();

        // Connecting may be overwritten before the observer runs
        let mut states = observed.lock().unwrap().clone();
        states.retain(|s| *s != ConnectionState::Connecting);
        states.dedup();
        assert_eq!(
            states,
            vec![
                ConnectionState::Connected,
                ConnectionState::Disconnected,
                ConnectionState::Connected,
                ConnectionState::Disconnected,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_handshake_failure_retries_at_constant_interval() {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let handle = manager(scripted_connector(
            vec![None, None, None, Some(ScriptedStream::new(vec![]))],
            attempts.clone(),
        ))
        .spawn();

        wait_for_attempts(&attempts, 4).await;
        let mut rx = handle.subscribe_state();
        rx.wait_for(|s| *s == ConnectionState::Connected).await.unwrap();

        let times = attempts.lock().unwrap().clone();
        for pair in times.windows(2) {
            assert_eq!(pair[1] - pair[0], INTERVAL, "Retries must not back off");
        }

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_close_reconnects() {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let handle = manager(scripted_connector(
            vec![
                Some(ScriptedStream::new(vec![Step::Close])),
                Some(ScriptedStream::new(vec![])),
            ],
            attempts.clone(),
        ))
        .spawn();

        wait_for_attempts(&attempts, 2).await;
        let times = attempts.lock().unwrap().clone();
        assert_eq!(times[1] - times[0], INTERVAL);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_timeout_counts_as_failure() {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let connector = HangingConnector {
            attempts: attempts.clone(),
        };
        let handle = manager(connector)
            .with_connect_timeout(Duration::from_secs(5))
            .spawn();

        wait_for_attempts(&attempts, 2).await;
        let times = attempts.lock().unwrap().clone();
        assert_eq!(times[1] - times[0], Duration::from_secs(5) + INTERVAL);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_timeout_error() {
        let connector = HangingConnector {
            attempts: Arc::new(Mutex::new(Vec::new())),
        };
        let manager = manager(connector).with_connect_timeout(Duration::from_secs(5));

        let start = Instant::now();
        let result = manager.connect().await;

        match result {
            Err(NovaError::ConnectTimeout(endpoint)) => assert_eq!(endpoint, "nova.test:2920"),
            Err(e) => panic!("Expected connect timeout, got {}", e),
            Ok(_) => panic!("Expected connect timeout, got a stream"),
        }
        assert_eq!(Instant::now() - start, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_error_is_returned() {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let manager = manager(scripted_connector(vec![None], attempts));

        assert!(matches!(manager.connect().await, Err(NovaError::Io(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_reconnect_delay() {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let handle = manager(scripted_connector(vec![None], attempts.clone())).spawn();

        wait_for_attempts(&attempts, 1).await;
        let mut rx = handle.subscribe_state();
        rx.wait_for(|s| *s == ConnectionState::Disconnected).await.unwrap();

        let before = Instant::now();
        handle.shutdown().await.unwrap();
        assert!(Instant::now() - before < INTERVAL);
        assert_eq!(attempts.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_connect() {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let connector = HangingConnector {
            attempts: attempts.clone(),
        };
        let handle = manager(connector)
            .with_connect_timeout(Duration::from_secs(60))
            .spawn();

        wait_for_attempts(&attempts, 1).await;
        assert_eq!(handle.state(), ConnectionState::Connecting);

        let store = handle.store().clone();
        let mut rx = handle.subscribe_state();
        handle.shutdown().await.unwrap();

        assert_eq!(*rx.borrow_and_update(), ConnectionState::Disconnected);
        assert_eq!(store.snapshot().sequence(), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_over_websocket() {
        use futures_util::{SinkExt, StreamExt};
        use tokio::net::TcpListener;
        use tokio_tungstenite::tungstenite::Message as WsMessage;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let connections = Arc::new(AtomicUsize::new(0));

        let server = {
            let connections = connections.clone();
            tokio::spawn(async move {
                let (tcp, _) = listener.accept().await.unwrap();
                connections.fetch_add(1, Ordering::SeqCst);
                let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
                ws.send(WsMessage::Text(SHOT_FRAME.into())).await.unwrap();
                // Hold the connection open until the client closes it
                while let Some(Ok(_)) = ws.next().await {}
            })
        };

        let handle = ConnectionManager::new(
            transport::WsConnector,
            Endpoint::new("127.0.0.1", port),
            Dispatcher::nova().unwrap(),
        )
        .spawn();

        let mut rx = handle.store().subscribe();
        let snapshot = tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|s| s.sequence() == 1),
        )
        .await
        .expect("no batch within 5s")
        .unwrap()
        .clone();

        assert_eq!(snapshot.value("session_shot_count"), Some(&ChannelValue::Integer(5)));
        assert_eq!(snapshot.value("ball_speed"), Some(&ChannelValue::Float(65.2)));
        assert_eq!(snapshot.value("ogc_ball_speed_mph"), Some(&ChannelValue::Float(145.9)));

        handle.shutdown().await.unwrap();
        server.await.unwrap();
        assert_eq!(connections.load(Ordering::SeqCst), 1);
    }
}
