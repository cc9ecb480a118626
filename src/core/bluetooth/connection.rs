//! Bluetooth connection handling for the SmartGlove
//! This module drives device acquisition, the GATT connection and the
//! cleanup that follows a disconnect or a failed attempt.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::core::bluetooth::discovery;
use crate::core::bluetooth::platform::{BlePlatform, GattDevice};
use crate::core::bluetooth::session::{PresentationCache, Session, SessionContext};
use crate::core::bluetooth::tables::supported_service_uuids;
use crate::core::bluetooth::types::{ConnectOutcome, ConnectionStatus};
use crate::core::diagnostics::DiagnosticSink;
use crate::core::display::{DisplaySink, Status};
use crate::error::ClientError;

pub const UNSUPPORTED_MESSAGE: &str =
    "This platform does not support Bluetooth LE. Please try another machine.";
pub const CONNECT_FAILED_MESSAGE: &str = "Error connecting to Bluetooth device";
pub const DISCONNECTED_MESSAGE: &str = "Disconnected";

enum ConnectionState {
    Idle,
    Connecting {
        generation: u64,
        cancel_token: CancellationToken,
    },
    Connected(Session),
}

struct Inner {
    platform: Option<Arc<dyn BlePlatform>>,
    sink: Arc<dyn DisplaySink>,
    diagnostics: Arc<dyn DiagnosticSink>,
    config: ClientConfig,
    state: Mutex<ConnectionState>,
    next_generation: AtomicU64,
}

/// Connection manager for the SmartGlove
///
/// Cheap to clone; all clones drive the same state machine.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// `platform` is `None` when no Bluetooth LE stack is available.
    pub fn new(
        platform: Option<Arc<dyn BlePlatform>>,
        sink: Arc<dyn DisplaySink>,
        diagnostics: Arc<dyn DiagnosticSink>,
        config: ClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                platform,
                sink,
                diagnostics,
                config,
                state: Mutex::new(ConnectionState::Idle),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Connects to the SmartGlove and starts tracking its characteristics.
    ///
    /// Returns immediately without side effects when a session exists or
    /// another attempt is in flight. On failure every partial step is undone
    /// and a single failure status is shown.
    pub async fn connect(&self) -> Result<ConnectOutcome, ClientError> {
        let (generation, cancel_token) = {
            let mut state = self.inner.state.lock().await;
            match &*state {
                ConnectionState::Connected(_) => {
                    info!("Already connected");
                    return Ok(ConnectOutcome::AlreadyConnected);
                }
                ConnectionState::Connecting { .. } => {
                    info!("Connection attempt already in progress");
                    return Ok(ConnectOutcome::AlreadyConnecting);
                }
                ConnectionState::Idle => {}
            }

            if self.inner.platform.is_none() {
                error!("No Bluetooth LE support available");
                self.inner.sink.set_status(Status::Fail, UNSUPPORTED_MESSAGE);
                return Err(ClientError::PlatformUnsupported);
            }

            let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
            let cancel_token = CancellationToken::new();
            *state = ConnectionState::Connecting {
                generation,
                cancel_token: cancel_token.clone(),
            };
            (generation, cancel_token)
        };

        self.inner.sink.set_connect_enabled(false);
        info!("Opening Bluetooth connection...");

        let mut partial = None;
        let error = match self
            .establish(generation, cancel_token.clone(), &mut partial)
            .await
        {
            Ok(session) => {
                let mut state = self.inner.state.lock().await;
                if !session.context.is_closed() {
                    let device_name = session.device_name.clone();
                    info!("Session {} established with {}", generation, device_name);
                    *state = ConnectionState::Connected(session);
                    return Ok(ConnectOutcome::Connected { device_name });
                }
                drop(state);
                session.close();
                ClientError::ConnectionFailed("link dropped during discovery".to_string())
            }
            Err(e) => e,
        };

        self.fail(error, cancel_token, partial).await
    }

    async fn establish(
        &self,
        generation: u64,
        cancel_token: CancellationToken,
        partial: &mut Option<Arc<dyn GattDevice>>,
    ) -> Result<Session, ClientError> {
        let platform = self
            .inner
            .platform
            .clone()
            .ok_or(ClientError::PlatformUnsupported)?;
        let config = &self.inner.config;

        let device = step(
            &cancel_token,
            config.scan_timeout(),
            "waiting for device selection",
            platform.request_device(&config.device_name, &supported_service_uuids()),
        )
        .await?;
        *partial = Some(device.clone());

        let name = device.name();
        info!("Connected to: {}", name);
        self.inner
            .sink
            .set_status(Status::Ok, &format!("Connected to {}", name));
        self.spawn_disconnect_watcher(generation, device.clone(), cancel_token.clone());

        step(
            &cancel_token,
            config.connect_timeout(),
            "connecting to GATT server",
            device.connect(),
        )
        .await?;
        info!("GATT server connected");

        let services = step(
            &cancel_token,
            config.connect_timeout(),
            "enumerating services",
            device.primary_services(),
        )
        .await?;

        let context = SessionContext {
            cache: Arc::new(PresentationCache::new()),
            sink: self.inner.sink.clone(),
            diagnostics: self.inner.diagnostics.clone(),
            cancel_token,
            read_timeout: config.read_timeout(),
            discovery_mode: config.discovery_mode,
        };
        discovery::init_services(services, &context);

        Ok(Session::new(generation, device, context))
    }

    async fn fail(
        &self,
        error: ClientError,
        cancel_token: CancellationToken,
        partial: Option<Arc<dyn GattDevice>>,
    ) -> Result<ConnectOutcome, ClientError> {
        cancel_token.cancel();

        if let Some(device) = partial {
            if device.is_connected().await {
                if let Err(e) = self.disconnect_device(device.as_ref()).await {
                    warn!("Failed to disconnect partial session: {}", e);
                }
            }
        }

        let mut state = self.inner.state.lock().await;
        *state = ConnectionState::Idle;
        error!("Error connecting to Bluetooth device: {}", error);
        self.inner.sink.clear_all();
        self.inner.sink.set_status(Status::Fail, CONNECT_FAILED_MESSAGE);
        self.inner.sink.set_connect_enabled(true);
        Err(error)
    }

    fn spawn_disconnect_watcher(
        &self,
        generation: u64,
        device: Arc<dyn GattDevice>,
        cancel_token: CancellationToken,
    ) {
        let manager = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = device.disconnected() => match result {
                    Ok(()) => manager.on_disconnect(generation, &device.name()).await,
                    Err(e) => warn!("Failed to watch for disconnection of {}: {}", device.id(), e),
                },
                _ = cancel_token.cancelled() => {
                    debug!("Disconnect watcher for session {} stopped", generation);
                }
            }
        });
    }

    /// Handles a link loss reported by the platform for session `generation`.
    /// Events for sessions that are already gone are ignored.
    pub async fn on_disconnect(&self, generation: u64, device_name: &str) {
        let mut state = self.inner.state.lock().await;
        let session = match std::mem::replace(&mut *state, ConnectionState::Idle) {
            ConnectionState::Connected(session) if session.generation == generation => session,
            ConnectionState::Connecting {
                generation: pending,
                cancel_token,
            } if pending == generation => {
                info!("Disconnected from {} while connecting", device_name);
                cancel_token.cancel();
                *state = ConnectionState::Connecting {
                    generation: pending,
                    cancel_token,
                };
                return;
            }
            other => {
                *state = other;
                debug!("Ignoring disconnect of stale session {}", generation);
                return;
            }
        };

        info!("Disconnected from: {}", device_name);
        self.clear_session(session);
    }

    /// Disconnects on user request. Cancels an attempt in flight and does
    /// nothing when idle.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        let mut state = self.inner.state.lock().await;
        match std::mem::replace(&mut *state, ConnectionState::Idle) {
            ConnectionState::Connected(session) => {
                let device = session.device.clone();
                self.clear_session(session);
                drop(state);
                self.disconnect_device(device.as_ref()).await
            }
            ConnectionState::Connecting {
                generation,
                cancel_token,
            } => {
                info!("Cancelling connection attempt {}", generation);
                if let Some(platform) = &self.inner.platform {
                    platform.cancel_request();
                }
                cancel_token.cancel();
                *state = ConnectionState::Connecting {
                    generation,
                    cancel_token,
                };
                Ok(())
            }
            ConnectionState::Idle => {
                debug!("Not connected");
                Ok(())
            }
        }
    }

    /// Disconnects GATT without holding the state lock.
    async fn disconnect_device(&self, device: &dyn GattDevice) -> Result<(), ClientError> {
        match tokio::time::timeout(self.inner.config.connect_timeout(), device.disconnect()).await
        {
            Ok(result) => result,
            Err(_) => {
                warn!("Disconnecting from {} timed out", device.id());
                Err(ClientError::Timeout("disconnecting from GATT server"))
            }
        }
    }

    fn clear_session(&self, session: Session) {
        session.close();
        self.inner.sink.clear_all();
        self.inner.sink.set_status(Status::Ready, DISCONNECTED_MESSAGE);
        self.inner.sink.set_connect_enabled(true);
    }

    pub async fn status(&self) -> ConnectionStatus {
        let state = self.inner.state.lock().await;
        match &*state {
            ConnectionState::Idle => ConnectionStatus::Idle,
            ConnectionState::Connecting { .. } => ConnectionStatus::Connecting,
            ConnectionState::Connected(session) => ConnectionStatus::Connected {
                device_id: session.device.id(),
                device_name: session.device_name.clone(),
                tracked_characteristics: session.context.cache.len(),
            },
        }
    }

    /// The presentation cache of the live session, if any.
    pub async fn presentation_cache(&self) -> Option<Arc<PresentationCache>> {
        let state = self.inner.state.lock().await;
        match &*state {
            ConnectionState::Connected(session) => Some(session.context.cache.clone()),
            _ => None,
        }
    }

    pub async fn is_connected(&self) -> bool {
        matches!(self.status().await, ConnectionStatus::Connected { .. })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

/// Runs one connection step under a timeout, aborting when the attempt is
/// cancelled.
async fn step<T, F>(
    cancel_token: &CancellationToken,
    limit: Duration,
    what: &'static str,
    operation: F,
) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    tokio::select! {
        result = tokio::time::timeout(limit, operation) => match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(ClientError::Platform(reason))) => Err(ClientError::ConnectionFailed(reason)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ClientError::Timeout(what)),
        },
        _ = cancel_token.cancelled() => Err(ClientError::UserCancelled),
    }
}
