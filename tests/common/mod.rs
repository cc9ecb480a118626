//! In-memory Bluetooth platform and recording sinks shared by the
//! integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use smartglove_client_lib::config::ClientConfig;
use smartglove_client_lib::core::bluetooth::constants::{
    uuid_from_u16, UUID_ENVIRONMENTAL_SENSING_SERVICE, UUID_HUMIDITY,
    UUID_PRESENTATION_FORMAT_DESCRIPTOR, UUID_TEMPERATURE, UUID_USER_DESCRIPTION_DESCRIPTOR,
};
use smartglove_client_lib::core::bluetooth::{
    BlePlatform, ConnectionManager, ConnectionStatus, GattCharacteristic, GattDevice,
    GattService, NotificationStream,
};
use smartglove_client_lib::core::display::DisplayEvent;
use smartglove_client_lib::core::{Diagnostic, DiagnosticSink, DisplaySink, Status};
use smartglove_client_lib::ClientError;
use tokio::sync::{broadcast, watch, Semaphore};
use uuid::Uuid;

pub struct MockCharacteristic {
    pub uuid: Uuid,
    descriptors: HashMap<Uuid, Vec<u8>>,
    value: Mutex<Vec<u8>>,
    notify_tx: broadcast::Sender<Vec<u8>>,
    pub subscriptions: AtomicUsize,
    pub reads: AtomicUsize,
    pub fail_read: AtomicBool,
}

impl MockCharacteristic {
    pub fn new(uuid: Uuid, name: Option<&str>, presentation: Option<&[u8]>, value: &[u8]) -> Arc<Self> {
        let mut descriptors = HashMap::new();
        if let Some(name) = name {
            descriptors.insert(UUID_USER_DESCRIPTION_DESCRIPTOR, name.as_bytes().to_vec());
        }
        if let Some(presentation) = presentation {
            descriptors.insert(UUID_PRESENTATION_FORMAT_DESCRIPTOR, presentation.to_vec());
        }
        let (notify_tx, _) = broadcast::channel(64);
        Arc::new(Self {
            uuid,
            descriptors,
            value: Mutex::new(value.to_vec()),
            notify_tx,
            subscriptions: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            fail_read: AtomicBool::new(false),
        })
    }

    /// Pushes a notification; returns how many subscribers received it.
    pub fn notify(&self, bytes: &[u8]) -> usize {
        *self.value.lock().unwrap() = bytes.to_vec();
        self.notify_tx.send(bytes.to_vec()).unwrap_or(0)
    }

    pub fn active_subscribers(&self) -> usize {
        self.notify_tx.receiver_count()
    }

    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GattCharacteristic for MockCharacteristic {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    async fn read_value(&self) -> Result<Vec<u8>, ClientError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_read.load(Ordering::SeqCst) {
            return Err(ClientError::Platform("read not permitted".into()));
        }
        Ok(self.value.lock().unwrap().clone())
    }

    async fn read_descriptor(&self, descriptor: Uuid) -> Result<Vec<u8>, ClientError> {
        self.descriptors
            .get(&descriptor)
            .cloned()
            .ok_or_else(|| ClientError::Platform(format!("descriptor {} not found", descriptor)))
    }

    async fn notifications(&self) -> Result<NotificationStream<'_>, ClientError> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let rx = self.notify_tx.subscribe();
        Ok(futures_util::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(bytes) => return Some((bytes, rx)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .boxed())
    }
}

pub struct MockService {
    pub uuid: Uuid,
    pub characteristics: Vec<Arc<MockCharacteristic>>,
    pub fail: bool,
}

impl MockService {
    pub fn new(uuid: Uuid, characteristics: Vec<Arc<MockCharacteristic>>) -> Arc<Self> {
        Arc::new(Self {
            uuid,
            characteristics,
            fail: false,
        })
    }
}

#[async_trait::async_trait]
impl GattService for MockService {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    async fn characteristics(&self) -> Result<Vec<Arc<dyn GattCharacteristic>>, ClientError> {
        if self.fail {
            return Err(ClientError::Platform("characteristic discovery failed".into()));
        }
        Ok(self
            .characteristics
            .iter()
            .map(|c| c.clone() as Arc<dyn GattCharacteristic>)
            .collect())
    }
}

pub struct MockDevice {
    pub name: String,
    services: Vec<Arc<MockService>>,
    connected: AtomicBool,
    link_dropped: watch::Sender<bool>,
    pub fail_connect: AtomicBool,
    pub fail_services: AtomicBool,
    pub hang_connect: AtomicBool,
    pub hang_disconnect: AtomicBool,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
}

impl MockDevice {
    pub fn new(name: &str, services: Vec<Arc<MockService>>) -> Arc<Self> {
        let (link_dropped, _) = watch::channel(false);
        Arc::new(Self {
            name: name.to_string(),
            services,
            connected: AtomicBool::new(false),
            link_dropped,
            fail_connect: AtomicBool::new(false),
            fail_services: AtomicBool::new(false),
            hang_connect: AtomicBool::new(false),
            hang_disconnect: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        })
    }

    /// Simulates the GATT server dropping the link.
    pub fn drop_link(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.link_dropped.send_replace(true);
    }

    fn reset_link(&self) {
        self.link_dropped.send_replace(false);
    }

    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GattDevice for MockDevice {
    fn id(&self) -> String {
        format!("mock-{}", self.name)
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    async fn connect(&self) -> Result<(), ClientError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.hang_connect.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ClientError::Platform("GATT connect rejected".into()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.hang_disconnect.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.connected()
    }

    async fn primary_services(&self) -> Result<Vec<Arc<dyn GattService>>, ClientError> {
        if self.fail_services.load(Ordering::SeqCst) {
            return Err(ClientError::Platform("service enumeration failed".into()));
        }
        Ok(self
            .services
            .iter()
            .map(|s| s.clone() as Arc<dyn GattService>)
            .collect())
    }

    async fn disconnected(&self) -> Result<(), ClientError> {
        let mut rx = self.link_dropped.subscribe();
        let _ = rx.wait_for(|dropped| *dropped).await;
        Ok(())
    }
}

#[derive(Default)]
pub struct MockPlatform {
    pub device: Option<Arc<MockDevice>>,
    pub request_error: Mutex<Option<ClientError>>,
    pub gate: Option<Arc<Semaphore>>,
    pub requests: AtomicUsize,
    pub last_services: Mutex<Vec<Uuid>>,
    pub last_name_filter: Mutex<String>,
}

impl MockPlatform {
    pub fn with_device(device: Arc<MockDevice>) -> Arc<Self> {
        Arc::new(Self {
            device: Some(device),
            ..Default::default()
        })
    }

    /// Blocks `request_device` until the returned semaphore gets a permit.
    pub fn gated(device: Arc<MockDevice>) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let platform = Arc::new(Self {
            device: Some(device),
            gate: Some(gate.clone()),
            ..Default::default()
        });
        (platform, gate)
    }
}

#[async_trait::async_trait]
impl BlePlatform for MockPlatform {
    async fn request_device(
        &self,
        name_filter: &str,
        allowed_services: &[Uuid],
    ) -> Result<Arc<dyn GattDevice>, ClientError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.last_name_filter.lock().unwrap() = name_filter.to_string();
        *self.last_services.lock().unwrap() = allowed_services.to_vec();

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| ClientError::UserCancelled)?;
            permit.forget();
        }
        if let Some(e) = self.request_error.lock().unwrap().clone() {
            return Err(e);
        }

        let device = self
            .device
            .clone()
            .filter(|d| d.name == name_filter)
            .ok_or(ClientError::UserCancelled)?;
        device.reset_link();
        Ok(device as Arc<dyn GattDevice>)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn row_name(&self, uuid: Uuid) -> Option<String> {
        self.events().into_iter().find_map(|e| match e {
            DisplayEvent::ShowRow { uuid: u, name } if u == uuid => Some(name),
            _ => None,
        })
    }

    pub fn values(&self, uuid: Uuid) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DisplayEvent::UpdateValue { uuid: u, value } if u == uuid => Some(value),
                _ => None,
            })
            .collect()
    }

    pub fn last_value(&self, uuid: Uuid) -> Option<String> {
        self.values(uuid).pop()
    }

    pub fn statuses(&self) -> Vec<(Status, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DisplayEvent::Status { status, message } => Some((status, message)),
                _ => None,
            })
            .collect()
    }

    pub fn count_status(&self, status: Status) -> usize {
        self.statuses().iter().filter(|(s, _)| *s == status).count()
    }

    pub fn clear_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, DisplayEvent::ClearAll))
            .count()
    }

    pub fn connect_enabled(&self) -> Option<bool> {
        self.events().into_iter().rev().find_map(|e| match e {
            DisplayEvent::ConnectEnabled { enabled } => Some(enabled),
            _ => None,
        })
    }

    fn push(&self, event: DisplayEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl DisplaySink for RecordingSink {
    fn show_row(&self, uuid: Uuid, name: &str) {
        self.push(DisplayEvent::ShowRow {
            uuid,
            name: name.to_string(),
        });
    }

    fn update_value(&self, uuid: Uuid, text: &str) {
        self.push(DisplayEvent::UpdateValue {
            uuid,
            value: text.to_string(),
        });
    }

    fn clear_all(&self) {
        self.push(DisplayEvent::ClearAll);
    }

    fn set_status(&self, status: Status, message: &str) {
        self.push(DisplayEvent::Status {
            status,
            message: message.to_string(),
        });
    }

    fn set_connect_enabled(&self, enabled: bool) {
        self.push(DisplayEvent::ConnectEnabled { enabled });
    }
}

#[derive(Default)]
pub struct RecordingDiagnostics {
    reported: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<Diagnostic> {
        self.reported.lock().unwrap().clone()
    }

    pub fn any(&self, predicate: impl Fn(&Diagnostic) -> bool) -> bool {
        self.all().iter().any(predicate)
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        self.reported.lock().unwrap().push(diagnostic);
    }
}

/// Polls `condition` until it holds, panicking after two seconds.
pub async fn eventually(what: &str, condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never held: {}", what);
}

/// Polls the manager until its status satisfies `predicate`.
pub async fn wait_for_status(
    manager: &ConnectionManager,
    what: &str,
    predicate: impl Fn(&ConnectionStatus) -> bool,
) {
    for _ in 0..200 {
        if predicate(&manager.status().await) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("status never reached: {}", what);
}

pub const TEMPERATURE_PRESENTATION: [u8; 7] = [0x0E, 0xFE, 0x2F, 0x27, 0x01, 0x00, 0x00];
pub const HUMIDITY_PRESENTATION: [u8; 7] = [0x06, 0xFE, 0xAD, 0x27, 0x01, 0x00, 0x00];
pub const UUID_BATTERY_SERVICE: Uuid = uuid_from_u16(0x180F);

/// A glove exposing temperature and humidity plus a service we do not know.
pub struct Glove {
    pub device: Arc<MockDevice>,
    pub temperature: Arc<MockCharacteristic>,
    pub humidity: Arc<MockCharacteristic>,
}

pub fn environmental_glove() -> Glove {
    let temperature = MockCharacteristic::new(
        UUID_TEMPERATURE,
        Some("Temperature"),
        Some(&TEMPERATURE_PRESENTATION),
        &2150i16.to_le_bytes(),
    );
    let humidity = MockCharacteristic::new(
        UUID_HUMIDITY,
        Some("Humidity"),
        Some(&HUMIDITY_PRESENTATION),
        &4012u16.to_le_bytes(),
    );
    let environmental = MockService::new(
        UUID_ENVIRONMENTAL_SENSING_SERVICE,
        vec![temperature.clone(), humidity.clone()],
    );
    let battery = MockService::new(UUID_BATTERY_SERVICE, vec![]);
    let device = MockDevice::new("SmartGlove", vec![environmental, battery]);
    Glove {
        device,
        temperature,
        humidity,
    }
}

pub fn manager(
    platform: Option<Arc<dyn BlePlatform>>,
    config: ClientConfig,
) -> (ConnectionManager, Arc<RecordingSink>, Arc<RecordingDiagnostics>) {
    let sink = RecordingSink::new();
    let diagnostics = RecordingDiagnostics::new();
    let manager = ConnectionManager::new(platform, sink.clone(), diagnostics.clone(), config);
    (manager, sink, diagnostics)
}
