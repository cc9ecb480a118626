//! Per-connection state
//! Everything a connection owns lives here, so dropping the session is the
//! whole of disconnect cleanup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::debug;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::DiscoveryMode;
use crate::core::bluetooth::platform::GattDevice;
use crate::core::diagnostics::{Diagnostic, DiagnosticSink};
use crate::core::display::DisplaySink;
use crate::core::presentation::PresentationInfo;

#[derive(Default)]
struct CacheInner {
    entries: HashMap<Uuid, PresentationInfo>,
    closed: bool,
}

/// Presentation formats of the characteristics tracked in one session
#[derive(Default)]
pub struct PresentationCache {
    inner: Mutex<CacheInner>,
}

impl PresentationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Stores `info` for `uuid`. Returns false once the cache has been
    /// closed by a disconnect.
    pub fn insert(&self, uuid: Uuid, info: PresentationInfo) -> bool {
        let mut inner = self.lock();
        if inner.closed {
            return false;
        }
        inner.entries.insert(uuid, info);
        true
    }

    pub fn get(&self, uuid: &Uuid) -> Option<PresentationInfo> {
        self.lock().entries.get(uuid).copied()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry and refuses further inserts.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.closed = true;
    }
}

/// What discovery and the trackers share within one session
#[derive(Clone)]
pub struct SessionContext {
    pub cache: Arc<PresentationCache>,
    pub sink: Arc<dyn DisplaySink>,
    pub diagnostics: Arc<dyn DiagnosticSink>,
    pub cancel_token: CancellationToken,
    pub read_timeout: Duration,
    pub discovery_mode: DiscoveryMode,
}

impl SessionContext {
    pub fn is_closed(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.report(diagnostic);
    }
}

/// A live connection to one device
pub struct Session {
    pub generation: u64,
    pub device: Arc<dyn GattDevice>,
    pub device_name: String,
    pub context: SessionContext,
}

impl Session {
    pub fn new(generation: u64, device: Arc<dyn GattDevice>, context: SessionContext) -> Self {
        let device_name = device.name();
        Self {
            generation,
            device,
            device_name,
            context,
        }
    }

    /// Stops every task belonging to this session and forgets its cache.
    pub fn close(&self) {
        debug!("Closing session {} for {}", self.generation, self.device_name);
        self.context.cancel_token.cancel();
        self.context.cache.close();
    }
}
