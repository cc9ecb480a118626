//! Characteristic tracking
//! Each tracked characteristic runs one task: read its descriptors, publish
//! the current value, then republish every notification until the session ends.

use std::sync::Arc;

use futures_util::StreamExt;
use log::{debug, info};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::DiscoveryMode;
use crate::core::bluetooth::constants::{
    UUID_PRESENTATION_FORMAT_DESCRIPTOR, UUID_USER_DESCRIPTION_DESCRIPTOR,
};
use crate::core::bluetooth::platform::GattCharacteristic;
use crate::core::bluetooth::session::SessionContext;
use crate::core::diagnostics::Diagnostic;
use crate::core::format::{format_value, unit_symbol};
use crate::core::presentation::{FormatCode, PresentationInfo};
use crate::core::value::decode_or_zero;
use crate::error::ClientError;

/// Format assumed for allow-listed characteristics without a presentation
/// descriptor: unitless float32 shown with two decimals.
const ALLOW_LIST_PRESENTATION: PresentationInfo =
    PresentationInfo::new(FormatCode::Float32, -2, 0x2700);

/// Tracks one characteristic for the lifetime of a session
pub struct CharacteristicTracker {
    characteristic: Arc<dyn GattCharacteristic>,
    context: SessionContext,
    /// Name taken from the allow-list instead of the user description
    preset_name: Option<&'static str>,
}

impl CharacteristicTracker {
    pub fn new(
        characteristic: Arc<dyn GattCharacteristic>,
        context: SessionContext,
        preset_name: Option<&'static str>,
    ) -> Self {
        Self {
            characteristic,
            context,
            preset_name,
        }
    }

    /// Runs the tracker on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let uuid = self.characteristic.uuid();
            match self.run().await {
                Ok(()) => debug!("Tracker for \"{}\" finished", uuid),
                Err(e) => debug!("Tracker for \"{}\" abandoned: {}", uuid, e),
            }
        })
    }

    /// Sets the characteristic up and processes notifications until the
    /// session is cancelled or the stream ends. An error means the
    /// characteristic was abandoned; it never affects other trackers.
    pub async fn run(self) -> Result<(), ClientError> {
        let uuid = self.characteristic.uuid();

        let name = match self.preset_name {
            Some(name) => name.to_string(),
            None => self.read_user_description().await,
        };
        info!("Found characteristic \"{}\" with UUID \"{}\"", name, uuid);

        let presentation = self.read_presentation().await?;
        if !self.context.cache.insert(uuid, presentation) {
            debug!("Session closed before \"{}\" was tracked", uuid);
            return Ok(());
        }
        self.check_presentation(uuid, &presentation);

        let initial = match self.read_with_timeout(self.characteristic.read_value()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.context.report(Diagnostic::ValueReadFailed {
                    uuid,
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };
        if self.context.is_closed() {
            return Ok(());
        }
        self.context.sink.show_row(uuid, &name);
        publish(&self.context, uuid, &presentation, &initial);

        let mut stream = match self.characteristic.notifications().await {
            Ok(stream) => stream,
            Err(e) => {
                self.context.report(Diagnostic::SubscribeFailed {
                    uuid,
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };
        info!("Started notifications for UUID \"{}\"", uuid);

        loop {
            tokio::select! {
                item = stream.next() => {
                    match item {
                        Some(bytes) => {
                            handle_notification(&self.context, uuid, &bytes);
                        }
                        None => {
                            info!("Notification stream of \"{}\" ended", uuid);
                            break;
                        }
                    }
                }
                _ = self.context.cancel_token.cancelled() => {
                    debug!("Stopping notifications for \"{}\"", uuid);
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_user_description(&self) -> String {
        let uuid = self.characteristic.uuid();
        let read = self.read_with_timeout(
            self.characteristic
                .read_descriptor(UUID_USER_DESCRIPTION_DESCRIPTOR),
        );
        match read.await {
            Ok(bytes) => String::from_utf8_lossy(&bytes)
                .trim_end_matches('\0')
                .to_string(),
            Err(_) => {
                self.context
                    .report(Diagnostic::MissingUserDescription { uuid });
                String::new()
            }
        }
    }

    async fn read_presentation(&self) -> Result<PresentationInfo, ClientError> {
        let uuid = self.characteristic.uuid();
        let read = self.read_with_timeout(
            self.characteristic
                .read_descriptor(UUID_PRESENTATION_FORMAT_DESCRIPTOR),
        );
        let parsed = match read.await {
            Ok(bytes) => PresentationInfo::parse(&bytes),
            Err(_) if self.context.discovery_mode == DiscoveryMode::AllowList => {
                debug!("No presentation format for \"{}\", assuming float32", uuid);
                return Ok(ALLOW_LIST_PRESENTATION);
            }
            Err(e) => Err(e),
        };
        parsed.map_err(|e| {
            self.context.report(Diagnostic::InvalidDescriptor {
                uuid,
                reason: e.to_string(),
            });
            e
        })
    }

    fn check_presentation(&self, uuid: Uuid, presentation: &PresentationInfo) {
        if let FormatCode::Unsupported(code) = presentation.format {
            self.context
                .report(Diagnostic::UnsupportedFormat { uuid, code });
        }
        if presentation.format != FormatCode::Boolean && unit_symbol(presentation.unit).is_none()
        {
            self.context.report(Diagnostic::UnknownUnit {
                uuid,
                code: presentation.unit,
            });
        }
    }

    async fn read_with_timeout<F>(&self, read: F) -> Result<Vec<u8>, ClientError>
    where
        F: std::future::Future<Output = Result<Vec<u8>, ClientError>>,
    {
        tokio::time::timeout(self.context.read_timeout, read)
            .await
            .map_err(|_| ClientError::Timeout("reading characteristic"))?
    }
}

/// Decodes a notification payload with the cached presentation format and
/// pushes it to the display. Returns the rendered text, or `None` when the
/// characteristic has no cached format and the payload was dropped.
pub fn handle_notification(context: &SessionContext, uuid: Uuid, bytes: &[u8]) -> Option<String> {
    let Some(presentation) = context.cache.get(&uuid) else {
        context.report(Diagnostic::UntrackedNotification { uuid });
        return None;
    };
    debug!("Received data for \"{}\": {:?}", uuid, bytes);
    Some(publish(context, uuid, &presentation, bytes))
}

fn publish(
    context: &SessionContext,
    uuid: Uuid,
    presentation: &PresentationInfo,
    bytes: &[u8],
) -> String {
    let (value, error) = decode_or_zero(presentation, bytes);
    match error {
        Some(ClientError::ShortValueBuffer { expected, actual }) => {
            context.report(Diagnostic::ShortValueBuffer {
                uuid,
                expected,
                actual,
            });
        }
        // unsupported formats are reported once during setup
        Some(_) | None => {}
    }

    let text = format_value(&value, presentation);
    if !context.is_closed() {
        context.sink.update_value(uuid, &text);
    }
    text
}
