//! Service discovery
//! Walks the primary services of a freshly connected device and starts a
//! tracker for every characteristic of the services this client supports.

use std::sync::Arc;

use log::{debug, info};

use crate::config::DiscoveryMode;
use crate::core::bluetooth::notification::CharacteristicTracker;
use crate::core::bluetooth::platform::GattService;
use crate::core::bluetooth::session::SessionContext;
use crate::core::bluetooth::tables::{characteristic_name, service_name};
use crate::core::diagnostics::Diagnostic;

/// Starts discovery of every supported service and returns how many were
/// matched. Each service is handled on its own task, in no particular order.
pub fn init_services(services: Vec<Arc<dyn GattService>>, context: &SessionContext) -> usize {
    let mut matched = 0;
    for service in services {
        let uuid = service.uuid();
        match service_name(&uuid) {
            Some(name) => {
                matched += 1;
                let context = context.clone();
                tokio::spawn(async move {
                    init_service(service, name, context).await;
                });
            }
            None => context.report(Diagnostic::UnsupportedService { uuid }),
        }
    }
    info!("Discovered {} supported services", matched);
    matched
}

async fn init_service(service: Arc<dyn GattService>, name: &'static str, context: SessionContext) {
    let uuid = service.uuid();
    info!("Found service \"{}\" with UUID \"{}\"", name, uuid);
    context.sink.show_row(uuid, name);

    let characteristics = tokio::select! {
        result = service.characteristics() => result,
        _ = context.cancel_token.cancelled() => {
            debug!("Session closed while discovering \"{}\"", uuid);
            return;
        }
    };
    let characteristics = match characteristics {
        Ok(characteristics) => characteristics,
        Err(e) => {
            context.report(Diagnostic::CharacteristicDiscoveryFailed {
                service: uuid,
                reason: e.to_string(),
            });
            return;
        }
    };

    for characteristic in characteristics {
        let preset_name = match context.discovery_mode {
            DiscoveryMode::Descriptor => None,
            DiscoveryMode::AllowList => {
                let char_uuid = characteristic.uuid();
                match characteristic_name(&char_uuid) {
                    Some(name) => Some(name),
                    None => {
                        context.report(Diagnostic::UnsupportedCharacteristic { uuid: char_uuid });
                        continue;
                    }
                }
            }
        };
        CharacteristicTracker::new(characteristic, context.clone(), preset_name).spawn();
    }
}
