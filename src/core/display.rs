//! The display sink the client pushes rows, values and status into.

use std::io::Write;
use std::sync::Mutex;

use log::error;
use serde::Serialize;
use uuid::Uuid;

/// Connection status shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ready,
    Ok,
    Fail,
}

/// Everything the core needs from a user interface
pub trait DisplaySink: Send + Sync {
    /// Adds a row for a service or characteristic.
    fn show_row(&self, uuid: Uuid, name: &str);
    /// Replaces the displayed value of a characteristic.
    fn update_value(&self, uuid: Uuid, text: &str);
    /// Removes every row.
    fn clear_all(&self);
    fn set_status(&self, status: Status, message: &str);
    fn set_connect_enabled(&self, enabled: bool);
}

/// One display call, serialized as a JSON line by [`JsonLinesSink`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum DisplayEvent {
    ShowRow { uuid: Uuid, name: String },
    UpdateValue { uuid: Uuid, value: String },
    ClearAll,
    Status { status: Status, message: String },
    ConnectEnabled { enabled: bool },
}

/// Writes each display call as a JSON object on its own line
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(&self, event: DisplayEvent) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize display event: {}", e);
                return;
            }
        };

        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            error!("Failed to write display event: {}", e);
        }
    }
}

impl<W: Write + Send> DisplaySink for JsonLinesSink<W> {
    fn show_row(&self, uuid: Uuid, name: &str) {
        self.emit(DisplayEvent::ShowRow {
            uuid,
            name: name.to_string(),
        });
    }

    fn update_value(&self, uuid: Uuid, text: &str) {
        self.emit(DisplayEvent::UpdateValue {
            uuid,
            value: text.to_string(),
        });
    }

    fn clear_all(&self) {
        self.emit(DisplayEvent::ClearAll);
    }

    fn set_status(&self, status: Status, message: &str) {
        self.emit(DisplayEvent::Status {
            status,
            message: message.to_string(),
        });
    }

    fn set_connect_enabled(&self, enabled: bool) {
        self.emit(DisplayEvent::ConnectEnabled { enabled });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bluetooth::constants::UUID_TEMPERATURE;

    #[test]
    fn test_json_lines_output() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.show_row(UUID_TEMPERATURE, "Temperature");
        sink.update_value(UUID_TEMPERATURE, "21.50 °C");
        sink.set_status(Status::Ok, "Connected to SmartGlove");
        sink.clear_all();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["event"], "show-row");
        assert_eq!(lines[0]["name"], "Temperature");
        assert_eq!(lines[1]["value"], "21.50 °C");
        assert_eq!(lines[2]["status"], "ok");
        assert_eq!(lines[3]["event"], "clear-all");
    }
}
