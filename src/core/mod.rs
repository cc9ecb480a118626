//! Core functionality for the SmartGlove client
//! This module contains the connection state machine and the decoders that
//! turn characteristic payloads into displayable values.

pub mod bluetooth;
pub mod diagnostics;
pub mod display;
pub mod format;
pub mod presentation;
pub mod value;

// Re-export commonly used types
pub use bluetooth::ConnectionManager;
pub use diagnostics::{Diagnostic, DiagnosticSink, LogDiagnostics};
pub use display::{DisplaySink, JsonLinesSink, Status};
pub use format::{decimal_places, format_value, unit_symbol};
pub use presentation::{FormatCode, PresentationInfo};
pub use value::{decode_or_zero, decode_value, DecodedValue};
