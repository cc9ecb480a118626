//! User commands
//! This module defines the actions a user can trigger from the console.

use std::str::FromStr;

use log::{error, info};

use crate::core::bluetooth::{ConnectOutcome, ConnectionStatus};
use crate::core::ConnectionManager;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    /// Disconnects, or cancels an attempt that is still in progress
    Disconnect,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "connect" => Ok(Self::Connect),
            "d" | "disconnect" | "cancel" => Ok(Self::Disconnect),
            "s" | "status" => Ok(Self::Status),
            "h" | "help" | "?" => Ok(Self::Help),
            "q" | "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("Unknown command: {:?}", other)),
        }
    }
}

pub const HELP: &str = "commands: connect | disconnect (cancel) | status | help | quit";

/// Whether the console loop should keep running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Connects to the SmartGlove.
pub async fn connect(connection_manager: &ConnectionManager) -> Result<ConnectOutcome, String> {
    connection_manager.connect().await.map_err(|e| e.to_string())
}

/// Disconnects from the SmartGlove, or cancels a pending connection attempt.
pub async fn disconnect(connection_manager: &ConnectionManager) -> Result<(), String> {
    connection_manager.disconnect().await.map_err(|e| e.to_string())
}

pub async fn status(connection_manager: &ConnectionManager) -> ConnectionStatus {
    connection_manager.status().await
}

/// Runs one command. Connecting happens on a background task so a pending
/// attempt can still be cancelled from the console.
pub async fn execute(app_state: &AppState, command: Command) -> Flow {
    let connection_manager = app_state.connection_manager();
    match command {
        Command::Connect => {
            tokio::spawn(async move {
                match connect(&connection_manager).await {
                    Ok(outcome) => info!("Connect finished: {:?}", outcome),
                    Err(e) => error!("Connect failed: {}", e),
                }
            });
            Flow::Continue
        }
        Command::Disconnect => {
            if let Err(e) = disconnect(&connection_manager).await {
                error!("Disconnect failed: {}", e);
            }
            Flow::Continue
        }
        Command::Status => {
            let current = status(&connection_manager).await;
            match serde_json::to_string(&current) {
                Ok(json) => info!("Status: {}", json),
                Err(e) => error!("Failed to serialize status: {}", e),
            }
            Flow::Continue
        }
        Command::Help => {
            info!("{}", HELP);
            Flow::Continue
        }
        Command::Quit => {
            if let Err(e) = disconnect(&connection_manager).await {
                error!("Disconnect failed: {}", e);
            }
            Flow::Quit
        }
    }
}
