use std::path::PathBuf;

use anyhow::Result;
use log::{error, info};
use smartglove_client_lib::commands::{self, Command, Flow, HELP};
use smartglove_client_lib::config::{AppConfig, CONFIG_ENV_VAR};
use smartglove_client_lib::logging;
use smartglove_client_lib::state::AppState;
use tokio::io::{AsyncBufReadExt, BufReader};

fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("smartglove.json"))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::setup_logging(log::Level::Info);
    let config = AppConfig::load_config(&config_path()).await?;
    logging::set_level(config.client.log_level());

    let app_state = AppState::new(config).await;
    info!("{}", HELP);

    if app_state.config.client.auto_connect {
        commands::execute(&app_state, Command::Connect).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        if commands::execute(&app_state, command).await == Flow::Quit {
                            break;
                        }
                    }
                    Err(e) => error!("{}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    commands::disconnect(&app_state.connection_manager)
        .await
        .map_err(anyhow::Error::msg)?;
    info!("Goodbye");
    Ok(())
}
