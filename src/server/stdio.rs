//! Persistent stdio transport.
//!
//! One JSON message per line, processed strictly in arrival order so
//! responses come back in request order. The channel requires an
//! `initialize` handshake before tool methods are served.

use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use super::state::ServerState;
use crate::mcp::handler::{handle_message, ChannelMode};

pub async fn run_stdio_server(state: ServerState) -> Result<()> {
    info!("stdio transport ready");

    // Async stdin so reads never block the runtime
    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();

    let mut initialized = false;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = handle_message(
            line,
            &state,
            None,
            ChannelMode::Persistent {
                initialized: &mut initialized,
            },
        )
        .await;

        if let Some(response) = response {
            let json =
                serde_json::to_string(&response).context("Failed to serialize response")?;
            writeln!(stdout, "{}", json).context("Failed to write stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }

    info!("stdin closed, shutting down");
    state.forwards.stop_all().await;
    Ok(())
}
