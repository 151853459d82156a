// notifier/console/listener.rs

use crate::notifier::console::command_handler::handle_command;
use crate::notifier::console::ConsoleNotifier;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Reads commands from stdin until it closes.
pub async fn listen_for_commands(notifier: &ConsoleNotifier) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if !text.starts_with('/') {
            debug!("Ignoring non-command input: {}", text);
            continue;
        }
        handle_command(text, notifier).await;
    }
    Ok(())
}
