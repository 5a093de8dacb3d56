//! Line-based game commands
//!
//! Reads commands from any async line source (stdin in practice) and
//! publishes the resulting [`GameState`] through a watch channel. The render
//! step only ever sees copies of the state.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;

use super::GameState;
use crate::ticker::StopHandle;

/// A single operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Use up one turn (empty line or `turn`)
    Turn,
    /// Restore every turn
    Reset,
    /// Stop the ticker and exit
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "" | "turn" | "t" => Some(Command::Turn),
            "reset" | "r" => Some(Command::Reset),
            "quit" | "q" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Apply commands from `reader` until it is exhausted or `quit` is read
pub async fn read_commands<R>(
    reader: R,
    state: watch::Sender<GameState>,
    stop: StopHandle,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while !stop.is_stopped() {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match Command::parse(&line) {
            Some(Command::Turn) => {
                state.send_modify(GameState::take_turn);
                let current = *state.borrow();
                if current.is_over() {
                    log::info!("No turns left, send reset to play again");
                } else {
                    log::info!("Turns left: {}", current.turns_left);
                }
            }
            Some(Command::Reset) => {
                state.send_modify(GameState::reset);
                log::info!("Game reset, {} turns", state.borrow().turns_left);
            }
            Some(Command::Quit) => {
                log::info!("Quit requested");
                stop.stop();
                break;
            }
            None => log::warn!("Unknown command: {:?} (try turn, reset, quit)", line.trim()),
        }
    }

    Ok(())
}
