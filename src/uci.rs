//! UCI protocol front-end.
//!
//! A synchronous stdio loop: parse positions, forward time/depth-bounded
//! requests to the coordinator, print its answers. `ucinewgame` resets the
//! position and search state but keeps loaded external resources, and a
//! malformed command leaves the current position untouched.

use std::io::{self, BufRead, Write};

use crate::board::position::Position;
use crate::book::OpeningBook;
use crate::engine::coordinator::{Coordinator, GoParams};
use crate::errors::EngineError;
use crate::movegen::generator::generate_legal;
use crate::util::move_text::{move_to_text, parse_move_text};

const ENGINE_NAME: &str = "Sloe Chess";
const ENGINE_AUTHOR: &str = "the sloe_chess authors";

pub fn run_stdio_loop() -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut state = UciState::new();

    for line in stdin.lock().lines() {
        let line = line?;
        let quit = state.handle_command(&line, &mut stdout)?;
        stdout.flush()?;
        if quit {
            break;
        }
    }

    Ok(())
}

struct UciState {
    position: Position,
    coordinator: Coordinator,
}

impl UciState {
    fn new() -> Self {
        Self {
            position: Position::new(),
            coordinator: Coordinator::new().with_book(OpeningBook::load_default()),
        }
    }

    fn handle_command(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }

        let mut parts = trimmed.split_whitespace();
        let command = parts.next().unwrap_or_default();

        match command {
            "uci" => {
                writeln!(out, "id name {ENGINE_NAME}")?;
                writeln!(out, "id author {ENGINE_AUTHOR}")?;
                writeln!(out, "option name Hash type spin default 64 min 1 max 4096")?;
                writeln!(out, "option name OwnBook type check default true")?;
                writeln!(
                    out,
                    "option name FixedDepth type spin default 0 min 0 max 64"
                )?;
                writeln!(
                    out,
                    "option name TimeStrategy type combo default adaptive var adaptive var fraction20"
                )?;
                writeln!(out, "uciok")?;
            }
            "isready" => {
                writeln!(out, "readyok")?;
            }
            "setoption" => {
                if let Err(err) = self.handle_setoption(trimmed) {
                    writeln!(out, "info string setoption error: {err}")?;
                }
            }
            "ucinewgame" => {
                self.position = Position::new();
                self.coordinator.new_game();
            }
            "position" => {
                if let Err(err) = self.handle_position(trimmed) {
                    writeln!(out, "info string position error: {err}")?;
                }
            }
            "go" => {
                let params = parse_go_params(trimmed);
                let output = self.coordinator.choose_move(&self.position, &params);
                for info in &output.info_lines {
                    writeln!(out, "{info}")?;
                }
                match output.best_move {
                    Some(mv) => writeln!(out, "bestmove {}", move_to_text(mv))?,
                    None => writeln!(out, "bestmove 0000")?,
                }
            }
            "stop" | "ponderhit" => {
                // Search runs synchronously inside `go`; nothing to stop.
            }
            "quit" => return Ok(true),
            _ => {
                // Unknown commands are ignored for UCI compatibility.
            }
        }

        Ok(false)
    }

    fn handle_setoption(&mut self, line: &str) -> Result<(), String> {
        let mut tokens = line.split_whitespace();
        let _ = tokens.next(); // setoption

        let mut name_tokens = Vec::new();
        let mut value_tokens = Vec::new();
        let mut section = "";

        for token in tokens {
            match token {
                "name" => section = "name",
                "value" => section = "value",
                _ if section == "name" => name_tokens.push(token),
                _ if section == "value" => value_tokens.push(token),
                _ => {}
            }
        }

        self.coordinator
            .set_option(&name_tokens.join(" "), &value_tokens.join(" "))
    }

    /// `position [startpos | fen <fen>] [moves <m1> <m2> ...]`
    ///
    /// The new position is built on the side and committed only when every
    /// part parses, so a bad command cannot corrupt the current game.
    fn handle_position(&mut self, line: &str) -> Result<(), EngineError> {
        let rest = line.trim_start_matches("position").trim();

        let (mut position, moves_text) = if let Some(after) = rest.strip_prefix("startpos") {
            (Position::new(), after.trim())
        } else if let Some(after) = rest.strip_prefix("fen") {
            let after = after.trim();
            let (fen_part, moves_part) = match after.find(" moves") {
                Some(index) => (&after[..index], after[index..].trim()),
                None => (after, ""),
            };
            (Position::from_fen(fen_part.trim())?, moves_part)
        } else {
            return Err(EngineError::InvalidMoveText(format!(
                "bad position command: {line}"
            )));
        };

        let moves_text = moves_text.trim_start_matches("moves").trim();
        if !moves_text.is_empty() {
            for token in moves_text.split_whitespace() {
                let mv = parse_move_text(token, &position)?;
                if !generate_legal(&mut position).contains(&mv) {
                    return Err(EngineError::IllegalMove(token.to_owned()));
                }
                position.make_move(mv);
            }
        }

        self.position = position;
        Ok(())
    }
}

fn parse_go_params(line: &str) -> GoParams {
    let mut params = GoParams::default();
    let mut tokens = line.split_whitespace().peekable();
    let _ = tokens.next(); // go

    while let Some(token) = tokens.next() {
        let mut next_u64 = || tokens.peek().and_then(|value| value.parse::<u64>().ok());
        match token {
            "depth" => {
                if let Some(value) = next_u64() {
                    params.depth = Some(value.min(64) as u8);
                }
            }
            "movetime" => params.movetime_ms = next_u64(),
            "wtime" => params.wtime_ms = next_u64(),
            "btime" => params.btime_ms = next_u64(),
            "winc" => params.winc_ms = next_u64(),
            "binc" => params.binc_ms = next_u64(),
            "movestogo" => {
                if let Some(value) = next_u64() {
                    params.movestogo = Some(value.min(u64::from(u16::MAX)) as u16);
                }
            }
            _ => {}
        }
    }

    params
}
