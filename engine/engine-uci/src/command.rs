//! UCI command parsing.
//!
//! Parsing is purely textual; positions and moves are resolved against the
//! rules adapter by the engine loop, not here.

use std::time::Duration;

use crate::error::UciError;

/// Parameters for the `go` command.
///
/// All fields are optional; a bare `go` uses defaults.
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    /// White's remaining time.
    pub wtime: Option<Duration>,
    /// Black's remaining time.
    pub btime: Option<Duration>,
    /// White's increment per move.
    pub winc: Option<Duration>,
    /// Black's increment per move.
    pub binc: Option<Duration>,
    /// Moves until next time control.
    pub movestogo: Option<u32>,
    /// Search to this depth only.
    pub depth: Option<u8>,
    /// Search for exactly this duration.
    pub movetime: Option<Duration>,
    /// Search this many nodes only.
    pub nodes: Option<u64>,
    /// Search until `stop` (no time limit).
    pub infinite: bool,
    /// Search in pondering mode.
    pub ponder: bool,
}

/// A parsed UCI command.
#[derive(Debug, Clone)]
pub enum Command {
    /// `uci` -- identify the engine.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset engine state.
    UciNewGame,
    /// `setoption name <name> value <value>`.
    SetOption { name: String, value: String },
    /// `position` -- set up a position with optional moves applied.
    /// `fen: None` means the starting position.
    Position { fen: Option<String>, moves: Vec<String> },
    /// `go` -- start searching with given parameters.
    Go(GoParams),
    /// `ponderhit` -- opponent played the expected move during pondering.
    PonderHit,
    /// `stop` -- halt the current search.
    Stop,
    /// `quit` -- exit the engine.
    Quit,
    /// Unrecognized command (silently ignored per UCI spec).
    Unknown(String),
}

/// Parse a single line of UCI input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(Command::Unknown(String::new()));
    }

    match tokens[0] {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "setoption" => parse_setoption(&tokens[1..]),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "ponderhit" => Ok(Command::PonderHit),
        "position" => parse_position(&tokens[1..]),
        "go" => parse_go(&tokens[1..]),
        _ => Ok(Command::Unknown(tokens[0].to_string())),
    }
}

/// Parse the `position` command arguments.
///
/// Supports:
/// - `position startpos [moves m1 m2 ...]`
/// - `position fen <fen-fields> [moves m1 m2 ...]`
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    if tokens.is_empty() {
        return Err(UciError::MalformedPosition);
    }

    let (fen, rest) = if tokens[0] == "startpos" {
        (None, &tokens[1..])
    } else if tokens[0] == "fen" {
        let end = tokens
            .iter()
            .position(|&t| t == "moves")
            .unwrap_or(tokens.len());
        if end <= 1 {
            return Err(UciError::MalformedPosition);
        }
        (Some(tokens[1..end].join(" ")), &tokens[end..])
    } else {
        return Err(UciError::MalformedPosition);
    };

    let moves = if !rest.is_empty() && rest[0] == "moves" {
        rest[1..].iter().map(|t| t.to_string()).collect()
    } else {
        Vec::new()
    };

    Ok(Command::Position { fen, moves })
}

/// Parse `setoption name <name...> value <value...>`.
fn parse_setoption(tokens: &[&str]) -> Result<Command, UciError> {
    if tokens.first() != Some(&"name") {
        return Err(UciError::MalformedSetOption);
    }
    let value_at = tokens.iter().position(|&t| t == "value");
    let (name_end, value) = match value_at {
        Some(i) => (i, tokens[i + 1..].join(" ")),
        None => (tokens.len(), String::new()),
    };
    let name = tokens[1..name_end].join(" ");
    if name.is_empty() {
        return Err(UciError::MalformedSetOption);
    }
    Ok(Command::SetOption { name, value })
}

/// Parse the `go` command arguments.
///
/// Supports: wtime, btime, winc, binc, movestogo, depth, movetime,
/// nodes, infinite, ponder. Unknown tokens are silently skipped.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "wtime" => {
                params.wtime = Some(parse_millis(tokens.get(i + 1), "wtime")?);
                i += 2;
            }
            "btime" => {
                params.btime = Some(parse_millis(tokens.get(i + 1), "btime")?);
                i += 2;
            }
            "winc" => {
                params.winc = Some(parse_millis(tokens.get(i + 1), "winc")?);
                i += 2;
            }
            "binc" => {
                params.binc = Some(parse_millis(tokens.get(i + 1), "binc")?);
                i += 2;
            }
            "movestogo" => {
                params.movestogo = Some(parse_int(tokens.get(i + 1), "movestogo")?);
                i += 2;
            }
            "depth" => {
                params.depth = Some(parse_int(tokens.get(i + 1), "depth")?);
                i += 2;
            }
            "movetime" => {
                params.movetime = Some(parse_millis(tokens.get(i + 1), "movetime")?);
                i += 2;
            }
            "nodes" => {
                params.nodes = Some(parse_int(tokens.get(i + 1), "nodes")?);
                i += 2;
            }
            "infinite" => {
                params.infinite = true;
                i += 1;
            }
            "ponder" => {
                params.ponder = true;
                i += 1;
            }
            _ => {
                // Unknown token -- skip per UCI convention
                i += 1;
            }
        }
    }

    Ok(Command::Go(params))
}

/// Parse a millisecond value from a token.
fn parse_millis(token: Option<&&str>, param: &str) -> Result<Duration, UciError> {
    let value = token.ok_or_else(|| UciError::MissingGoValue {
        param: param.to_string(),
    })?;
    let ms: u64 = value.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })?;
    Ok(Duration::from_millis(ms))
}

/// Parse an integer value from a token.
fn parse_int<T: std::str::FromStr>(token: Option<&&str>, param: &str) -> Result<T, UciError> {
    let value = token.ok_or_else(|| UciError::MissingGoValue {
        param: param.to_string(),
    })?;
    value.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}
