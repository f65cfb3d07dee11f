//! Event-driven UCI engine loop.
//!
//! A reader thread turns stdin lines into parsed commands on a channel;
//! the engine processes them on its own thread. While a search runs, the
//! same channel is polled non-blocking by the search driver, so `stop`,
//! `ponderhit` and `quit` are honored at the next poll and every other
//! mid-search command is dropped.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use engine_core::{Color, Rules};
use mcts::{SearchConfig, SearchLimits, SearchSignal, Searcher, SignalSource};
use tracing::{debug, info, warn};

use crate::command::{parse_command, Command, GoParams};
use crate::error::UciError;

/// Adapter: a command channel acts as the search's signal source.
struct ChannelSignals<'a> {
    rx: &'a Receiver<Command>,
}

impl SignalSource for ChannelSignals<'_> {
    fn poll_signal(&mut self) -> Option<SearchSignal> {
        loop {
            match self.rx.try_recv() {
                Ok(Command::Stop) => return Some(SearchSignal::Stop),
                Ok(Command::PonderHit) => return Some(SearchSignal::PonderHit),
                Ok(Command::Quit) => return Some(SearchSignal::Quit),
                // Any other command arriving mid-search is dropped.
                Ok(other) => {
                    debug!(?other, "command ignored during search");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }
}

/// The UCI engine: current position, searcher and output writer.
pub struct UciEngine<R: Rules, W: Write> {
    rules: R,
    out: W,
    position: R::Position,
    searcher: Searcher<R>,
    config: SearchConfig,
}

impl<R: Rules, W: Write> UciEngine<R, W> {
    /// Create an engine at the starting position.
    pub fn new(rules: R, config: SearchConfig, out: W) -> Self {
        let position = rules.startpos();
        Self {
            searcher: Searcher::new(config.clone()),
            config,
            rules,
            out,
            position,
        }
    }

    /// Consume the engine and hand back its writer.
    pub fn into_writer(self) -> W {
        self.out
    }

    /// Run the engine against stdin until `quit` or input closes.
    pub fn run(&mut self) -> Result<(), UciError> {
        let (tx, rx) = std::sync::mpsc::channel();
        spawn_reader(tx);
        self.run_loop(&rx)
    }

    /// Process commands from `rx` until `quit` or the channel closes.
    pub fn run_loop(&mut self, rx: &Receiver<Command>) -> Result<(), UciError> {
        while let Ok(command) = rx.recv() {
            if !self.handle(command, rx)? {
                break;
            }
        }
        info!("ambush shutting down");
        Ok(())
    }

    /// Handle one command; returns false when the loop should end.
    fn handle(&mut self, command: Command, rx: &Receiver<Command>) -> Result<bool, UciError> {
        match command {
            Command::Uci => {
                writeln!(self.out, "id name ambush")?;
                writeln!(self.out, "id author the ambush developers")?;
                writeln!(
                    self.out,
                    "option name MultiPV type spin default 1 min 1 max 64"
                )?;
                writeln!(self.out, "uciok")?;
            }
            Command::IsReady => writeln!(self.out, "readyok")?,
            Command::UciNewGame => {
                self.position = self.rules.startpos();
                // A fresh game invalidates the per-side root memory.
                self.searcher = Searcher::new(self.config.clone());
            }
            Command::SetOption { name, value } => self.handle_setoption(&name, &value),
            Command::Position { fen, moves } => {
                // A bad position command never kills the session; the
                // current position simply stays in force.
                if let Err(e) = self.handle_position(fen.as_deref(), &moves) {
                    warn!(error = %e, "position rejected, keeping current position");
                }
            }
            Command::Go(params) => {
                let quit = self.handle_go(&params, rx)?;
                return Ok(!quit);
            }
            Command::Stop | Command::PonderHit => {
                debug!("search control command received while idle, ignoring");
            }
            Command::Quit => return Ok(false),
            Command::Unknown(token) => {
                if !token.is_empty() {
                    debug!(token, "unknown command");
                }
            }
        }
        Ok(true)
    }

    fn handle_setoption(&mut self, name: &str, value: &str) {
        if name.eq_ignore_ascii_case("multipv") {
            match value.parse::<u32>() {
                Ok(n) if (1..=64).contains(&n) => {
                    self.config.multi_pv = n;
                    self.searcher.config_mut().multi_pv = n;
                }
                _ => warn!(value, "invalid MultiPV value"),
            }
        } else {
            warn!(name, "unknown option");
        }
    }

    /// Resolve a `position` command against the rules adapter. The engine
    /// position is only replaced once the whole command has validated.
    fn handle_position(&mut self, fen: Option<&str>, moves: &[String]) -> Result<(), UciError> {
        let mut position = match fen {
            None => self.rules.startpos(),
            Some(fen) => {
                let parsed = self.rules.parse_fen(fen);
                if self.rules.key(&parsed) == 0 {
                    return Err(UciError::InvalidFen {
                        fen: fen.to_string(),
                    });
                }
                parsed
            }
        };

        for text in moves {
            match self.rules.parse_move(&position, text) {
                Some(mv) => self.rules.play(&mut position, mv),
                None => {
                    return Err(UciError::InvalidMove {
                        uci_move: text.clone(),
                    })
                }
            }
        }

        self.position = position;
        Ok(())
    }

    /// Run a search; returns true when a quit arrived during it.
    fn handle_go(&mut self, params: &GoParams, rx: &Receiver<Command>) -> Result<bool, UciError> {
        let limits = limits_from_go(params, self.rules.side_to_move(&self.position));
        let mut signals = ChannelSignals { rx };

        let out = &mut self.out;
        let mut sink = |line: String| {
            // Write errors inside the search are reported once afterwards.
            let _ = writeln!(out, "{line}");
        };

        let report = self.searcher.search(
            &self.rules,
            &self.position,
            &limits,
            &mut signals,
            &mut sink,
        );
        self.out.flush()?;

        debug!(
            iterations = report.iterations,
            similarity = report.similarity,
            quit = report.quit,
            "go finished"
        );
        Ok(report.quit)
    }
}

/// Translate `go` parameters into search limits for the side to move.
///
/// Priority order:
/// 1. `infinite` (without `ponder`) -> unbounded
/// 2. `movetime` -> that exact per-move budget
/// 3. `wtime`/`btime` -> the side's remaining clock
/// 4. bare `go` -> unbounded
///
/// `ponder` carries over into the limits: the budget check stays disabled
/// until `ponderhit`.
pub fn limits_from_go(params: &GoParams, side: Color) -> SearchLimits {
    if params.infinite && !params.ponder {
        return SearchLimits::infinite();
    }

    if let Some(budget) = params.movetime {
        let mut limits = SearchLimits::movetime(budget);
        limits.ponder = params.ponder;
        return limits;
    }

    let remaining = match side {
        Color::White => params.wtime,
        Color::Black => params.btime,
    };
    if let Some(time) = remaining {
        return SearchLimits {
            time,
            infinite: false,
            ponder: params.ponder,
        };
    }

    let mut limits = SearchLimits::infinite();
    limits.ponder = params.ponder;
    limits
}

/// Spawn the stdin reader thread feeding parsed commands into `tx`.
fn spawn_reader(tx: Sender<Command>) {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        let reader = stdin.lock();
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    debug!(cmd = %trimmed, "received UCI command");
                    match parse_command(trimmed) {
                        Ok(command) => {
                            if tx.send(command).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "UCI parse error"),
                    }
                }
                Err(_) => break,
            }
        }
    });
}
