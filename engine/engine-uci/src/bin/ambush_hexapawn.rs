//! UCI console over the bundled hexapawn reference game.
//!
//! Useful for driving the full engine stack end to end without a chess
//! rules adapter. `ambush-hexapawn` speaks UCI on stdin/stdout;
//! `ambush-hexapawn sim` opens the similarity test console instead.
//! Logs go to stderr so the protocol stream stays clean.

use std::io;

use anyhow::Result;
use engine_uci::{search_config, SimilarityTester, UciEngine};
use games_hexapawn::Hexapawn;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = engine_config::load_config();

    let filter = EnvFilter::try_new(&config.common.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if std::env::args().nth(1).as_deref() == Some("sim") {
        info!("similarity console starting");
        let tester = SimilarityTester::new(Hexapawn::standard(), &config.simtest.data_dir);
        let stdin = io::stdin();
        tester.run(stdin.lock(), &mut io::stdout())?;
        return Ok(());
    }

    info!("ambush starting");
    let mut engine = UciEngine::new(
        Hexapawn::standard(),
        search_config(&config),
        io::stdout(),
    );
    engine.run()?;
    Ok(())
}
