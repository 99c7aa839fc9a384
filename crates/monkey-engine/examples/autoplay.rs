//! Headless autoplay -- a simple bot stacks blocks until the tower falls.
//!
//! Run with:
//!   cargo run --example autoplay -p monkey-engine -- "?level=2" 42
//!
//! Arguments (all optional): level query string, seed, path of the JSON
//! score file. Set `RUST_LOG=monkey_engine=debug` to watch every event.

use monkey_engine::prelude::*;

/// Give up after ten simulated minutes.
const MAX_TICKS: u64 = 60 * 60 * 10;

/// Drop when the hanging block is this close (horizontally) to the top.
const AIM_TOLERANCE: f64 = 4.0;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let level = Level::from_query(&args.next().unwrap_or_default())?;
    let seed = match args.next() {
        Some(raw) => raw.parse()?,
        None => 1,
    };
    let store_path = args
        .next()
        .unwrap_or_else(|| "monkey-tower-records.json".to_owned());

    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let options = SessionOptions::for_level(level)
        .with_seed(seed)
        .with_date(today);
    let mut session = GameSession::new(options, Box::new(JsonFileStore::new(&store_path)));

    while !session.is_game_over() && session.tick_count() < MAX_TICKS {
        if should_drop(&session) {
            session.request_drop();
        }
        // Raise the shield whenever the tier allows it.
        match session.activate_shield() {
            Ok(()) => tracing::info!(tick = session.tick_count(), "shield raised"),
            Err(ShieldDenied::AlreadyActive | ShieldDenied::Unavailable) => {}
            Err(reason) => tracing::trace!(?reason, "shield not ready"),
        }

        for event in session.tick() {
            match event {
                GameEvent::BlockPlaced { stack_len, .. } => {
                    tracing::debug!(stack_len, "placed");
                }
                GameEvent::RecordBeaten { score, previous } => {
                    tracing::info!(score, previous, "new record");
                }
                GameEvent::GameOver { score } => {
                    tracing::info!(score, ticks = session.tick_count(), "game over");
                }
                _ => {}
            }
        }
    }

    let board = session.board();
    println!(
        "level {} seed {}: score {}, high score {}, final hash {}",
        level.number(),
        seed,
        session.score(),
        board.high_score(),
        session.state_hash()
    );
    for (rank, record) in board.records().iter().enumerate() {
        println!("  {}. {} ({})", rank + 1, record.score, record.date);
    }
    Ok(())
}

/// Drop when the swinging block hangs over the top of the tower (or over the
/// middle of the screen for the first block).
fn should_drop(session: &GameSession) -> bool {
    let Some(current) = session.current_block() else {
        return false;
    };
    if !current.is_hanging() {
        return false;
    }
    let physics = session.physics();
    let Some(block) = physics.transform(current.body) else {
        return false;
    };
    let target_x = session
        .stack()
        .top()
        .and_then(|top| physics.transform(top.body))
        .map_or(session.tuning().world_width / 2.0, |t| t.x);
    (block.x - target_x).abs() <= AIM_TOLERANCE
}
