use anyhow::{Context, Result, bail};
use clap::Parser;
use sokorun::direction::normalize_moves;
use sokorun::executor::{Replay, ReplayStatus, replay};
use sokorun::game::GameState;
use sokorun::level::Level;
use sokorun::logging;
use std::fs;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "sokorun")]
#[command(about = "Replay candidate move sequences against a Sokoban level", long_about = None)]
struct Args {
    /// Path to the level file
    #[arg(value_name = "FILE")]
    level_file: String,

    /// Inline candidate sequence: either plain UDLR letters (e.g. "RRUU"),
    /// or free-form text from which directions are extracted
    #[arg(value_name = "MOVES")]
    moves: Option<String>,

    /// File of candidate sequences, one per line, tried in order
    #[arg(short, long, value_name = "FILE", conflicts_with = "moves")]
    moves_file: Option<String>,

    /// Maximum number of candidate sequences to attempt
    #[arg(short = 'n', long, default_value = "1")]
    max_iterations: usize,

    /// Print the board after every accepted move
    #[arg(short, long)]
    show_steps: bool,

    /// Print the planner-facing view of the initial state and exit
    #[arg(long)]
    describe: bool,

    /// Write the initial state and every visited state to a file
    #[arg(long, value_name = "FILE")]
    transcript: Option<String>,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let level = Arc::new(
        Level::from_file(&args.level_file)
            .with_context(|| format!("failed to load level {}", args.level_file))?,
    );
    let initial = GameState::new(Arc::clone(&level));

    if args.describe {
        println!("{}", initial.serialize());
        println!();
        println!("{}", initial.describe());
        return Ok(());
    }

    let candidates: Vec<String> = if let Some(path) = &args.moves_file {
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read moves file {}", path))?;
        contents.lines().map(str::to_owned).collect()
    } else if let Some(moves) = &args.moves {
        vec![moves.clone()]
    } else {
        bail!("provide a move sequence or --moves-file");
    };

    // Each attempt runs against a fresh copy of the initial state.
    let mut last: Option<(GameState, Replay)> = None;
    for (attempt, candidate) in candidates.iter().take(args.max_iterations).enumerate() {
        let sequence = normalize_moves(candidate);
        let mut state = GameState::new(Arc::clone(&level));
        let result = replay(&mut state, &sequence);

        info!(attempt = attempt + 1, status = %result.status, "attempt finished");
        println!(
            "attempt: {:<3}  status: {:<8}  moves: {}",
            attempt + 1,
            result.status,
            result.moves
        );

        let solved = result.status == ReplayStatus::Success;
        last = Some((state, result));
        if solved {
            break;
        }
    }

    let Some((state, result)) = last else {
        bail!("no candidate sequences to attempt");
    };

    if args.show_steps {
        for (i, snapshot) in result.visited.iter().enumerate() {
            println!("\nstep {}:\n{}", i + 1, snapshot);
        }
    }

    println!("\nfinal position:\n{}", state.serialize());

    if let Some(path) = &args.transcript {
        let mut transcript = String::new();
        transcript.push_str(&initial.serialize());
        transcript.push_str("\n\n");
        for snapshot in &result.visited {
            transcript.push_str(snapshot);
            transcript.push_str("\n\n");
        }
        fs::write(path, transcript)
            .with_context(|| format!("failed to write transcript {}", path))?;
    }

    Ok(())
}
