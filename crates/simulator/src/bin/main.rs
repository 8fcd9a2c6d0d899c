//! Derby Simulator CLI
//!
//! Run a single concurrent race or a multi-round tournament.
//!
//! # Example
//!
//! ```bash
//! # One race with the default line-up and live rankings
//! derby-sim race --observer
//!
//! # A shorter race with fixed base speeds
//! derby-sim race --seed 42 --finish 20
//!
//! # Ten rounds with a one second pause between them
//! derby-sim tournament --rounds 10 --pause-ms 1000
//! ```

use clap::{Parser, Subcommand};
use derby_parallel::{Race, RaceConfig, RaceError, RaceOutcome, RankingObserver, TracingSink};
use derby_simulator::{Tournament, TournamentConfig};
use derby_types::tuning::FINISH_DISTANCE;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Derby Simulator
///
/// Participants run as concurrent tasks; the first across the line wins.
#[derive(Parser, Debug)]
#[command(name = "derby-sim")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single race
    Race {
        /// Seed for the participants' base speeds and draws
        #[arg(long)]
        seed: Option<u64>,

        /// Finish distance
        #[arg(long, default_value_t = FINISH_DISTANCE)]
        finish: f64,

        /// Log live rankings while the race runs
        #[arg(long)]
        observer: bool,
    },

    /// Run several races back to back and aggregate the results
    Tournament {
        /// Number of rounds (1-100)
        #[arg(short = 'r', long, default_value = "3")]
        rounds: usize,

        /// Log live rankings during each round
        #[arg(long)]
        observer: bool,

        /// Pause between rounds in milliseconds
        #[arg(long, default_value = "0")]
        pause_ms: u64,

        /// Base seed; each round derives its own seed from it
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("warn,derby_simulator=info,derby_parallel=info")
        }))
        .init();

    let args = Args::parse();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Failed to create tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        Command::Race {
            seed,
            finish,
            observer,
        } => {
            let mut config = RaceConfig::new().with_finish_distance(finish);
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            rt.block_on(run_race(config, observer))
                .map(|outcome| print_race_summary(&outcome))
                .map_err(|e| e.to_string())
        }
        Command::Tournament {
            rounds,
            observer,
            pause_ms,
            seed,
        } => {
            let mut race = RaceConfig::new();
            if let Some(seed) = seed {
                race = race.with_seed(seed);
            }
            let config = TournamentConfig::new(rounds, observer)
                .with_inter_round_pause(Duration::from_millis(pause_ms))
                .with_race(race);

            info!(rounds, observer, pause_ms, "Starting tournament");

            rt.block_on(async { Tournament::new(config)?.run().await })
                .map(|report| report.print_summary())
                .map_err(|e| e.to_string())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Simulation failed");
            ExitCode::FAILURE
        }
    }
}

async fn run_race(config: RaceConfig, observer: bool) -> Result<RaceOutcome, RaceError> {
    let mut race = Race::new(config)?;
    let track = race.initialize()?;
    race.start()?;

    let observer = observer.then(|| RankingObserver::start_default(track, TracingSink));

    // Ctrl-C stops the participants cleanly and reports Interrupted
    let result = race.monitor_until(tokio::signal::ctrl_c()).await;

    if let Some(observer) = observer {
        observer.stop().await;
    }
    result
}

fn print_race_summary(outcome: &RaceOutcome) {
    println!("\n═══════════════════════════════════════════");
    println!("               RACE REPORT                 ");
    println!("═══════════════════════════════════════════");
    println!();
    println!(
        "Winner: {} {} ({:.2} km/h)",
        outcome.winner.glyph(),
        outcome.winner.name,
        outcome.winner.base_speed
    );
    println!();
    println!("Final ranking:");
    for (place, entry) in outcome.ranking.iter().enumerate() {
        println!(
            "  {}. {} {:<12} {:>6.2}",
            place + 1,
            entry.glyph(),
            entry.name,
            entry.position
        );
    }

    let warnings = outcome.warnings();
    if !warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &warnings {
            println!("  {}", warning);
        }
    }

    println!();
    println!(
        "Duration: {:.2}s (seed {})",
        outcome.elapsed.as_secs_f64(),
        outcome.seed
    );
    println!("═══════════════════════════════════════════\n");
}
