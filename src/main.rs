use std::{
    fmt::Display,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aoc2024::{load_input, Solution, ALL_SOLUTIONS, DEFAULT_INPUT_DIR};

#[derive(Parser, Debug)]
#[command(about = "Advent of Code 2024 solutions")]
struct Args {
    /// Days to run; all available days when omitted
    days: Vec<usize>,

    /// Directory holding one `<day>.txt` input file per day
    #[arg(long, env = "AOC_INPUT_DIR", default_value = DEFAULT_INPUT_DIR)]
    input_dir: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let days = if args.days.is_empty() {
        (1..=ALL_SOLUTIONS.len()).collect()
    } else {
        args.days
    };

    let mut total = Duration::default();
    for n in days {
        let Some(&day) = n.checked_sub(1).and_then(|i| ALL_SOLUTIONS.get(i)) else {
            bail!("no solution available for day {}", n);
        };
        let input = load_input(&args.input_dir, n)?;
        total += execute_day(n, day, &input)?;
    }
    println!("Total processing time: {}", format_duration(total));
    Ok(())
}

fn format_duration(dur: Duration) -> String {
    if dur.as_millis() != 0 {
        format!("{} ms", dur.as_millis())
    } else {
        format!("{} us", dur.as_micros())
    }
}

fn execute_day(n: usize, f: Solution, input: &str) -> Result<Duration> {
    println!("Day {}:", n);
    info!(day = n, bytes = input.len(), "running solution");

    let start = Instant::now();
    let (part1, part2) = f(input)?;
    let elapsed = start.elapsed();

    print_part(1, part1);
    print_part(2, part2);
    println!("  Finished in {}", format_duration(elapsed));
    println!("---------------------");
    Ok(elapsed)
}

fn print_part(part: usize, answer: impl Display) {
    println!("  Part {}: {}", part, answer);
}
