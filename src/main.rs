use clap::Parser;
use env_logger::Env;
use log::{error, info};
use std::error::Error as _;
use std::io;
use std::process::ExitCode;

use tile_restructure::cli::{Args, Command};
use tile_restructure::pipeline::{run_metrics, run_sample, run_split};
use tile_restructure::{Result, Sampler};

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Split(split) => {
            let mut sampler = Sampler::new(split.sample, split.seed)?;
            run_split(&split, &mut sampler)?;
        }
        Command::Metrics(metrics) => {
            let mut sampler = Sampler::new(metrics.sample, metrics.seed)?;
            let stdout = io::stdout();
            let (summary, _) = run_metrics(&metrics, &mut sampler, &mut stdout.lock())?;
            info!(
                "processed {} of {} captures",
                summary.processed, summary.seen
            );
        }
        Command::Sample(sample) => {
            let mut sampler = Sampler::new(sample.sample, sample.seed)?;
            run_sample(&sample, &mut sampler)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logger
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let mut message = e.to_string();
            let mut source = e.source();
            while let Some(cause) = source {
                message.push_str(&format!(": {}", cause));
                source = cause.source();
            }
            error!("{}", message);
            ExitCode::from(2)
        }
    }
}
