use std::{
    io::{stderr, stdout},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use red_frame_command::{inspect::run_inspect, recurse::run_recurse, unwind::run_unwind};
use red_frame_runtime::frame::AllocatorConfig;

#[derive(Debug, Parser)]
#[command(arg_required_else_help(true))]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Descend into a recursive routine and report frame pool usage.
    Recurse {
        #[arg(long, default_value_t = 16)]
        depth: usize,
        #[arg(long, default_value_t = 2)]
        rounds: usize,
        /// Slot arrays larger than this are never pooled.
        #[arg(long, default_value_t = AllocatorConfig::default().max_pooled_class)]
        max_pooled_class: usize,
        #[arg(long, default_value_t = AllocatorConfig::default().max_per_class)]
        max_per_class: usize,
    },
    /// Unwind an exception through nested blocks.
    Unwind,
    /// Edit frame locals through the write-through proxy.
    Inspect,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(stderr)
        .init();

    let cli = Cli::parse();
    let mut out = stdout();
    let mut err = stderr();
    match cli.command {
        Command::Recurse {
            depth,
            rounds,
            max_pooled_class,
            max_per_class,
        } => run_recurse(
            depth,
            rounds,
            AllocatorConfig {
                max_pooled_class,
                max_per_class,
            },
            &mut out,
            &mut err,
        ),
        Command::Unwind => run_unwind(&mut out, &mut err),
        Command::Inspect => run_inspect(&mut out, &mut err),
    }
}
