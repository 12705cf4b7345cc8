//! CLI tool to run a verb chain over DKVP records.
//!
//! Usage:
//!   record-chain [options] <verb> [verb-flags] [then <verb> [verb-flags]]...
//!
//! Reads from `--file` inputs (or stdin) and writes to `--output` (or stdout).

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use record_chain::dkvp::{self, SinkSummary};
use record_chain::logging::init_tracing;
use record_chain::{
    DEFAULT_QUEUE_CAPACITY, PipelineBuilder, PipelineConfig, PipelineError, Result, StageSummary,
    queue, verbs,
};
use tracing::info;

/// Run a chain of record verbs, one thread per verb.
///
/// Verbs are separated by `then`, e.g.
/// `record-chain -f in.dkvp clean-whitespace -v then sort -nr x then head -n 5`.
#[derive(Parser)]
#[command(name = "record-chain")]
struct Cli {
    /// Input DKVP file; repeat for several (default: stdin)
    #[arg(short, long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,

    /// Write output to file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Envelopes buffered between adjacent stages
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Show per-stage record counts on stderr
    #[arg(long)]
    verbose: bool,

    /// Verb chain
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "VERB"
    )]
    chain: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing("warn");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("record-chain: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Verb flags are checked before any thread starts.
    let stages = verbs::parse_chain(&cli.chain)?;
    let config = PipelineConfig {
        queue_capacity: cli.queue_capacity,
    };

    let (in_tx, in_rx) = queue(config.queue_capacity.max(1));
    let (out_tx, out_rx) = queue(config.queue_capacity.max(1));
    let running = PipelineBuilder::new()
        .config(config)
        .stages(stages)
        .spawn(in_rx, out_tx)?;
    let reader = dkvp::spawn_reader(cli.files.clone(), in_tx)?;

    let sink = match &cli.output {
        Some(path) => {
            create_parent_dir(path)?;
            let mut writer = BufWriter::new(File::create(path)?);
            dkvp::write_stream(&out_rx, &mut writer)
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            dkvp::write_stream(&out_rx, &mut writer)
        }
    };
    // Unblock every stage if the writer stopped early.
    drop(out_rx);

    let read = reader.join().unwrap_or(Err(PipelineError::RunnerPanicked {
        stage: "dkvp-reader".to_string(),
        index: 0,
    }));
    let stage_summaries = running.join();

    let (stage_summaries, input_count, SinkSummary { records, errors }) =
        settle(stage_summaries, read, sink)?;

    if cli.verbose {
        for s in &stage_summaries {
            eprintln!(
                "Stage {} {:<18} {} in -> {} out ({} errors)",
                s.index, s.name, s.records_in, s.records_out, s.errors
            );
        }
        eprintln!("Records:  {input_count} in -> {records} out, {errors} errors");
    }
    info!(input = input_count, output = records, errors, "run complete");
    Ok(())
}

/// Pick the error to report when several ends of the pipeline failed.
///
/// A panicked stage explains the reader's and writer's disconnects; a failed
/// write explains the stages' closed outputs.
fn settle(
    stages: Result<Vec<StageSummary>>,
    read: Result<u64>,
    sink: Result<SinkSummary>,
) -> Result<(Vec<StageSummary>, u64, SinkSummary)> {
    if let Err(e @ PipelineError::RunnerPanicked { .. }) = stages {
        return Err(e);
    }
    let sink = sink?;
    let read = read?;
    Ok((stages?, read, sink))
}

fn create_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
