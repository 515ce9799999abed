use clap::{Parser, Subcommand};
use shumai_report::baseline::DEFAULT_BASELINE;
use shumai_report::input::collect_result_files;
use shumai_report::{pipeline, OutputFormat, ReportConfig, ReportError};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Subcommand, Debug)]
enum Command {
    /// Comparison tables: memory, throughput, latency, perf counters, disk I/O.
    Table {
        /// Result files or directories (walked for `*.json`).
        #[arg(value_name = "PATH", num_args = 1.., required = true)]
        input: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },

    /// Per-operation costs (instructions, cycles, cache/branch misses per op).
    PerOp {
        #[arg(value_name = "PATH", num_args = 1.., required = true)]
        input: Vec<PathBuf>,
    },

    /// github-action-benchmark entries (`customBiggerIsBetter`, QPS).
    Convert {
        #[arg(value_name = "PATH", num_args = 1.., required = true)]
        input: Vec<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "shumai-report")]
#[command(about = "Comparison reports from shumai benchmark result files")]
struct Args {
    /// Reference implementation for relative comparisons.
    #[arg(long, default_value = DEFAULT_BASELINE, global = true)]
    baseline: String,

    /// Where to write the output. If omitted, prints to stdout.
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

fn run(args: Args) -> Result<String, ReportError> {
    match args.cmd {
        Command::Table { input, format } => {
            let config = ReportConfig {
                baseline: args.baseline,
                output: format,
            };
            pipeline::generate_report(&collect_result_files(&input), &config)
        }
        Command::PerOp { input } => pipeline::generate_per_op(&collect_result_files(&input)),
        Command::Convert { input } => {
            let entries = pipeline::generate_bench_action(&collect_result_files(&input))?;
            Ok(serde_json::to_string_pretty(&entries)?)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let out = args.out.clone();

    let text = match run(args) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = out {
        if let Err(e) = fs::write(&path, text) {
            tracing::error!(path = %path.display(), "failed to write output: {e}");
            return ExitCode::FAILURE;
        }
    } else {
        println!("{text}");
    }
    ExitCode::SUCCESS
}
