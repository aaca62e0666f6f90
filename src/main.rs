//! Command-line benchmark driver.
//!
//! Reads whitespace-separated values (from a file, stdin, or a seeded random
//! generator), benchmarks the selected operation, and prints a one-line
//! report with throughput, the hardware exception label and, when built with
//! the `mpfr` feature, worst-case error against MPFR references.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use flopbench::error::invalid_argument;
use flopbench::{
    accuracy, bench, Error, InputBuffer, Operation, Result, ResultBuffer, RoundMode, Width,
    DEFAULT_ALIGNMENT, DEFAULT_ERROR_PRECISION,
};

/// Benchmark throughput and accuracy of elementary math functions.
#[derive(Parser, Debug)]
#[command(name = "flopbench", version, about)]
struct Cli {
    /// Operation to benchmark (e.g. `cos`, `expf`, `lgamma`).
    operation: String,

    /// Read input values from this file instead of standard input.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Generate N random input values in [0, 1) instead of reading any.
    #[arg(long, value_name = "N", conflicts_with = "file")]
    random: Option<usize>,

    /// Seed for --random.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Rounding mode: downward, tonearest, towardzero or upward.
    #[arg(long, default_value = "tonearest")]
    rounding_mode: RoundMode,

    /// Buffer alignment in bytes (power of two).
    #[arg(long, default_value_t = DEFAULT_ALIGNMENT)]
    alignment: usize,

    /// Minimum number of repetitions of the whole buffer.
    #[arg(long, default_value_t = 1)]
    repeat: u64,

    /// Minimum total number of elementary operations.
    #[arg(long, default_value_t = 0)]
    min_ops: u64,

    /// Working precision for error evaluation, in bits.
    #[arg(long, default_value_t = DEFAULT_ERROR_PRECISION)]
    error_precision: u32,

    /// Field width when dumping values.
    #[arg(long, default_value_t = 12)]
    output_width: usize,

    /// Number of decimals when dumping values.
    #[arg(long, default_value_t = 6)]
    output_precision: usize,

    /// Increase verbosity (-v dumps the result buffer).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("flopbench: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let op = Operation::resolve(&cli.operation)?;
    flopbench::set_round_mode(cli.rounding_mode)?;

    let input = read_input(cli, op)?;
    let mut result = ResultBuffer::for_operation(op, input.len(), cli.alignment)?;

    let report = bench::run(op, &input, &mut result, cli.repeat, cli.min_ops)?;
    let throughput = report.num_ops as f64 / report.seconds / 1e6;

    match accuracy::evaluate(op, &input, &result, cli.rounding_mode, cli.error_precision) {
        Ok(metrics) => println!(
            "{}: {:.6} seconds {} repetitions {} ops {:.6} Mops/s exceptions: {} \
             absolute error: {:e} relative error: {:e} (exceptions: {})",
            op.name(),
            report.seconds,
            report.repetitions,
            report.num_ops,
            throughput,
            result.fexcept.label(),
            metrics.max_abs_error,
            metrics.max_rel_error,
            metrics.exceptions,
        ),
        Err(Error::Unsupported) => println!(
            "{}: {:.6} seconds {} repetitions {} ops {:.6} Mops/s exceptions: {}",
            op.name(),
            report.seconds,
            report.repetitions,
            report.num_ops,
            throughput,
            result.fexcept.label(),
        ),
        Err(err) => return Err(err),
    }

    if cli.verbose > 0 {
        dump(&result, cli.output_width, cli.output_precision);
    }

    Ok(())
}

/// Builds the input buffer for `op` from the configured source.
fn read_input(cli: &Cli, op: Operation) -> Result<InputBuffer> {
    if let Some(n) = cli.random {
        let mut rng = StdRng::seed_from_u64(cli.seed);
        return match op.width() {
            Width::Narrow => {
                let values: Vec<f32> = (0..n).map(|_| rng.random::<f32>()).collect();
                InputBuffer::from_f32s(&values, cli.alignment)
            }
            Width::Wide => {
                let values: Vec<f64> = (0..n).map(|_| rng.random::<f64>()).collect();
                InputBuffer::from_f64s(&values, cli.alignment)
            }
        };
    }

    let mut text = String::new();
    match &cli.file {
        Some(path) => {
            let file = File::open(path).map_err(|err| {
                invalid_argument(format!("{}: {}", path.display(), err))
            })?;
            BufReader::new(file)
                .read_to_string(&mut text)
                .map_err(|err| invalid_argument(format!("{}: {}", path.display(), err)))?;
        }
        None => {
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| invalid_argument(format!("stdin: {}", err)))?;
        }
    }

    match op.width() {
        Width::Narrow => InputBuffer::from_f32s(&parse_values(&text)?, cli.alignment),
        Width::Wide => InputBuffer::from_f64s(&parse_values(&text)?, cli.alignment),
    }
}

/// Parses whitespace-separated float values.
fn parse_values<T: FromStr>(text: &str) -> Result<Vec<T>> {
    text.split_whitespace()
        .map(|token| {
            token
                .parse::<T>()
                .map_err(|_| invalid_argument(format!("invalid value `{}`", token)))
        })
        .collect()
}

/// Dumps the result buffer to standard error, one formatted value per
/// column.
fn dump(result: &ResultBuffer, width: usize, precision: usize) {
    let formatted: Vec<String> = match (result.as_f32s(), result.as_f64s()) {
        (Some(values), _) => values
            .iter()
            .map(|v| format!("{:>w$.p$}", v, w = width, p = precision))
            .collect(),
        (_, Some(values)) => values
            .iter()
            .map(|v| format!("{:>w$.p$}", v, w = width, p = precision))
            .collect(),
        _ => Vec::new(),
    };
    eprintln!("{}", formatted.join(" "));
}
