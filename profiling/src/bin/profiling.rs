use ndarray::Array3;
use serde::Deserialize;
use serde_jsonlines::json_lines;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tagf1::{f1_report, DivByZeroStrat, Reporter, ScorerConfigBuilder};

use clap::Parser;

#[derive(Deserialize)]
struct Batch {
    predictions: Vec<Vec<Vec<f64>>>,
    targets: Vec<Vec<Vec<f64>>>,
    lengths: Vec<i64>,
}

struct ArrayBatch {
    predictions: Array3<f64>,
    targets: Array3<f64>,
    lengths: Vec<i64>,
}

fn to_array3(nested: Vec<Vec<Vec<f64>>>) -> Result<Array3<f64>, Box<dyn Error>> {
    let batch_size = nested.len();
    let sentence_length = nested.first().map(|s| s.len()).unwrap_or(0);
    let class_size = nested
        .first()
        .and_then(|s| s.first())
        .map(|c| c.len())
        .unwrap_or(0);
    let flat: Vec<f64> = nested.into_iter().flatten().flatten().collect();
    Ok(Array3::from_shape_vec(
        (batch_size, sentence_length, class_size),
        flat,
    )?)
}

fn read_batches<P: AsRef<Path>>(path: P) -> Result<Vec<ArrayBatch>, Box<dyn Error>> {
    let mut batches = Vec::new();
    for batch in json_lines::<Batch, P>(path)? {
        let batch = batch?;
        batches.push(ArrayBatch {
            predictions: to_array3(batch.predictions)?,
            targets: to_array3(batch.targets)?,
            lengths: batch.lengths,
        });
    }
    Ok(batches)
}

#[derive(Debug, Parser)]
struct Args {
    /// JSON lines file, one batch per line.
    #[arg(short, long)]
    input: PathBuf,
    #[arg(short, long)]
    class_size: usize,
    #[arg(short, long, default_value_t = 1)]
    n_samples: u32,
    #[arg(short, long, default_value_t = false)]
    parallel: bool,
    #[arg(short, long, default_value_t = DivByZeroStrat::Propagate.to_string())]
    zero_division: String,
    /// Prints the report of every batch.
    #[arg(short, long, default_value_t = false)]
    report: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = ScorerConfigBuilder::new(args.class_size)
        .parallel(args.parallel)
        .division_by_zero(args.zero_division.parse()?)
        .build()?;
    let batches = read_batches(&args.input)?;
    let mut total_duration = Duration::ZERO;
    let mut reports: Vec<Reporter> = Vec::with_capacity(batches.len());
    for _ in 0..args.n_samples {
        reports.clear();
        for batch in batches.iter() {
            let now = Instant::now();
            let reporter = f1_report(&batch.predictions, &batch.targets, &batch.lengths, &config)?;
            total_duration += now.elapsed();
            reports.push(reporter);
        }
    }
    if args.report {
        for reporter in reports.iter() {
            println!("{}", reporter);
        }
    }
    println!(
        "Total duration: {} with {} samples of {} batches",
        total_duration.as_secs_f64(),
        args.n_samples,
        batches.len()
    );
    Ok(())
}
