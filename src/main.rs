mod bayes;
mod dataset;
mod error;
mod estimator;
mod evaluator;
mod gaussian;

use anyhow::{Context, Result};
use bayes::NaiveBayesClassifier;
use clap::{ArgAction, Parser};
use dataset::{Dataset, RowPolicy};
use evaluator::Evaluation;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Classify detections with a Gaussian naive Bayes model over amplitude and distance.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Labeled training data, also used for self-evaluation
    #[arg(default_value = "detection_data.csv")]
    training: PathBuf,

    /// Held-out data to evaluate the trained model on
    #[arg(default_value = "detection_data_extra.csv")]
    extra: PathBuf,

    /// Write per-row predictions for the training data to this CSV file
    #[arg(long, value_name = "PATH")]
    train_predictions: Option<PathBuf>,

    /// Write per-row predictions for the held-out data to this CSV file
    #[arg(long, value_name = "PATH")]
    extra_predictions: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let training = Dataset::from_path(&cli.training, RowPolicy::Strict)
        .with_context(|| format!("failed to load training data {}", cli.training.display()))?;
    let classifier = NaiveBayesClassifier::fit(&training)
        .with_context(|| format!("failed to estimate model from {}", cli.training.display()))?;

    let eval = evaluate(&classifier, training, cli.train_predictions.as_deref())?;
    println!("{}\n", eval.report(""));

    let extra = Dataset::from_path(&cli.extra, RowPolicy::Skip)
        .with_context(|| format!("failed to load {}", cli.extra.display()))?;
    let eval = evaluate(&classifier, extra, cli.extra_predictions.as_deref())?;
    println!("{}", eval.report(" for the new dataset"));

    Ok(())
}

/// Classifies every row, optionally writes the predictions out, and tallies the results.
fn evaluate(
    classifier: &NaiveBayesClassifier,
    mut dataset: Dataset,
    predictions_out: Option<&Path>,
) -> Result<Evaluation> {
    classifier.label_dataset(&mut dataset);

    if let Some(outpath) = predictions_out {
        bayes::write_predictions(&dataset, outpath)?;
    }

    let eval = Evaluation::of(&dataset);
    info!(
        correct = eval.correct,
        incorrect = eval.incorrect,
        skipped = eval.skipped,
        total = eval.total(),
        "evaluated dataset"
    );
    Ok(eval)
}
