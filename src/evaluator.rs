use crate::dataset::Dataset;
use std::fmt;

/// Counts of right and wrong predictions over a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub correct: usize,
    pub incorrect: usize,
    /// Rows dropped at load time or left without a prediction.
    pub skipped: usize,
}

impl Evaluation {
    /// Compares each row's prediction against its label. Rows missing either one are
    /// counted as skipped, along with whatever the loader already dropped.
    pub fn of(dataset: &Dataset) -> Self {
        dataset.iter().fold(
            Evaluation {
                skipped: dataset.skipped,
                ..Default::default()
            },
            |mut eval, observation| {
                match (observation.label, observation.prediction) {
                    (Some(label), Some(prediction)) if label == prediction => eval.correct += 1,
                    (Some(_), Some(_)) => eval.incorrect += 1,
                    _ => eval.skipped += 1,
                }
                eval
            },
        )
    }

    pub fn total(&self) -> usize {
        self.correct + self.incorrect
    }

    /// Human readable summary. `suffix` is appended to each line, e.g. " for the new dataset".
    pub fn report<'a>(&'a self, suffix: &'a str) -> Report<'a> {
        Report { eval: self, suffix }
    }
}

pub struct Report<'a> {
    eval: &'a Evaluation,
    suffix: &'a str,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of correct predictions{}: {}", self.suffix, self.eval.correct)?;
        write!(f, "Number of incorrect predictions{}: {}", self.suffix, self.eval.incorrect)?;
        if self.eval.skipped > 0 {
            write!(f, "\nNumber of skipped rows{}: {}", self.suffix, self.eval.skipped)?;
        }
        Ok(())
    }
}
