use crate::dataset::{Dataset, Feature, Label, Observation};
use crate::error::Result;
use crate::estimator::{self, ModelParameters};
use crate::gaussian;
use anyhow::Context;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

/// Per-class scores for a single row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posterior {
    /// `likelihood(c) * prior(c)` for Detect and No Detect.
    pub joint: [f64; 2],
    /// Normalized posteriors, `None` when both joints underflowed to zero.
    pub posteriors: Option<[f64; 2]>,
}

impl Posterior {
    /// Picks the class with the strictly higher score, falling back to the
    /// unnormalized joints when the evidence could not be normalized.
    /// Ties go to the first label in `Label::ALL`.
    pub fn decide(&self) -> Label {
        let scores = self.posteriors.unwrap_or(self.joint);
        Label::ALL
            .into_iter()
            .zip(scores)
            .fold(
                (Label::ALL[0], f64::NEG_INFINITY),
                |(best, best_score), (label, score)| {
                    if score > best_score {
                        (label, score)
                    } else {
                        (best, best_score)
                    }
                },
            )
            .0
    }
}

/// Gaussian naive Bayes over amplitude and distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaiveBayesClassifier {
    params: ModelParameters,
}

impl NaiveBayesClassifier {
    pub fn new(params: ModelParameters) -> Self {
        NaiveBayesClassifier { params }
    }

    /// Estimates the model from labeled training rows.
    pub fn fit(training: &Dataset) -> Result<Self> {
        Ok(Self::new(estimator::estimate(&training.observations)?))
    }

    /// Product of per-feature densities for one class, features assumed independent.
    fn likelihood(&self, observation: &Observation, label: Label) -> Result<f64> {
        let stats = self.params.stats(label);
        Feature::ALL.iter().try_fold(1.0, |acc, &feature| {
            let feature_stats = stats.feature(feature);
            let density = gaussian::density(
                observation.value(feature),
                feature_stats.mean,
                feature_stats.variance,
            )?;
            Ok(acc * density)
        })
    }

    pub fn posterior(&self, observation: &Observation) -> Result<Posterior> {
        let mut joint = [0.0; 2];
        for (score, label) in joint.iter_mut().zip(Label::ALL) {
            *score = self.likelihood(observation, label)? * self.params.priors.get(label);
        }

        let evidence: f64 = joint.iter().sum();
        let posteriors = if evidence > 0.0 {
            Some(joint.map(|score| score / evidence))
        } else {
            debug!(
                amplitude = observation.amplitude,
                distance = observation.distance,
                "joint likelihoods underflowed, deciding on unnormalized scores"
            );
            None
        };

        Ok(Posterior { joint, posteriors })
    }

    /// Given one row, predicts whether it is a detection. The row's label is ignored.
    pub fn predict_one(&self, observation: &Observation) -> Result<Label> {
        Ok(self.posterior(observation)?.decide())
    }

    /// Classifies every row independently. Output order matches input order.
    pub fn predict(&self, observations: &[Observation]) -> Vec<Result<Label>> {
        observations
            .par_iter()
            .map(|observation| self.predict_one(observation))
            .collect()
    }

    /// Fills in `prediction` on every row. Rows that cannot be classified are
    /// logged and left without a prediction; their count is returned.
    pub fn label_dataset(&self, dataset: &mut Dataset) -> usize {
        let results = self.predict(&dataset.observations);

        let mut failed = 0;
        for (i, (observation, result)) in dataset
            .observations
            .iter_mut()
            .zip(results)
            .enumerate()
        {
            match result {
                Ok(label) => observation.prediction = Some(label),
                Err(err) => {
                    warn!(row = i + 1, error = %err, "could not classify row");
                    observation.prediction = None;
                    failed += 1;
                }
            }
        }

        failed
    }
}

/// Writes one line per row with its features, true label and prediction.
pub fn write_predictions<P: AsRef<Path>>(dataset: &Dataset, outpath: P) -> anyhow::Result<()> {
    let outpath = outpath.as_ref();
    let mut writer = csv::Writer::from_path(outpath)
        .with_context(|| format!("failed to create {}", outpath.display()))?;

    writer.write_record(["ID", "Amplitude", "Distance", "Detection", "Prediction"])?;
    for (i, observation) in dataset.iter().enumerate() {
        writer.write_record([
            (i + 1).to_string(),
            observation.amplitude.to_string(),
            observation.distance.to_string(),
            observation.label.map_or("", Label::as_str).to_string(),
            observation.prediction.map_or("", Label::as_str).to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}
