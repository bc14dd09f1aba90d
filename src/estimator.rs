use crate::dataset::{Feature, Label, Observation, DETECTION};
use crate::error::{BayesError, Result};
use tracing::{info, warn};

/// Mean and unbiased sample variance of one feature within one class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureStats {
    pub mean: f64,
    pub variance: f64,
}

impl FeatureStats {
    /// Computes the arithmetic mean and the (n - 1) sample variance. Needs at least 2 values.
    fn from_values(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let squared_deviations = values
            .iter()
            .fold(0.0, |acc, &value| acc + (value - mean).powi(2));

        FeatureStats {
            mean,
            variance: squared_deviations / (n - 1.0),
        }
    }
}

/// Per-feature statistics for a single class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassStatistics {
    pub amplitude: FeatureStats,
    pub distance: FeatureStats,
}

impl ClassStatistics {
    pub fn feature(&self, feature: Feature) -> FeatureStats {
        match feature {
            Feature::Amplitude => self.amplitude,
            Feature::Distance => self.distance,
        }
    }

    // Each feature is estimated on its own; no covariance is modelled.
    fn from_partition(label: Label, rows: &[&Observation]) -> Result<Self> {
        if rows.len() < 2 {
            return Err(BayesError::InsufficientData {
                label: label.as_str(),
                count: rows.len(),
            });
        }

        let stats_for = |feature: Feature| {
            let values: Vec<f64> = rows.iter().map(|row| row.value(feature)).collect();
            let stats = FeatureStats::from_values(&values);
            if stats.variance == 0.0 {
                warn!(
                    class = %label,
                    feature = feature.column(),
                    "feature is constant within class, classification will fail with invalid variance"
                );
            }
            stats
        };

        Ok(ClassStatistics {
            amplitude: stats_for(Feature::Amplitude),
            distance: stats_for(Feature::Distance),
        })
    }
}

/// Class frequencies in the training data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassPriors {
    pub detect: f64,
    pub no_detect: f64,
}

impl ClassPriors {
    pub fn get(&self, label: Label) -> f64 {
        match label {
            Label::Detect => self.detect,
            Label::NoDetect => self.no_detect,
        }
    }
}

/// Everything the classifier needs, estimated once from the training rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParameters {
    pub detect: ClassStatistics,
    pub no_detect: ClassStatistics,
    pub priors: ClassPriors,
}

impl ModelParameters {
    pub fn stats(&self, label: Label) -> &ClassStatistics {
        match label {
            Label::Detect => &self.detect,
            Label::NoDetect => &self.no_detect,
        }
    }
}

/// Partitions the training rows by label and estimates per-class statistics and priors.
///
/// Every row must carry a label. Each class needs at least two rows, otherwise the
/// unbiased variance is undefined and `InsufficientData` is returned.
pub fn estimate(observations: &[Observation]) -> Result<ModelParameters> {
    let mut detect_rows = Vec::new();
    let mut no_detect_rows = Vec::new();
    for (i, observation) in observations.iter().enumerate() {
        match observation.label {
            Some(Label::Detect) => detect_rows.push(observation),
            Some(Label::NoDetect) => no_detect_rows.push(observation),
            None => {
                return Err(BayesError::MissingValue {
                    row: i as u64 + 1,
                    column: DETECTION,
                })
            }
        }
    }

    let detect = ClassStatistics::from_partition(Label::Detect, &detect_rows)?;
    let no_detect = ClassStatistics::from_partition(Label::NoDetect, &no_detect_rows)?;

    let total = observations.len() as f64;
    let priors = ClassPriors {
        detect: detect_rows.len() as f64 / total,
        no_detect: no_detect_rows.len() as f64 / total,
    };

    info!(
        detect_prior = priors.detect,
        no_detect_prior = priors.no_detect,
        "estimated class priors"
    );
    for (label, stats) in [(Label::Detect, &detect), (Label::NoDetect, &no_detect)] {
        for feature in Feature::ALL {
            let FeatureStats { mean, variance } = stats.feature(feature);
            info!(
                class = %label,
                feature = feature.column(),
                mean,
                variance,
                "estimated feature statistics"
            );
        }
    }

    Ok(ModelParameters {
        detect,
        no_detect,
        priors,
    })
}
