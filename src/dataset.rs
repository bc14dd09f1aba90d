use crate::error::{BayesError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::{fmt, io, path::Path};
use tracing::{info, warn};

pub const AMPLITUDE: &str = "Amplitude";
pub const DISTANCE: &str = "Distance";
pub const DETECTION: &str = "Detection";

const COLUMNS: [&str; 3] = [AMPLITUDE, DISTANCE, DETECTION];

/// One of the two detection categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Detect,
    NoDetect,
}

impl Label {
    /// Fixed total order over the labels. Ties in the decision rule go to the first entry.
    pub const ALL: [Label; 2] = [Label::Detect, Label::NoDetect];

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Detect => "Detect",
            Label::NoDetect => "No Detect",
        }
    }

    pub fn parse(s: &str) -> Option<Label> {
        Label::ALL.into_iter().find(|label| label.as_str() == s)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The continuous features the model is built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Amplitude,
    Distance,
}

impl Feature {
    pub const ALL: [Feature; 2] = [Feature::Amplitude, Feature::Distance];

    pub fn column(self) -> &'static str {
        match self {
            Feature::Amplitude => AMPLITUDE,
            Feature::Distance => DISTANCE,
        }
    }
}

/// A single row: feature values, the ground truth label and, once classified, a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub amplitude: f64,
    pub distance: f64,
    pub label: Option<Label>,
    pub prediction: Option<Label>,
}

impl Observation {
    pub fn new(amplitude: f64, distance: f64, label: Label) -> Self {
        Observation {
            amplitude,
            distance,
            label: Some(label),
            prediction: None,
        }
    }

    /// An observation with no ground truth, for classifying fresh rows.
    #[cfg(test)]
    pub fn unlabeled(amplitude: f64, distance: f64) -> Self {
        Observation {
            amplitude,
            distance,
            label: None,
            prediction: None,
        }
    }

    pub fn value(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Amplitude => self.amplitude,
            Feature::Distance => self.distance,
        }
    }
}

/// What to do with a row that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPolicy {
    /// Abort loading on the first bad row.
    Strict,
    /// Log the bad row and carry on.
    Skip,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Amplitude")]
    amplitude: Option<String>,
    #[serde(rename = "Distance")]
    distance: Option<String>,
    #[serde(rename = "Detection")]
    detection: Option<String>,
}

/// Ordered rows sharing the Amplitude/Distance/Detection schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub observations: Vec<Observation>,
    /// Number of rows dropped under `RowPolicy::Skip`.
    pub skipped: usize,
}

impl Dataset {
    pub fn new(observations: Vec<Observation>) -> Self {
        Dataset {
            observations,
            skipped: 0,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P, policy: RowPolicy) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file, policy)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            skipped = dataset.skipped,
            "loaded dataset"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: io::Read>(rdr: R, policy: RowPolicy) -> Result<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(rdr);
        let headers = reader.headers()?.clone();
        check_schema(&headers)?;

        let mut dataset = Dataset::new(Vec::new());
        for record in reader.records() {
            let parsed = record
                .map_err(BayesError::from)
                .and_then(|record| parse_record(&record, &headers));

            match parsed {
                Ok(observation) => dataset.observations.push(observation),
                Err(BayesError::Csv(err)) if err.is_io_error() => return Err(err.into()),
                Err(err) => match policy {
                    RowPolicy::Strict => return Err(err),
                    RowPolicy::Skip => {
                        warn!(error = %err, "skipping row");
                        dataset.skipped += 1;
                    }
                },
            }
        }

        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }
}

fn check_schema(headers: &StringRecord) -> Result<()> {
    for column in COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(BayesError::SchemaMismatch(format!(
                "missing column {column:?}"
            )));
        }
    }
    if let Some(extra) = headers.iter().find(|h| !COLUMNS.contains(h)) {
        return Err(BayesError::SchemaMismatch(format!(
            "unexpected column {extra:?}"
        )));
    }
    if headers.len() != COLUMNS.len() {
        return Err(BayesError::SchemaMismatch(
            "duplicate columns in header".to_string(),
        ));
    }
    Ok(())
}

fn parse_record(record: &StringRecord, headers: &StringRecord) -> Result<Observation> {
    let row = record.position().map_or(0, |pos| pos.line());
    let raw: RawRow = record.deserialize(Some(headers))?;

    let amplitude = parse_feature(row, AMPLITUDE, raw.amplitude)?;
    let distance = parse_feature(row, DISTANCE, raw.distance)?;

    let detection = raw.detection.ok_or(BayesError::MissingValue {
        row,
        column: DETECTION,
    })?;
    let label = Label::parse(&detection).ok_or(BayesError::UnknownLabel {
        row,
        value: detection.clone(),
    })?;

    Ok(Observation::new(amplitude, distance, label))
}

fn parse_feature(row: u64, column: &'static str, raw: Option<String>) -> Result<f64> {
    let raw = raw.ok_or(BayesError::MissingValue { row, column })?;
    let value: f64 = raw.parse().map_err(|_| BayesError::InvalidValue {
        row,
        column,
        value: raw.clone(),
    })?;

    // NaN is how null shows up in exported tables.
    if value.is_nan() {
        return Err(BayesError::MissingValue { row, column });
    }
    if value.is_infinite() {
        return Err(BayesError::InvalidValue {
            row,
            column,
            value: raw,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load(csv: &str, policy: RowPolicy) -> Result<Dataset> {
        Dataset::from_reader(csv.as_bytes(), policy)
    }

    #[test]
    fn loads_rows_in_order() {
        let data = "Amplitude,Distance,Detection\n1.5,2.0,Detect\n0.25, 7 ,No Detect\n";
        let dataset = load(data, RowPolicy::Strict).unwrap();

        assert_eq!(
            dataset.observations,
            vec![
                Observation::new(1.5, 2.0, Label::Detect),
                Observation::new(0.25, 7.0, Label::NoDetect),
            ]
        );
        assert_eq!(dataset.skipped, 0);
    }

    #[test]
    fn column_order_does_not_matter() {
        let data = "Detection,Distance,Amplitude\nDetect,3.0,9.0\n";
        let dataset = load(data, RowPolicy::Strict).unwrap();

        assert_eq!(dataset.observations[0].amplitude, 9.0);
        assert_eq!(dataset.observations[0].distance, 3.0);
    }

    #[test]
    fn missing_column_is_schema_mismatch() {
        let data = "Amplitude,Detection\n1.0,Detect\n";
        let err = load(data, RowPolicy::Strict).unwrap_err();
        assert!(matches!(err, BayesError::SchemaMismatch(_)));
    }

    #[test]
    fn extra_column_is_schema_mismatch() {
        let data = "Amplitude,Distance,Speed,Detection\n1.0,2.0,3.0,Detect\n";
        let err = load(data, RowPolicy::Skip).unwrap_err();
        assert!(matches!(err, BayesError::SchemaMismatch(_)));
    }

    #[test]
    fn empty_field_is_missing_value() {
        let data = "Amplitude,Distance,Detection\n1.0,2.0,Detect\n,4.0,Detect\n";
        let err = load(data, RowPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            BayesError::MissingValue {
                row: 3,
                column: AMPLITUDE
            }
        ));
    }

    #[test]
    fn missing_label_is_missing_value() {
        let data = "Amplitude,Distance,Detection\n1.0,2.0,\n";
        let err = load(data, RowPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            BayesError::MissingValue {
                column: DETECTION,
                ..
            }
        ));
    }

    #[test]
    fn nan_is_missing_value() {
        let data = "Amplitude,Distance,Detection\n1.0,NaN,Detect\n";
        let err = load(data, RowPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            BayesError::MissingValue {
                column: DISTANCE,
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_is_invalid_value() {
        let data = "Amplitude,Distance,Detection\nloud,2.0,Detect\n";
        let err = load(data, RowPolicy::Strict).unwrap_err();
        assert!(matches!(err, BayesError::InvalidValue { ref value, .. } if value == "loud"));
    }

    #[test]
    fn unknown_label_is_rejected() {
        let data = "Amplitude,Distance,Detection\n1.0,2.0,Maybe\n";
        let err = load(data, RowPolicy::Strict).unwrap_err();
        assert!(matches!(err, BayesError::UnknownLabel { ref value, .. } if value == "Maybe"));
    }

    #[test]
    fn skip_policy_keeps_good_rows() {
        let data = "Amplitude,Distance,Detection\n\
                    1.0,2.0,Detect\n\
                    x,2.0,Detect\n\
                    3.0,,No Detect\n\
                    1.0,2.0,3.0\n\
                    4.0,5.0,No Detect\n";
        let dataset = load(data, RowPolicy::Skip).unwrap();

        assert_eq!(dataset.skipped, 3);
        assert_eq!(
            dataset.observations,
            vec![
                Observation::new(1.0, 2.0, Label::Detect),
                Observation::new(4.0, 5.0, Label::NoDetect),
            ]
        );
    }

    #[test]
    fn short_record_is_skipped() {
        let data = "Amplitude,Distance,Detection\n1.0,2.0\n4.0,5.0,Detect\n";
        let dataset = load(data, RowPolicy::Skip).unwrap();

        assert_eq!(dataset.skipped, 1);
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn loads_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Amplitude,Distance,Detection").unwrap();
        writeln!(file, "2.0,1.0,No Detect").unwrap();

        let dataset = Dataset::from_path(file.path(), RowPolicy::Strict).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.observations[0].label, Some(Label::NoDetect));
    }

    #[test]
    fn label_round_trips_through_text() {
        for label in Label::ALL {
            assert_eq!(Label::parse(label.as_str()), Some(label));
        }
        assert_eq!(Label::parse("detect"), None);
    }
}
