//! Evaluation run: fuse every sample of a list and stream the predictions.

use crate::fusion::FusionDecoder;
use crate::record::RecordDecoder;
use crate::samples::SampleLine;
use crate::store::RecordStore;
use crate::Result;
use clap::ValueEnum;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// What to do when a single sample cannot be fused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the run and report the error
    #[default]
    Abort,
    /// Log the error, emit nothing for the sample and continue
    Skip,
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationSummary {
    /// Lines read from the sample list
    pub processed: usize,
    /// Lines for which a label was written
    pub predicted: usize,
    /// Lines dropped under [`ErrorPolicy::Skip`]
    pub skipped: usize,
    /// Predictions with a readable ground-truth label
    pub evaluated: usize,
    /// Of those, predictions matching the ground truth
    pub correct: usize,
}

impl EvaluationSummary {
    /// Fraction of evaluated predictions that were correct.
    pub fn accuracy(&self) -> Option<f64> {
        if self.evaluated == 0 {
            None
        } else {
            Some(self.correct as f64 / self.evaluated as f64)
        }
    }
}

/// Drives a [`FusionDecoder`] over a sample list.
pub struct Evaluator<'a, P, S, D> {
    decoder: &'a FusionDecoder<P, S, D>,
    policy: ErrorPolicy,
    ground_truth_column: Option<usize>,
}

impl<'a, P, S, D> Evaluator<'a, P, S, D>
where
    P: RecordStore,
    S: RecordStore,
    D: RecordDecoder,
{
    pub fn new(decoder: &'a FusionDecoder<P, S, D>, policy: ErrorPolicy) -> Self {
        Self { decoder, policy, ground_truth_column: None }
    }

    /// Compare predictions against the label found in this (0-based) column.
    pub fn with_ground_truth_column(mut self, column: Option<usize>) -> Self {
        self.ground_truth_column = column;
        self
    }

    /// Write `"<line> <label>"` for each sample, in input order.
    ///
    /// Errors reading the list or writing the output always end the run.
    /// Per-sample fusion errors end it too unless the policy is `Skip`.
    pub fn run<I, W>(&self, samples: I, mut out: W) -> Result<EvaluationSummary>
    where
        I: IntoIterator<Item = Result<SampleLine>>,
        W: Write,
    {
        let mut summary = EvaluationSummary::default();

        for sample in samples {
            let sample = sample?;
            summary.processed += 1;

            let prediction = match self.decoder.predict(sample.index) {
                | Ok(prediction) => prediction,
                | Err(e) if self.policy == ErrorPolicy::Skip && e.is_per_sample() => {
                    warn!("Skipping sample {} ({}): {}", sample.index, sample.id(), e);
                    summary.skipped += 1;
                    continue;
                }
                | Err(e) => return Err(e),
            };

            writeln!(out, "{} {}", sample.raw, prediction.label)?;
            summary.predicted += 1;

            if let Some(column) = self.ground_truth_column {
                match sample.ground_truth(column) {
                    | Ok(truth) => {
                        summary.evaluated += 1;
                        if truth == prediction.label {
                            summary.correct += 1;
                        }
                    }
                    | Err(e) => warn!("No ground truth for sample {}: {}", sample.index, e),
                }
            }
        }

        out.flush()?;
        info!(
            "Evaluated {} samples: {} predicted, {} skipped",
            summary.processed, summary.predicted, summary.skipped
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BincodeDecoder, ScoreArray};
    use crate::samples::SampleList;
    use crate::store::MemoryStore;
    use crate::utils::logging::init_test_logging;
    use crate::Error;
    use assert_matches::assert_matches;
    use std::io::Cursor;

    fn bin(values: &[f64]) -> Vec<u8> {
        bincode::serialize(&ScoreArray::from_vec(values.to_vec())).unwrap()
    }

    fn stores() -> (MemoryStore, MemoryStore) {
        let rgb = MemoryStore::new("rgb")
            .with("000000", bin(&[0.2, 0.9, 0.1]))
            .with("000001", bin(&[0.1, 0.2, 0.9]))
            .with("000002", bin(&[0.6, 0.3, 0.1]));
        let depth = MemoryStore::new("depth")
            .with("000000", bin(&[0.8, 0.1, 0.3]))
            .with("000001", bin(&[0.1, 0.2, 0.3]))
            .with("000002", bin(&[0.5, 0.4, 0.1]));
        (rgb, depth)
    }

    const LIST: &str = "a/K_1 40 1\na/K_2 52 3\na/K_3 61 2\n";

    #[test]
    fn test_echoes_lines_with_labels() {
        init_test_logging();
        let (rgb, depth) = stores();
        let decoder = FusionDecoder::new(&rgb, &depth, BincodeDecoder);
        let mut out = Vec::new();

        let summary = Evaluator::new(&decoder, ErrorPolicy::Abort)
            .run(SampleList::from_reader(Cursor::new(LIST)), &mut out)
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "a/K_1 40 1 1\na/K_2 52 3 3\na/K_3 61 2 1\n");
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.predicted, 3);
        assert_eq!(summary.accuracy(), None);
    }

    #[test]
    fn test_accuracy_against_ground_truth_column() {
        let (rgb, depth) = stores();
        let decoder = FusionDecoder::new(&rgb, &depth, BincodeDecoder);

        let summary = Evaluator::new(&decoder, ErrorPolicy::Abort)
            .with_ground_truth_column(Some(2))
            .run(SampleList::from_reader(Cursor::new(LIST)), std::io::sink())
            .unwrap();

        assert_eq!(summary.evaluated, 3);
        assert_eq!(summary.correct, 2);
        assert!((summary.accuracy().unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_abort_stops_at_first_failure() {
        let (rgb, mut depth) = stores();
        depth.insert("000001", bin(&[0.1, 0.2]));
        let decoder = FusionDecoder::new(&rgb, &depth, BincodeDecoder);
        let mut out = Vec::new();

        let result = Evaluator::new(&decoder, ErrorPolicy::Abort)
            .run(SampleList::from_reader(Cursor::new(LIST)), &mut out);

        assert_matches!(result, Err(Error::ShapeMismatch { .. }));
        assert_eq!(String::from_utf8(out).unwrap(), "a/K_1 40 1 1\n");
    }

    #[test]
    fn test_skip_continues_past_missing_records() {
        init_test_logging();
        let (rgb, depth) = stores();
        let decoder = FusionDecoder::new(&rgb, &depth, BincodeDecoder);
        let list = format!("{}a/K_4 12 5\n", LIST);
        let mut out = Vec::new();

        let summary = Evaluator::new(&decoder, ErrorPolicy::Skip)
            .run(SampleList::from_reader(Cursor::new(list)), &mut out)
            .unwrap();

        assert_eq!(summary.processed, 4);
        assert_eq!(summary.predicted, 3);
        assert_eq!(summary.skipped, 1);
        assert!(!String::from_utf8(out).unwrap().contains("K_4"));
    }

    #[test]
    fn test_list_errors_are_never_skipped() {
        let (rgb, depth) = stores();
        let decoder = FusionDecoder::new(&rgb, &depth, BincodeDecoder);
        let samples = vec![
            Ok(SampleLine::new(0, "a/K_1 40 1")),
            Err(Error::IoError(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"))),
        ];

        let result = Evaluator::new(&decoder, ErrorPolicy::Skip).run(samples, std::io::sink());
        assert_matches!(result, Err(Error::IoError(_)));
    }
}
