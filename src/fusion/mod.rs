//! Late fusion of two models' class scores.
//!
//! For a sample index the [`FusionDecoder`] looks up one record in each
//! store, decodes both, combines them with fixed linear weights and picks
//! the class with the highest fused score. Calls are independent of each
//! other and never write anything.

use crate::record::{RecordDecoder, ScoreArray};
use crate::store::RecordStore;
use crate::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Width of the zero-padded decimal keys written by the extraction step.
pub const DEFAULT_KEY_WIDTH: usize = 6;

/// Class labels are reported 1-based.
pub const DEFAULT_LABEL_BASE: usize = 1;

/// Format a sample index as a store key, e.g. `5` -> `"000005"`.
pub fn sample_key(index: usize, width: usize) -> String {
    format!("{:0width$}", index, width = width)
}

/// Linear weights applied to the two score arrays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub primary: f64,
    pub secondary: f64,
}

impl FusionWeights {
    pub fn new(primary: f64, secondary: f64) -> Self {
        Self { primary, secondary }
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self { primary: 0.5, secondary: 0.5 }
    }
}

/// Elementwise `w.primary * a + w.secondary * b`.
///
/// Fails with [`Error::ShapeMismatch`] unless both arrays have the same shape.
pub fn fuse(a: &ScoreArray, b: &ScoreArray, weights: FusionWeights) -> Result<ScoreArray> {
    if a.shape() != b.shape() {
        return Err(Error::ShapeMismatch { left: a.shape().to_vec(), right: b.shape().to_vec() });
    }
    let values = a
        .values()
        .iter()
        .zip(b.values())
        .map(|(x, y)| weights.primary * x + weights.secondary * y)
        .collect();
    ScoreArray::new(a.shape().to_vec(), values)
}

/// Index of the first maximum. NaN entries are never selected; `None` when
/// there is nothing to choose from.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            | Some((_, current)) if v <= current => {}
            | _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// `argmax(fused) + base`, flattening multi-dimensional arrays row-major.
pub fn predicted_label(fused: &ScoreArray, base: usize) -> Result<usize> {
    argmax(fused.values()).map(|i| i + base).ok_or(Error::EmptyScores)
}

/// Outcome of fusing one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub index: usize,
    pub key: String,
    pub label: usize,
    pub fused: ScoreArray,
}

/// Fuses the records two models produced for the same sample.
pub struct FusionDecoder<P, S, D> {
    primary: P,
    secondary: S,
    decoder: D,
    weights: FusionWeights,
    key_width: usize,
    label_base: usize,
}

impl<P, S, D> FusionDecoder<P, S, D>
where
    P: RecordStore,
    S: RecordStore,
    D: RecordDecoder,
{
    /// Equal weights, 6-digit keys, 1-based labels.
    pub fn new(primary: P, secondary: S, decoder: D) -> Self {
        Self {
            primary,
            secondary,
            decoder,
            weights: FusionWeights::default(),
            key_width: DEFAULT_KEY_WIDTH,
            label_base: DEFAULT_LABEL_BASE,
        }
    }

    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_key_width(mut self, key_width: usize) -> Self {
        self.key_width = key_width;
        self
    }

    pub fn with_label_base(mut self, label_base: usize) -> Self {
        self.label_base = label_base;
        self
    }

    pub fn weights(&self) -> FusionWeights {
        self.weights
    }

    /// Predict the label of the sample at `index`.
    ///
    /// Both records are fetched before either is decoded, so a missing key
    /// in either store fails without any decoding work.
    pub fn predict(&self, index: usize) -> Result<Prediction> {
        let key = sample_key(index, self.key_width);
        let primary_bytes = self.primary.get(&key)?;
        let secondary_bytes = self.secondary.get(&key)?;

        let a = self.decoder.decode(&primary_bytes)?;
        let b = self.decoder.decode(&secondary_bytes)?;
        let fused = fuse(&a, &b, self.weights)?;
        let label = predicted_label(&fused, self.label_base)?;
        debug!("sample {} fused over shape {:?} -> label {}", key, fused.shape(), label);

        Ok(Prediction { index, key, label, fused })
    }
}
