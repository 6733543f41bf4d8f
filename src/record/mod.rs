//! Prediction records and the decoders that turn stored bytes into scores.
//!
//! A record is an opaque blob as far as the stores are concerned; the
//! [`RecordDecoder`] chosen by [`RecordFormat`] gives it a shape and values.

mod datum;
mod native;

pub use datum::{Datum, DatumDecoder};
pub use native::BincodeDecoder;

use crate::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense array of per-class scores, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreArray {
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl ScoreArray {
    /// Build an array, checking that `shape` accounts for every value.
    pub fn new(shape: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        let expected = shape
            .iter()
            .try_fold(1usize, |count, &dim| count.checked_mul(dim))
            .ok_or_else(|| Error::DecodeError(format!("shape {:?} overflows", shape)))?;
        if expected != values.len() {
            return Err(Error::DecodeError(format!(
                "shape {:?} holds {} values, got {}",
                shape,
                expected,
                values.len()
            )));
        }
        Ok(Self { shape, values })
    }

    /// One-dimensional array over `values`.
    pub fn from_vec(values: Vec<f64>) -> Self {
        Self { shape: vec![values.len()], values }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Turns a stored record into a [`ScoreArray`].
pub trait RecordDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<ScoreArray>;
}

impl<D: RecordDecoder + ?Sized> RecordDecoder for &D {
    fn decode(&self, bytes: &[u8]) -> Result<ScoreArray> {
        (**self).decode(bytes)
    }
}

impl<D: RecordDecoder + ?Sized> RecordDecoder for Box<D> {
    fn decode(&self, bytes: &[u8]) -> Result<ScoreArray> {
        (**self).decode(bytes)
    }
}

/// On-disk encoding of the prediction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// Protobuf `Datum` messages written by the network's feature extractor
    #[default]
    Datum,
    /// `ScoreArray` serialized with bincode
    Bincode,
}

impl RecordFormat {
    pub fn decoder(self) -> Box<dyn RecordDecoder> {
        match self {
            | RecordFormat::Datum => Box::new(DatumDecoder),
            | RecordFormat::Bincode => Box::new(BincodeDecoder),
        }
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            | RecordFormat::Datum => write!(f, "datum"),
            | RecordFormat::Bincode => write!(f, "bincode"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_new_checks_element_count() {
        let arr = ScoreArray::new(vec![2, 1, 1], vec![0.3, 0.7]).unwrap();
        assert_eq!(arr.shape(), &[2, 1, 1]);
        assert_eq!(arr.len(), 2);

        assert_matches!(
            ScoreArray::new(vec![3, 1, 1], vec![0.3, 0.7]),
            Err(Error::DecodeError(_))
        );
    }

    #[test]
    fn test_new_rejects_overflowing_shape() {
        assert_matches!(
            ScoreArray::new(vec![usize::MAX, 2], Vec::new()),
            Err(Error::DecodeError(msg)) if msg.contains("overflows")
        );
        // a zero dimension still means an empty array
        assert!(ScoreArray::new(vec![usize::MAX, 0], Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_from_vec_is_one_dimensional() {
        let arr = ScoreArray::from_vec(vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(arr.shape(), &[4]);
        assert!(!arr.is_empty());
        assert!(ScoreArray::from_vec(Vec::new()).is_empty());
    }

    #[test]
    fn test_format_selects_decoder() {
        let arr = ScoreArray::from_vec(vec![1.0, 2.0]);
        let bytes = bincode::serialize(&arr).unwrap();
        let decoded = RecordFormat::Bincode.decoder().decode(&bytes).unwrap();
        assert_eq!(decoded, arr);
        assert_eq!(RecordFormat::default().to_string(), "datum");
    }
}
