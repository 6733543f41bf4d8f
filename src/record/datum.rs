//! Decoder for the protobuf `Datum` message produced by the feature
//! extraction tool. Only the fields needed to rebuild the score blob are
//! declared; unknown fields are skipped by `prost`.

use super::{RecordDecoder, ScoreArray};
use crate::{Error, Result};
use prost::Message;

/// Wire layout of a stored prediction record.
#[derive(Clone, PartialEq, Message)]
pub struct Datum {
    #[prost(int32, optional, tag = "1")]
    pub channels: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub height: Option<i32>,
    #[prost(int32, optional, tag = "3")]
    pub width: Option<i32>,
    /// Raw pixel payload; takes precedence over `float_data` when present.
    #[prost(bytes = "vec", optional, tag = "4")]
    pub data: Option<Vec<u8>>,
    #[prost(int32, optional, tag = "5")]
    pub label: Option<i32>,
    #[prost(float, repeated, packed = "false", tag = "6")]
    pub float_data: Vec<f32>,
    #[prost(bool, optional, tag = "7")]
    pub encoded: Option<bool>,
}

impl Datum {
    /// Score record of `channels x height x width` floats.
    pub fn from_scores(channels: i32, height: i32, width: i32, scores: &[f32]) -> Self {
        Self {
            channels: Some(channels),
            height: Some(height),
            width: Some(width),
            float_data: scores.to_vec(),
            ..Default::default()
        }
    }

    fn dims(&self) -> Result<Vec<usize>> {
        [("channels", self.channels), ("height", self.height), ("width", self.width)]
            .into_iter()
            .map(|(name, dim)| {
                let dim = dim.unwrap_or(0);
                usize::try_from(dim)
                    .map_err(|_| Error::DecodeError(format!("datum {} is negative: {}", name, dim)))
            })
            .collect()
    }

    /// Convert to a `[channels, height, width]` array.
    pub fn to_scores(&self) -> Result<ScoreArray> {
        if self.encoded.unwrap_or(false) {
            return Err(Error::DecodeError("datum holds an encoded image, not scores".into()));
        }
        let shape = self.dims()?;
        let values: Vec<f64> = match self.data.as_deref() {
            | Some(bytes) if !bytes.is_empty() => bytes.iter().map(|&b| f64::from(b)).collect(),
            | _ => self.float_data.iter().map(|&v| f64::from(v)).collect(),
        };
        ScoreArray::new(shape, values)
    }
}

/// [`RecordDecoder`] for protobuf `Datum` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatumDecoder;

impl RecordDecoder for DatumDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<ScoreArray> {
        let datum = Datum::decode(bytes)?;
        datum.to_scores()
    }
}
