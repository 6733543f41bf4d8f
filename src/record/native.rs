//! Records stored as bincode-serialized [`ScoreArray`]s.

use super::{RecordDecoder, ScoreArray};
use crate::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeDecoder;

impl RecordDecoder for BincodeDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<ScoreArray> {
        let raw: ScoreArray = bincode::deserialize(bytes)?;
        // serde bypasses the constructor, so re-check the element count
        let shape = raw.shape().to_vec();
        ScoreArray::new(shape, raw.into_values())
    }
}
