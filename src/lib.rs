//! # Late fusion evaluator
//! Fuses the per-sample class scores of an RGB model and a depth model,
//! read from two read-only record stores, into a single predicted label.

pub use crate::utils::error::{Error, Result};

pub mod config;
pub mod evaluate;
pub mod fusion;
pub mod record;
pub mod samples;
pub mod store;
pub mod utils;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::evaluate::{ErrorPolicy, EvaluationSummary, Evaluator};
pub use crate::fusion::{fuse, predicted_label, sample_key, FusionDecoder, FusionWeights, Prediction};
pub use crate::record::{RecordDecoder, RecordFormat, ScoreArray};
pub use crate::store::{LevelDbStore, MemoryStore, RecordStore, SledStore, StoreAlias, StoreEngine};
