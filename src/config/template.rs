//! Configuration template generation

use crate::config::Config;
use crate::utils::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Generate a default configuration file at the specified path
pub fn generate_config_template<P: AsRef<Path>>(path: P) -> Result<()> {
    let config = Config::default();
    config
        .save(path)
        .map_err(|e| Error::ConfigError(e.to_string()))
}

/// Generate a configuration file with comments explaining each field
pub fn generate_commented_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    let toml_str = r#"# Late fusion evaluator configuration
# Every section is optional; missing values fall back to the defaults below.

version = "0.1.0"

[stores]
# Database engine of both stores: "leveldb" or "sled"
engine = "leveldb"

# Database with the RGB model's prediction records
rgb_path = "./chalearn_isogr_rgb_test_rst"

# Database with the depth model's prediction records
depth_path = "./chalearn_isogr_depth_test_rst"

# Records are keyed by the sample's line number, zero-padded to this width
key_width = 6

[record]
# Record encoding: "datum" (protobuf Datum) or "bincode"
format = "datum"

[fusion]
# fused = rgb_weight * rgb + depth_weight * depth
rgb_weight = 0.5
depth_weight = 0.5

# Added to the index of the best class (1 = 1-based labels)
label_base = 1

[evaluation]
# Sample list, one sample per line
list_path = "isogr_images_split/test_list.txt"

# "abort" stops at the first failing sample, "skip" drops it and continues
on_error = "abort"

# 0-based whitespace column holding the true label (enables accuracy counting)
# ground_truth_column = 2

# Print "Accuracy = ..." after the predictions (requires ground_truth_column)
report_accuracy = false
"#;

    // Create parent directories if they don't exist
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml_str)?;
    Ok(())
}
