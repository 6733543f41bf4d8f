//! Command-line interface for the late fusion evaluator

use crate::config::{self, Config, CONFIG_FILE_NAME};
use crate::evaluate::{ErrorPolicy, Evaluator};
use crate::fusion::{argmax, sample_key, FusionDecoder};
use crate::record::{RecordDecoder, RecordFormat};
use crate::samples::SampleList;
use crate::store::{self, RecordStore, StoreAlias, StoreEngine};
use crate::utils::logging::init_logging;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde_json::json;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

/// Column of the ground-truth label in the competition's list files.
const DEFAULT_GROUND_TRUTH_COLUMN: usize = 2;

/// Main CLI structure using clap derive
#[derive(Debug, Parser)]
#[command(name = "latefusion", author, version)]
#[command(about = "Fuse RGB and depth prediction records into class labels", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace (LATEFUSION_LOG overrides)
    #[arg(long, global = true, default_value = "warn", value_name = "LEVEL")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fuse every sample of the list and print "<line> <label>"
    Run {
        /// Sample list file
        #[arg(short, long, value_name = "FILE")]
        list: Option<PathBuf>,

        /// RGB prediction store
        #[arg(long, value_name = "DIR")]
        rgb: Option<PathBuf>,

        /// Depth prediction store (may be the RGB store itself)
        #[arg(long, value_name = "DIR")]
        depth: Option<PathBuf>,

        /// Database engine of both stores
        #[arg(long, value_enum, value_name = "ENGINE")]
        engine: Option<StoreEngine>,

        /// Record encoding
        #[arg(long, value_enum, value_name = "FORMAT")]
        format: Option<RecordFormat>,

        /// What to do when a sample cannot be fused
        #[arg(long, value_enum, value_name = "POLICY")]
        on_error: Option<ErrorPolicy>,

        /// 0-based column holding the true label
        #[arg(long, value_name = "N")]
        ground_truth_column: Option<usize>,

        /// Print accuracy after the predictions (ground truth from column 2 by default)
        #[arg(long)]
        accuracy: bool,
    },

    /// Decode one record and print its scores
    Inspect {
        /// Store to read from
        #[arg(short, long, value_name = "DIR")]
        store: PathBuf,

        /// Record key, e.g. 000042
        #[arg(short, long, conflicts_with = "index", required_unless_present = "index")]
        key: Option<String>,

        /// Sample index, formatted with the configured key width
        #[arg(short, long)]
        index: Option<usize>,

        /// Database engine of the store
        #[arg(long, value_enum, value_name = "ENGINE")]
        engine: Option<StoreEngine>,

        /// Record encoding
        #[arg(long, value_enum, value_name = "FORMAT")]
        format: Option<RecordFormat>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a new configuration file
    Init {
        /// Output path for the config file
        #[arg(short, long, value_name = "FILE", default_value = CONFIG_FILE_NAME)]
        output: PathBuf,

        /// Generate a commented config with explanations
        #[arg(long)]
        commented: bool,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Check the configuration file for errors
    CheckConfig,

    /// Show version information
    Version,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match &self.command {
            | Commands::Run { list, rgb, depth, engine, format, on_error, ground_truth_column, accuracy } => {
                let mut config = self.load_config()?;
                if let Some(list) = list {
                    config.evaluation.list_path = list.clone();
                }
                if let Some(rgb) = rgb {
                    config.stores.rgb_path = rgb.clone();
                }
                if let Some(depth) = depth {
                    config.stores.depth_path = depth.clone();
                }
                if let Some(engine) = engine {
                    config.stores.engine = *engine;
                }
                if let Some(format) = format {
                    config.record.format = *format;
                }
                if let Some(policy) = on_error {
                    config.evaluation.on_error = *policy;
                }
                if ground_truth_column.is_some() {
                    config.evaluation.ground_truth_column = *ground_truth_column;
                }
                if *accuracy {
                    config.evaluation.report_accuracy = true;
                    config
                        .evaluation
                        .ground_truth_column
                        .get_or_insert(DEFAULT_GROUND_TRUTH_COLUMN);
                }
                self.handle_run(config)
            }
            | Commands::Inspect { store, key, index, engine, format, json } => {
                self.handle_inspect(store, key.as_deref(), *index, *engine, *format, *json)
            }
            | Commands::Init { output, commented, force } => {
                self.handle_init(output, *commented, *force)
            }
            | Commands::CheckConfig => self.handle_check_config(),
            | Commands::Version => self.handle_version(),
        }
    }

    fn load_config(&self) -> Result<Config> {
        let config = match &self.config {
            | Some(path) => Config::from_file(path)?,
            | None => Config::load()?,
        };
        Ok(config)
    }

    fn handle_run(&self, config: Config) -> Result<()> {
        config.validate()?;

        let engine = config.stores.engine;
        let rgb = engine.open("rgb", &config.stores.rgb_path)?;
        let depth: Box<dyn RecordStore + '_> =
            if store::same_location(&config.stores.rgb_path, &config.stores.depth_path) {
                info!(
                    "RGB and depth records share {}; opening it once",
                    config.stores.rgb_path.display()
                );
                Box::new(StoreAlias::new("depth", &rgb))
            } else {
                engine.open("depth", &config.stores.depth_path)?
            };
        let decoder = FusionDecoder::new(&rgb, depth, config.record.format.decoder())
            .with_weights(config.fusion.weights())
            .with_key_width(config.stores.key_width)
            .with_label_base(config.fusion.label_base);

        let samples = SampleList::open(&config.evaluation.list_path)?;
        info!(
            "Fusing {} with weights rgb={} depth={} ({} records)",
            config.evaluation.list_path.display(),
            config.fusion.rgb_weight,
            config.fusion.depth_weight,
            config.record.format
        );

        let stdout = io::stdout();
        let summary = Evaluator::new(&decoder, config.evaluation.on_error)
            .with_ground_truth_column(config.evaluation.ground_truth_column)
            .run(samples, BufWriter::new(stdout.lock()))?;

        if config.evaluation.report_accuracy {
            match summary.accuracy() {
                | Some(accuracy) => println!("Accuracy = {:.6}", accuracy),
                | None => warn!("No sample carried a readable ground-truth label; accuracy unavailable"),
            }
        }
        Ok(())
    }

    fn handle_inspect(
        &self,
        store: &Path,
        key: Option<&str>,
        index: Option<usize>,
        engine: Option<StoreEngine>,
        format: Option<RecordFormat>,
        as_json: bool,
    ) -> Result<()> {
        let config = self.load_config()?;
        let key = match (key, index) {
            | (Some(key), _) => key.to_string(),
            | (None, Some(index)) => sample_key(index, config.stores.key_width),
            | (None, None) => bail!("either --key or --index is required"),
        };
        let format = format.unwrap_or(config.record.format);

        let engine = engine.unwrap_or(config.stores.engine);
        let store = engine.open("inspected", store)?;
        let bytes = store.get(&key)?;
        let scores = format
            .decoder()
            .decode(&bytes)
            .with_context(|| format!("failed to decode record {} as {}", key, format))?;
        let label = argmax(scores.values()).map(|i| i + config.fusion.label_base);

        if as_json {
            let report = json!({
                "key": key,
                "format": format.to_string(),
                "shape": scores.shape(),
                "label": label,
                "scores": scores.values(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("key:    {}", key);
            println!("format: {}", format);
            println!("shape:  {:?}", scores.shape());
            match label {
                | Some(label) => println!("label:  {}", label),
                | None => println!("label:  -"),
            }
            println!("scores: {:?}", scores.values());
        }
        Ok(())
    }

    fn handle_init(&self, output: &Path, commented: bool, force: bool) -> Result<()> {
        if output.exists() && !force {
            bail!("File already exists: {}. Use --force to overwrite.", output.display());
        }
        if commented {
            config::generate_commented_config_template(output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Generated commented configuration at: {}", output.display());
        } else {
            config::generate_config_template(output)?;
            println!("Generated minimal configuration at: {}", output.display());
        }
        Ok(())
    }

    fn handle_check_config(&self) -> Result<()> {
        let config = self.load_config()?;
        config.validate().context("Invalid configuration")?;

        println!("✓ Configuration is valid");
        println!("\nConfiguration summary:");
        println!("  RGB store:   {}", config.stores.rgb_path.display());
        println!("  Depth store: {}", config.stores.depth_path.display());
        println!("  Engine:      {}", config.stores.engine);
        println!("  Sample list: {}", config.evaluation.list_path.display());
        println!("  Format:      {}", config.record.format);
        println!(
            "  Weights:     rgb={} depth={}",
            config.fusion.rgb_weight, config.fusion.depth_weight
        );
        println!("  On error:    {:?}", config.evaluation.on_error);
        Ok(())
    }

    fn handle_version(&self) -> Result<()> {
        println!(
            "latefusion v{}\n{}",
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_DESCRIPTION")
        );
        Ok(())
    }
}
