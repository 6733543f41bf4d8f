//! CLI entrypoint for the late fusion evaluator.

use anyhow::Result;
use clap::Parser;
use latefusion::cli::Cli;

fn main() -> Result<()> {
    Cli::parse().execute()
}
