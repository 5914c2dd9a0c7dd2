use std::path::PathBuf;

use clap::{command, Parser, Subcommand};

// Some defaults; some of which can be overriden via CLI args
const CONFIG_FILE_PATH: &str = "./features.json";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Where to load vector/velocity definitions and histogram settings
    #[arg(long = "config", default_value_t = String::from(CONFIG_FILE_PATH))]
    pub config_path: String,

    #[arg(long = "loglevel", default_value_t = String::from("info"))]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Append vector and velocity columns to a tracking table
    Derive {
        /// Table to read (.json, .msgpack or .mp)
        #[arg(long)]
        input: PathBuf,

        /// Where to write the augmented table; format follows the extension
        #[arg(long)]
        output: PathBuf,
    },

    /// Compare two angle columns and bin the differences for a polar histogram
    Compare {
        #[arg(long)]
        input: PathBuf,

        /// Column holding the first angle (degrees)
        #[arg(long)]
        first: String,

        /// Column holding the second angle (degrees)
        #[arg(long)]
        second: String,

        /// Report the smallest separation (0-180) instead of the directional difference
        #[arg(long)]
        reduce: bool,

        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}
