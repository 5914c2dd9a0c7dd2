use std::{fs, path::Path};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{debug, info};
use serde::Serialize;

use trajectory_vectors::angles::compare_angles;
use trajectory_vectors::feature_config::load_config_from_file;
use trajectory_vectors::histogram::CircularHistogram;
use trajectory_vectors::table_io::{load_table, save_table};

use cli::{Cli, Command};

mod cli;

#[derive(Serialize, Debug)]
struct ComparisonReport<'a> {
    first: &'a str,
    second: &'a str,
    reduce: bool,
    differences: Vec<f64>,
    histogram: CircularHistogram,
}

fn write_report(text: &str, path: &Path) -> Result<()> {
    fs::write(path, text)
        .with_context(|| format!("Failed to write comparison report to {path:?}"))?;
    info!("Wrote comparison report to {:?}", path);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger from the environment

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    debug!("Started; args: {:?}", cli);

    let config = load_config_from_file(&cli.config_path)?;

    match &cli.command {
        Command::Derive { input, output } => {
            let table = load_table(input)?;
            let augmented = config.apply(&table)?;
            info!(
                "Derived {} vectors and {} velocities; {} fields in total",
                config.vectors.len(),
                config.velocities.len(),
                augmented.field_names().count()
            );
            save_table(&augmented, output)?;
        }
        Command::Compare {
            input,
            first,
            second,
            reduce,
            output,
        } => {
            let table = load_table(input)?;
            let differences =
                compare_angles(table.column(first)?, table.column(second)?, *reduce)?;
            let histogram = CircularHistogram::from_angles(differences.view(), &config.histogram)?;
            info!(
                "Compared \"{}\" with \"{}\": {} frames binned, {} skipped",
                first,
                second,
                histogram.total(),
                histogram.skipped
            );

            let report = ComparisonReport {
                first,
                second,
                reduce: *reduce,
                differences: differences.to_vec(),
                histogram,
            };
            let text = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => write_report(&text, path)?,
                None => println!("{}", text),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_write_error_names_the_path() {
        let path = std::env::temp_dir()
            .join("trajectory-vectors-no-such-dir")
            .join("report.json");
        let err = write_report("{}", &path).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("report.json"), "{message}");
        assert!(message.contains("Failed to write comparison report"));
    }
}
