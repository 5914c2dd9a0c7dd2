use std::{fs, io::ErrorKind};

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::FeatureError,
    features::{
        derive_velocities, derive_vectors, DegeneratePolicy, FeatureSettings, VectorDefinitions,
    },
    histogram::HistogramSettings,
    table::TrackingTable,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureConfig {
    /// Named vectors between tracked entities (or midpoints of two entities)
    pub vectors: VectorDefinitions,

    /// Entities to calculate velocities for
    pub velocities: Vec<String>,

    /// Frames per second of the recording; if omitted, velocities are per frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,

    /// Either "nan" (zero-length vectors get a NaN angle) or "fail"
    pub on_degenerate: DegeneratePolicy,

    pub histogram: HistogramSettings,
}

impl FeatureConfig {
    pub fn settings(&self) -> FeatureSettings {
        FeatureSettings {
            on_degenerate: self.on_degenerate,
            frame_rate: self.frame_rate,
        }
    }

    /// Run vector derivation, then velocity derivation, on a copy of the table
    pub fn apply(&self, table: &TrackingTable) -> Result<TrackingTable, FeatureError> {
        let settings = self.settings();
        let with_vectors = derive_vectors(table, &self.vectors, &settings)?;
        derive_velocities(&with_vectors, self.velocities.as_slice(), &settings)
    }

    pub fn write_config_to_file(&self, config_file_path: &str) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(config_file_path, text)
            .with_context(|| format!("Error writing config to file {config_file_path}"))?;
        info!("Wrote config to file: {:?}", config_file_path);
        Ok(())
    }
}

pub fn load_config_from_file(config_file_path: &str) -> Result<FeatureConfig> {
    match fs::read_to_string(config_file_path) {
        Err(e) => {
            if e.kind() == ErrorKind::NotFound {
                warn!(
                    "Feature config file not found at {}, using defaults",
                    &config_file_path
                );
                Ok(FeatureConfig::default())
            } else {
                Err(anyhow!(
                    "Failed to load feature config from {}: {}",
                    config_file_path,
                    e
                ))
            }
        }
        Ok(s) => {
            info!("Loaded feature config OK from \"{}\"", config_file_path);
            match serde_json::from_str::<FeatureConfig>(&s) {
                Ok(loaded_config) => {
                    debug!("Config parsed data from file: {:?}", &loaded_config);
                    Ok(loaded_config)
                }
                Err(e) => Err(anyhow!("Failed to parse config data: {}", e)),
            }
        }
    }
}
