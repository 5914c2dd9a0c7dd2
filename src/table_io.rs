use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use log::info;

use crate::table::TrackingTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Json,
    MessagePack,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<TableFormat> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(TableFormat::Json),
            Some("msgpack") | Some("mp") => Ok(TableFormat::MessagePack),
            _ => Err(anyhow!(
                "Unrecognised table file extension for {:?}; expected .json, .msgpack or .mp",
                path
            )),
        }
    }
}

pub fn load_table(path: &Path) -> Result<TrackingTable> {
    let format = TableFormat::from_path(path)?;
    let bytes = fs::read(path).with_context(|| format!("Failed to read table from {path:?}"))?;
    let table: TrackingTable = match format {
        TableFormat::Json => serde_json::from_slice(&bytes)?,
        TableFormat::MessagePack => rmp_serde::from_slice(&bytes)?,
    };
    info!(
        "Loaded table with {} frames and {} fields from {:?}",
        table.frames(),
        table.field_names().count(),
        path
    );
    Ok(table)
}

pub fn save_table(table: &TrackingTable, path: &Path) -> Result<()> {
    let bytes = match TableFormat::from_path(path)? {
        TableFormat::Json => serde_json::to_vec_pretty(table)?,
        TableFormat::MessagePack => rmp_serde::to_vec_named(table)?,
    };
    fs::write(path, bytes).with_context(|| format!("Failed to write table to {path:?}"))?;
    info!(
        "Wrote table with {} frames and {} fields to {:?}",
        table.frames(),
        table.field_names().count(),
        path
    );
    Ok(())
}
