use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::{error::FeatureError, geometry_utils::wrap_degrees};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HistogramSettings {
    pub bins: usize,
    /// Width of each bar, in radians
    pub bar_width: f64,
    /// (width, height) hint for whatever draws the histogram
    pub figure_size: (f64, f64),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Default for HistogramSettings {
    fn default() -> Self {
        HistogramSettings {
            bins: 50,
            bar_width: 0.1,
            figure_size: (8., 8.),
            title: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PolarBar {
    /// Centre of the bin, in radians
    pub theta: f64,
    pub width: f64,
    pub count: usize,
}

/// Binned angle distribution, ready to be drawn as bars on polar axes
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CircularHistogram {
    pub bars: Vec<PolarBar>,
    /// Non-finite values that could not be binned
    pub skipped: usize,
    pub figure_size: (f64, f64),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl CircularHistogram {
    /// Bin angles (degrees) into `settings.bins` equal sectors covering the
    /// full circle. Angles outside [0, 360) are wrapped first.
    pub fn from_angles(
        angles: ArrayView1<f64>,
        settings: &HistogramSettings,
    ) -> Result<Self, FeatureError> {
        if settings.bins == 0 {
            return Err(FeatureError::InvalidSettings(String::from(
                "histogram needs at least one bin",
            )));
        }
        let sector = 360. / settings.bins as f64;
        let mut counts = vec![0usize; settings.bins];
        let mut skipped = 0;

        for angle in angles.iter() {
            if !angle.is_finite() {
                skipped += 1;
                continue;
            }
            let bin = (wrap_degrees(*angle) / sector) as usize;
            counts[bin.min(settings.bins - 1)] += 1;
        }

        let bars = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| PolarBar {
                theta: ((i as f64 + 0.5) * sector).to_radians(),
                width: settings.bar_width,
                count,
            })
            .collect();

        Ok(CircularHistogram {
            bars,
            skipped,
            figure_size: settings.figure_size,
            title: settings.title.clone(),
        })
    }

    pub fn total(&self) -> usize {
        self.bars.iter().map(|b| b.count).sum()
    }
}
