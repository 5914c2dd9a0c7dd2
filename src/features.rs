use indexmap::IndexMap;
use log::{debug, warn};
use ndarray::{stack, Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::{
    error::FeatureError,
    geometry_utils::{checked_signed_angle, magnitude, reference_batch, signed_angle},
    table::{x_field, y_field, TrackingTable},
};

/// One end of a vector: either a tracked entity, or the midpoint between two.
///
/// In JSON this is either `"nose"` or `["ear_left", "ear_right"]`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum EntityRef {
    Single(String),
    Midpoint(String, String),
}

impl EntityRef {
    /// Per-frame position as an `(N, 2)` array
    pub fn resolve(&self, table: &TrackingTable) -> Result<Array2<f64>, FeatureError> {
        match self {
            EntityRef::Single(name) => table.point(name),
            EntityRef::Midpoint(a, b) => Ok((table.point(a)? + table.point(b)?) / 2.),
        }
    }
}

impl From<&str> for EntityRef {
    fn from(name: &str) -> Self {
        EntityRef::Single(String::from(name))
    }
}

impl From<(&str, &str)> for EntityRef {
    fn from((a, b): (&str, &str)) -> Self {
        EntityRef::Midpoint(String::from(a), String::from(b))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VectorDefinition {
    pub start: EntityRef,
    pub end: EntityRef,
}

impl VectorDefinition {
    pub fn new(start: impl Into<EntityRef>, end: impl Into<EntityRef>) -> Self {
        VectorDefinition {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Vector name -> definition; output columns follow this order
pub type VectorDefinitions = IndexMap<String, VectorDefinition>;

/// What to do when a vector (displacement or velocity) has zero length, so
/// that its angle is undefined
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DegeneratePolicy {
    #[default]
    Nan,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureSettings {
    pub on_degenerate: DegeneratePolicy,
    /// Frames per second. When set, velocities are in units per second
    /// instead of units per frame.
    pub frame_rate: Option<f64>,
}

/// `[angle, vec_x, vec_y, start_x, start_y]` column names for a vector
pub fn vector_field_names(name: &str) -> [String; 5] {
    [
        format!("{name}_angle"),
        format!("{name}_vec_x"),
        format!("{name}_vec_y"),
        format!("{name}_start_x"),
        format!("{name}_start_y"),
    ]
}

/// `[vel_mag, vel_ang, vel_x, vel_y]` column names for an entity
pub fn velocity_field_names(entity: &str) -> [String; 4] {
    [
        format!("{entity}_vel_mag"),
        format!("{entity}_vel_ang"),
        format!("{entity}_vel_x"),
        format!("{entity}_vel_y"),
    ]
}

fn orientation(
    vectors: ArrayView2<f64>,
    policy: DegeneratePolicy,
    label: &str,
) -> Result<Array1<f64>, FeatureError> {
    let reference = reference_batch(vectors.nrows());
    match policy {
        DegeneratePolicy::Fail => checked_signed_angle(vectors, reference.view()),
        DegeneratePolicy::Nan => {
            let angles = signed_angle(vectors, reference.view())?;
            let undefined = angles.iter().filter(|a| a.is_nan()).count();
            if undefined > 0 {
                warn!(
                    "{} of {} frames have a zero-length \"{}\" vector; angle set to NaN",
                    undefined,
                    angles.len(),
                    label
                );
            }
            Ok(angles)
        }
    }
}

/// Add angle, displacement and start position columns for every vector
/// definition. Returns a new table; the input is not modified.
pub fn derive_vectors(
    table: &TrackingTable,
    vector_defs: &VectorDefinitions,
    settings: &FeatureSettings,
) -> Result<TrackingTable, FeatureError> {
    let new_fields: Vec<String> = vector_defs
        .keys()
        .flat_map(|name| vector_field_names(name))
        .collect();
    let mut augmented = table.with_fields(&new_fields)?;

    for (name, definition) in vector_defs {
        let start = definition.start.resolve(table)?;
        let end = definition.end.resolve(table)?;
        let displacement = &end - &start;

        let angle = orientation(displacement.view(), settings.on_degenerate, name)?;

        let [angle_field, vec_x, vec_y, start_x, start_y] = vector_field_names(name);
        augmented.set_column(&angle_field, angle)?;
        augmented.set_column(&vec_x, displacement.column(0).to_owned())?;
        augmented.set_column(&vec_y, displacement.column(1).to_owned())?;
        augmented.set_column(&start_x, start.column(0).to_owned())?;
        augmented.set_column(&start_y, start.column(1).to_owned())?;
        debug!(
            "Derived vector \"{}\" ({:?} -> {:?}) over {} frames",
            name,
            definition.start,
            definition.end,
            table.frames()
        );
    }

    Ok(augmented)
}

/// Numerical gradient with unit spacing: central differences inside,
/// one-sided differences on the first and last frame
pub fn gradient(values: ArrayView1<f64>) -> Result<Array1<f64>, FeatureError> {
    let n = values.len();
    if n < 2 {
        return Err(FeatureError::InsufficientFrames { found: n });
    }
    Ok(Array1::from_shape_fn(n, |i| {
        if i == 0 {
            values[1] - values[0]
        } else if i == n - 1 {
            values[n - 1] - values[n - 2]
        } else {
            (values[i + 1] - values[i - 1]) / 2.
        }
    }))
}

/// Add velocity magnitude, heading and components for every named entity.
/// Returns a new table; the input is not modified.
pub fn derive_velocities(
    table: &TrackingTable,
    entity_names: &[impl AsRef<str>],
    settings: &FeatureSettings,
) -> Result<TrackingTable, FeatureError> {
    let scale = match settings.frame_rate {
        Some(rate) if rate > 0. && rate.is_finite() => rate,
        Some(rate) => {
            return Err(FeatureError::InvalidSettings(format!(
                "frame rate must be positive, got {rate}"
            )));
        }
        None => 1.,
    };

    let new_fields: Vec<String> = entity_names
        .iter()
        .flat_map(|entity| velocity_field_names(entity.as_ref()))
        .collect();
    let mut augmented = table.with_fields(&new_fields)?;

    for entity in entity_names.iter().map(|e| e.as_ref()) {
        let vel_x = gradient(table.column(&x_field(entity))?)? * scale;
        let vel_y = gradient(table.column(&y_field(entity))?)? * scale;
        let velocity = stack(Axis(1), &[vel_x.view(), vel_y.view()])
            .map_err(|_| FeatureError::shape(entity, vel_x.len(), vel_y.len()))?;

        let vel_mag = magnitude(velocity.view());
        let vel_ang = orientation(velocity.view(), settings.on_degenerate, entity)?;

        let [mag_field, ang_field, vx_field, vy_field] = velocity_field_names(entity);
        augmented.set_column(&mag_field, vel_mag)?;
        augmented.set_column(&ang_field, vel_ang)?;
        augmented.set_column(&vx_field, vel_x)?;
        augmented.set_column(&vy_field, vel_y)?;
        debug!(
            "Derived velocity for \"{}\" over {} frames (scale {})",
            entity,
            table.frames(),
            scale
        );
    }

    Ok(augmented)
}
