use ndarray::{Array1, ArrayView1, Zip};

use crate::{error::FeatureError, geometry_utils::wrap_degrees};

/// Difference `ang1 - ang2` in degrees, wrapped into [0, 360).
///
/// With `reduce`, returns the smallest separation between the two
/// directions instead, in [0, 180]; so 359° vs 1° is 2°, not 358°.
pub fn compare_angle(ang1: f64, ang2: f64, reduce: bool) -> f64 {
    let difference = wrap_degrees(ang1 - ang2);
    if reduce {
        difference.min(360. - difference)
    } else {
        difference
    }
}

/// Element-wise [`compare_angle`] over two equal-length angle arrays
pub fn compare_angles(
    ang1: ArrayView1<f64>,
    ang2: ArrayView1<f64>,
    reduce: bool,
) -> Result<Array1<f64>, FeatureError> {
    if ang1.len() != ang2.len() {
        return Err(FeatureError::shape(
            "angle comparison",
            ang1.len(),
            ang2.len(),
        ));
    }
    Ok(Zip::from(&ang1)
        .and(&ang2)
        .map_collect(|a, b| compare_angle(*a, *b, reduce)))
}
