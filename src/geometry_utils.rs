use std::f64::consts::PI;

use nalgebra::Vector2;
use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};

use crate::{error::FeatureError, Point2D};

/// Orientations are measured against this axis (positive x)
pub const REFERENCE_AXIS: Point2D = (1., 0.);

fn check_pair(a: &ArrayView2<f64>, b: &ArrayView2<f64>) -> Result<(), FeatureError> {
    if a.nrows() != b.nrows() {
        return Err(FeatureError::shape("vector batch rows", a.nrows(), b.nrows()));
    }
    if a.ncols() != b.ncols() {
        return Err(FeatureError::shape(
            "vector batch components",
            a.ncols(),
            b.ncols(),
        ));
    }
    Ok(())
}

/// Dot product of each row of `a` with the matching row of `b`
pub fn dot(a: ArrayView2<f64>, b: ArrayView2<f64>) -> Result<Array1<f64>, FeatureError> {
    check_pair(&a, &b)?;
    Ok(Zip::from(a.rows())
        .and(b.rows())
        .map_collect(|ra, rb| ra.dot(&rb)))
}

/// Euclidean norm of each row; zero only for an all-zero row.
/// Built from `hypot`, so very large or very small components neither
/// overflow nor vanish.
pub fn magnitude(a: ArrayView2<f64>) -> Array1<f64> {
    a.map_axis(Axis(1), |row| row.iter().fold(0., |acc: f64, v| acc.hypot(*v)))
}

/// A batch of `n` copies of [`REFERENCE_AXIS`], for use as the `b` argument
/// of [`signed_angle`] when absolute orientation is wanted.
pub fn reference_batch(n: usize) -> Array2<f64> {
    let (rx, ry) = REFERENCE_AXIS;
    Array2::from_shape_fn((n, 2), |(_, j)| if j == 0 { rx } else { ry })
}

/// Wrap any angle in degrees into [0, 360)
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.);
    // rem_euclid rounds up to exactly 360 for tiny negative inputs
    if wrapped >= 360. { 0. } else { wrapped }
}

/// Full-circle angle (in degrees, range [0, 360)) going from `b` to `a`.
///
/// The dot product alone only gives the unsigned angle in [0, 180]; the side
/// of `a` relative to the clockwise perpendicular of `b` decides which half
/// of the circle it belongs to. With `b` = (1, 0) this is the usual
/// counter-clockwise orientation of `a` from the positive x-axis.
///
/// Returns NaN if either vector has zero length.
pub fn signed_angle_pair(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    // normalise first; squaring raw components overflows near 1e155
    let a = a / a.x.hypot(a.y);
    let b = b / b.x.hypot(b.y);
    let cos_ab = a.dot(&b).clamp(-1., 1.);
    let mut angle = cos_ab.acos();

    let b_perp = Vector2::new(b.y, -b.x);
    if a.dot(&b_perp) < 0. {
        angle = 2. * PI - angle;
    }

    wrap_degrees(360. - angle.to_degrees())
}

/// Batched [`signed_angle_pair`] over `(N, 2)` arrays
pub fn signed_angle(
    a: ArrayView2<f64>,
    b: ArrayView2<f64>,
) -> Result<Array1<f64>, FeatureError> {
    check_pair(&a, &b)?;
    if a.ncols() != 2 {
        return Err(FeatureError::shape("2D vector components", 2, a.ncols()));
    }
    Ok(Zip::from(a.rows()).and(b.rows()).map_collect(|ra, rb| {
        signed_angle_pair(&Vector2::new(ra[0], ra[1]), &Vector2::new(rb[0], rb[1]))
    }))
}

/// Like [`signed_angle`], but fails on the first zero-length vector instead of
/// letting NaN through
pub fn checked_signed_angle(
    a: ArrayView2<f64>,
    b: ArrayView2<f64>,
) -> Result<Array1<f64>, FeatureError> {
    check_pair(&a, &b)?;
    let zero_a = magnitude(a.view());
    let zero_b = magnitude(b.view());
    if let Some(index) = zero_a
        .iter()
        .zip(zero_b.iter())
        .position(|(ma, mb)| *ma == 0. || *mb == 0.)
    {
        return Err(FeatureError::DegenerateVector { index });
    }
    signed_angle(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_signed_angle_cardinals() {
        let a = array![[1., 0.], [0., 1.], [-1., 0.], [0., -1.]];
        let angles = signed_angle(a.view(), reference_batch(4).view()).unwrap();
        assert_close(angles[0], 0.); // E
        assert_close(angles[1], 90.); // N
        assert_close(angles[2], 180.); // W
        assert_close(angles[3], 270.); // S
    }

    #[test]
    fn test_signed_angle_diagonals() {
        let a = array![[1., 1.], [-3.5, 3.5], [-1., -1.], [2., -2.]];
        let angles = signed_angle(a.view(), reference_batch(4).view()).unwrap();
        assert_close(angles[0], 45.);
        assert_close(angles[1], 135.);
        assert_close(angles[2], 225.);
        assert_close(angles[3], 315.);
    }

    #[test]
    fn test_signed_angle_relative_to_other_vector() {
        // from "north" to "west" is a quarter turn counter-clockwise
        let angle = signed_angle_pair(&Vector2::new(-1., 0.), &Vector2::new(0., 1.));
        assert_close(angle, 90.);
        // ...and the other way around is three quarters
        let angle = signed_angle_pair(&Vector2::new(0., 1.), &Vector2::new(-1., 0.));
        assert_close(angle, 270.);
    }

    #[test]
    fn test_signed_angle_stays_in_range_for_unit_vectors() {
        let steps = 720;
        let a = Array2::from_shape_fn((steps, 2), |(i, j)| {
            let theta = 2. * PI * i as f64 / steps as f64;
            if j == 0 { theta.cos() } else { theta.sin() }
        });
        let b = Array2::from_shape_fn((steps, 2), |(i, j)| {
            let theta = 2. * PI * ((i * 7) % steps) as f64 / steps as f64;
            if j == 0 { theta.cos() } else { theta.sin() }
        });
        let angles = signed_angle(a.view(), b.view()).unwrap();
        assert!(angles.iter().all(|a| (0. ..360.).contains(a)));
    }

    #[test]
    fn test_parallel_vectors_do_not_produce_nan() {
        // cosine can land just above 1.0 through rounding
        let a = array![[0.1, 0.7], [3., 21.]];
        let angles = signed_angle(a.view(), array![[0.1, 0.7], [0.1, 0.7]].view()).unwrap();
        assert!(angles.iter().all(|a| a.is_finite()));
        assert!(angles.iter().all(|a| *a < 1e-5 || *a > 360. - 1e-5));
    }

    #[test]
    fn test_zero_vector_is_nan_or_error() {
        let a = array![[1., 0.], [0., 0.]];
        let b = reference_batch(2);
        let angles = signed_angle(a.view(), b.view()).unwrap();
        assert!(angles[1].is_nan());
        assert_eq!(
            checked_signed_angle(a.view(), b.view()),
            Err(FeatureError::DegenerateVector { index: 1 })
        );
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(360.), 0.);
        assert_eq!(wrap_degrees(-90.), 270.);
        assert_eq!(wrap_degrees(725.), 5.);
        assert_eq!(wrap_degrees(-1e-20), 0.);
    }

    #[test]
    fn test_dot_and_magnitude() {
        let a = array![[3., 4.], [1., 2.], [0., 0.]];
        let b = array![[1., 0.], [2., -1.], [5., 5.]];
        assert_eq!(dot(a.view(), b.view()).unwrap(), array![3., 0., 0.]);
        let m = magnitude(a.view());
        assert_close(m[0], 5.);
        assert_close(m[1], 5f64.sqrt());
        assert_eq!(m[2], 0.);
    }

    #[test]
    fn test_extreme_magnitudes() {
        let a = array![[3e200, 4e200], [1e-310, 0.], [0., -5e-320]];
        let m = magnitude(a.view());
        assert!((m[0] / 5e200 - 1.).abs() < 1e-12);
        assert!(m[1] > 0.);
        assert!(m[2] > 0.);
    }

    #[test]
    fn test_extreme_vectors_keep_their_angle() {
        let a = array![[1e200, 1e200], [-1e-310, 1e-310], [0., -1e300]];
        let angles = signed_angle(a.view(), reference_batch(3).view()).unwrap();
        assert_close(angles[0], 45.);
        assert_close(angles[1], 135.);
        assert_close(angles[2], 270.);

        // tiny but non-zero vectors are not degenerate
        let tiny = array![[1e-310, 0.]];
        let checked = checked_signed_angle(tiny.view(), reference_batch(1).view()).unwrap();
        assert_close(checked[0], 0.);
    }

    #[test]
    fn test_mismatched_batches_are_rejected() {
        let a = array![[1., 0.], [0., 1.]];
        let b = reference_batch(3);
        assert!(matches!(
            dot(a.view(), b.view()),
            Err(FeatureError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            signed_angle(a.view(), b.view()),
            Err(FeatureError::ShapeMismatch { .. })
        ));
    }
}
