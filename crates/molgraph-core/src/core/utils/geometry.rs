use nalgebra::{Matrix3, Point3, Rotation3, Unit, Vector3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Vectors shorter than this are treated as null by normalization and rotation helpers.
pub const SMALL_MAGNITUDE: f64 = 1e-4;

const ANGLE_EPSILON: f64 = 1e-10;

pub fn distance_sq(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (b - a).norm_squared()
}

pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (b - a).norm()
}

/// Applies `m` to `v`, treating `m` as row-major (`m * v`).
pub fn transform(m: &Matrix3<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    m * v
}

/// Applies the transpose of `m` to `v` without materializing the transpose.
pub fn inverse_transform(m: &Matrix3<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    m.tr_mul(v)
}

pub fn transform_about_point(
    m: &Matrix3<f64>,
    v: &Point3<f64>,
    pivot: &Point3<f64>,
) -> Point3<f64> {
    pivot + m * (v - pivot)
}

/// Returns `v` scaled to unit length, or the null vector when `v` is too short to normalize.
pub fn normalize(v: &Vector3<f64>) -> Vector3<f64> {
    let len = v.norm();
    if len > SMALL_MAGNITUDE {
        v / len
    } else {
        Vector3::zeros()
    }
}

/// Returns `v` scaled to unit length, or the x axis when `v` is too short to normalize.
pub fn normalize_failsafe(v: &Vector3<f64>) -> Vector3<f64> {
    let len = v.norm();
    if len > SMALL_MAGNITUDE {
        v / len
    } else {
        Vector3::x()
    }
}

pub fn project(v: &Vector3<f64>, n: &Vector3<f64>) -> Vector3<f64> {
    n * v.dot(n)
}

pub fn remove_component(v: &Vector3<f64>, n: &Vector3<f64>) -> Vector3<f64> {
    v - n * v.dot(n)
}

/// Builds an orthonormal frame whose first axis follows `x` and whose second axis
/// lies in the plane spanned by `x` and `y`.
///
/// The frame is returned row-wise: rows are the x, y and z axes.
pub fn orthonormal_system(x: &Vector3<f64>, y: &Vector3<f64>) -> Matrix3<f64> {
    let z = normalize(&x.cross(y));
    let y = normalize(&z.cross(x));
    let x = normalize(x);
    Matrix3::from_rows(&[x.transpose(), y.transpose(), z.transpose()])
}

/// Angle in radians between two vectors. Degenerate (near-zero) inputs yield a right angle.
pub fn angle_between(v1: &Vector3<f64>, v2: &Vector3<f64>) -> f64 {
    let denom = v1.norm() * v2.norm();
    let cosine = if denom > ANGLE_EPSILON {
        v1.dot(v2) / denom
    } else {
        0.0
    };
    cosine.clamp(-1.0, 1.0).acos()
}

/// Angle in radians at `p2` formed by the three positions `p1`-`p2`-`p3`.
pub fn angle_formed_by(p1: &Point3<f64>, p2: &Point3<f64>, p3: &Point3<f64>) -> f64 {
    let r1 = distance(p1, p2);
    let r2 = distance(p2, p3);
    let r3 = distance(p1, p3);

    // Collinear (or nearly so) positions: the law of cosines loses precision around 180°.
    if r1 + r2 - r3 < ANGLE_EPSILON {
        return std::f64::consts::PI;
    }
    ((r1 * r1 + r2 * r2 - r3 * r3) / (2.0 * r1 * r2))
        .clamp(-1.0, 1.0)
        .acos()
}

/// Right-handed rotation of `angle` radians about `axis`.
///
/// An axis shorter than [`SMALL_MAGNITUDE`] has no direction, so the identity is returned.
pub fn rotation_matrix(angle: f64, axis: &Vector3<f64>) -> Matrix3<f64> {
    if axis.norm() < SMALL_MAGNITUDE {
        return Matrix3::identity();
    }
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle).into_inner()
}

pub fn transform_array(m: &Matrix3<f64>, points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    #[cfg(not(feature = "parallel"))]
    let iterator = points.iter();

    #[cfg(feature = "parallel")]
    let iterator = points.par_iter();

    iterator.map(|p| m * p).collect()
}

pub fn translate_array(offset: &Vector3<f64>, points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    #[cfg(not(feature = "parallel"))]
    let iterator = points.iter();

    #[cfg(feature = "parallel")]
    let iterator = points.par_iter();

    iterator.map(|p| p + offset).collect()
}

/// Arithmetic mean of a point set, or `None` for an empty set.
pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| distance_sq(p1, p2))
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    fn assert_vec_eq(a: &Vector3<f64>, b: &Vector3<f64>) {
        assert!((a - b).norm() < EPS, "{a:?} != {b:?}");
    }

    #[test]
    fn distance_and_squared_distance_agree() {
        let a = Point3::new(3.0, 4.0, 0.0);
        let b = Point3::new(6.0, 8.0, 0.0);
        assert_eq!(distance(&a, &b), 5.0);
        assert_eq!(distance_sq(&a, &b), 25.0);
        assert_eq!(
            distance_sq(&Point3::new(3.0, 3.0, 3.0), &Point3::new(2.0, 2.0, 2.0)),
            3.0
        );
    }

    #[test]
    fn inverse_transform_uses_transposed_matrix() {
        let m = Matrix3::new(4.0, 8.0, 15.0, 16.0, 23.0, 42.0, 1984.0, 1.0, 10.0);
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert_vec_eq(&inverse_transform(&m, &v), &(m.transpose() * v));
        assert_vec_eq(&transform(&m, &v), &(m * v));
    }

    #[test]
    fn normalize_returns_null_vector_for_tiny_input() {
        assert_vec_eq(&normalize(&Vector3::new(3.0, 4.0, 0.0)), &Vector3::new(0.6, 0.8, 0.0));
        assert_eq!(normalize(&Vector3::new(1e-5, 0.0, 0.0)), Vector3::zeros());
    }

    #[test]
    fn normalize_failsafe_returns_x_axis_for_tiny_input() {
        assert_eq!(normalize_failsafe(&Vector3::zeros()), Vector3::x());
        assert_vec_eq(
            &normalize_failsafe(&Vector3::new(0.0, 0.0, 2.0)),
            &Vector3::z(),
        );
    }

    #[test]
    fn project_and_remove_component_split_a_vector() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        let n = Vector3::z();
        let parallel = project(&v, &n);
        let perpendicular = remove_component(&v, &n);
        assert_vec_eq(&parallel, &Vector3::new(0.0, 0.0, 3.0));
        assert_vec_eq(&perpendicular, &Vector3::new(1.0, 2.0, 0.0));
        assert_vec_eq(&(parallel + perpendicular), &v);
    }

    #[test]
    fn orthonormal_system_is_orthonormal_and_follows_first_axis() {
        let frame = orthonormal_system(&Vector3::new(2.0, 0.0, 0.0), &Vector3::new(1.0, 1.0, 0.0));
        assert!((frame * frame.transpose() - Matrix3::identity()).norm() < EPS);
        assert_vec_eq(&frame.row(0).transpose(), &Vector3::x());
        assert_vec_eq(&frame.row(1).transpose(), &Vector3::y());
        assert_vec_eq(&frame.row(2).transpose(), &Vector3::z());
    }

    #[test]
    fn angle_helpers_handle_regular_and_degenerate_inputs() {
        assert!((angle_between(&Vector3::x(), &Vector3::y()) - FRAC_PI_2).abs() < EPS);
        assert!((angle_between(&Vector3::zeros(), &Vector3::y()) - FRAC_PI_2).abs() < EPS);

        let right = angle_formed_by(
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::origin(),
            &Point3::new(0.0, 1.0, 0.0),
        );
        assert!((right - FRAC_PI_2).abs() < EPS);

        let straight = angle_formed_by(
            &Point3::new(-1.0, 0.0, 0.0),
            &Point3::origin(),
            &Point3::new(1.0, 0.0, 0.0),
        );
        assert_eq!(straight, PI);
    }

    #[test]
    fn rotation_matrix_rotates_right_handed_and_ignores_null_axis() {
        let m = rotation_matrix(FRAC_PI_2, &Vector3::new(0.0, 0.0, 5.0));
        assert_vec_eq(&(m * Vector3::x()), &Vector3::y());
        assert_eq!(rotation_matrix(1.0, &Vector3::zeros()), Matrix3::identity());
    }

    #[test]
    fn transform_about_point_keeps_pivot_fixed() {
        let m = rotation_matrix(PI, &Vector3::z());
        let pivot = Point3::new(1.0, 1.0, 0.0);
        let moved = transform_about_point(&m, &Point3::new(2.0, 1.0, 0.0), &pivot);
        assert!((moved - Point3::new(0.0, 1.0, 0.0)).norm() < EPS);
        assert!((transform_about_point(&m, &pivot, &pivot) - pivot).norm() < EPS);
    }

    #[test]
    fn array_helpers_map_every_point() {
        let points = vec![Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 2.0, 0.0)];
        let scaled = transform_array(&(Matrix3::identity() * 2.0), &points);
        assert_eq!(scaled, vec![Point3::new(2.0, 0.0, 0.0), Point3::new(0.0, 4.0, 0.0)]);

        let shifted = translate_array(&Vector3::new(0.0, 0.0, 1.0), &points);
        assert_eq!(shifted, vec![Point3::new(1.0, 0.0, 1.0), Point3::new(0.0, 2.0, 1.0)]);
    }

    #[test]
    fn centroid_and_rmsd_reject_empty_input() {
        assert!(centroid(&[]).is_none());
        assert!(calculate_rmsd(&[], &[]).is_none());
        assert!(calculate_rmsd(&[Point3::origin()], &[]).is_none());

        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, 6.0)];
        assert_eq!(centroid(&points), Some(Point3::new(1.0, 2.0, 3.0)));

        let shifted = [Point3::new(1.0, 0.0, 0.0), Point3::new(3.0, 4.0, 6.0)];
        assert_eq!(calculate_rmsd(&points, &shifted), Some(1.0));
    }
}
