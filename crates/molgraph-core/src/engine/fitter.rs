use super::config::FitConfig;
use super::error::FitError;
use crate::core::utils::geometry::{calculate_rmsd, centroid, transform_array, translate_array};
use nalgebra::{Matrix3, Point3};
use tracing::{debug, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Outcome of a rigid-body superposition of a source point set onto a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    /// Centroid of the target set (`t1`).
    pub target_centroid: Point3<f64>,
    /// Centroid of the source set (`t2`).
    pub source_centroid: Point3<f64>,
    /// Rotation taking centered source points onto centered target points.
    pub rotation: Matrix3<f64>,
    /// Root-mean-square deviation after superposition.
    pub rmsd: f64,
}

impl FitResult {
    /// Maps each point `p` to `t1 + R (t2 + p)`.
    ///
    /// The source centroid is added, not subtracted: callers holding raw source
    /// coordinates are expected to have translated them by `-2 t2` (or otherwise
    /// compensated) beforehand.
    pub fn apply(&self, points: &[Point3<f64>]) -> Vec<Point3<f64>> {
        let t1 = self.target_centroid;
        let t2 = self.source_centroid.coords;
        let m = self.rotation;

        #[cfg(not(feature = "parallel"))]
        let iterator = points.iter();

        #[cfg(feature = "parallel")]
        let iterator = points.par_iter();

        iterator.map(|p| t1 + m * (t2 + p.coords)).collect()
    }
}

/// Least-squares superposition by iterated planar rotations of the correlation matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fitter {
    config: FitConfig,
}

impl Fitter {
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Computes the translation and rotation superimposing `source` onto `target`.
    ///
    /// # Errors
    ///
    /// - [`FitError::LengthMismatch`] if the sets differ in length.
    /// - [`FitError::Empty`] if both sets are empty.
    /// - [`FitError::NonConvergence`] if the configured iteration cap is reached
    ///   before the correlation matrix becomes symmetric within tolerance.
    #[instrument(skip_all, name = "superposition", fields(points = target.len()))]
    pub fn fit(
        &self,
        target: &[Point3<f64>],
        source: &[Point3<f64>],
    ) -> Result<FitResult, FitError> {
        if target.len() != source.len() {
            return Err(FitError::LengthMismatch {
                target: target.len(),
                source_len: source.len(),
            });
        }
        let (Some(t1), Some(t2)) = (centroid(target), centroid(source)) else {
            return Err(FitError::Empty);
        };

        let mut corr = Matrix3::zeros();
        for (t, s) in target.iter().zip(source) {
            corr += (s - t2) * (t - t1).transpose();
        }
        let mut rot = Matrix3::identity();
        let tol = self.config.tolerance;

        let mut iterations = 0;
        while iterations < self.config.max_iterations {
            iterations += 1;
            let iy = iterations % 3;
            let iz = (iterations + 1) % 3;
            let sig = corr[(iz, iy)] - corr[(iy, iz)];
            let gam = corr[(iy, iy)] + corr[(iz, iz)];
            let sg = sig.hypot(gam);

            if sg != 0.0 && sig.abs() > tol * gam.abs() {
                rotate_rows(&mut corr, iy, iz, sig, gam, sg);
                rotate_rows(&mut rot, iy, iz, sig, gam, sg);
                continue;
            }

            let centered_target = translate_array(&-t1.coords, target);
            let centered_source = translate_array(&-t2.coords, source);
            let rotated_source = transform_array(&rot, &centered_source);
            let rmsd = calculate_rmsd(&centered_target, &rotated_source).unwrap_or(0.0);
            debug!(iterations, rmsd, "Superposition converged");
            return Ok(FitResult {
                target_centroid: t1,
                source_centroid: t2,
                rotation: rot,
                rmsd,
            });
        }

        warn!(iterations, "Superposition did not converge");
        Err(FitError::NonConvergence { iterations })
    }

    /// Same as [`Fitter::fit`], for raw coordinate rows.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`Fitter::fit`], returns
    /// [`FitError::InvalidDimension`] for any row that does not hold exactly three
    /// coordinates.
    pub fn fit_slices<T, S>(&self, target: &[T], source: &[S]) -> Result<FitResult, FitError>
    where
        T: AsRef<[f64]>,
        S: AsRef<[f64]>,
    {
        if target.len() != source.len() {
            return Err(FitError::LengthMismatch {
                target: target.len(),
                source_len: source.len(),
            });
        }
        let target = to_points(target)?;
        let source = to_points(source)?;
        self.fit(&target, &source)
    }
}

/// Superimposes `source` onto `target` with the default configuration.
pub fn fit(target: &[Point3<f64>], source: &[Point3<f64>]) -> Result<FitResult, FitError> {
    Fitter::default().fit(target, source)
}

/// Applies a fit to a point array; see [`FitResult::apply`].
pub fn fit_apply(result: &FitResult, points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    result.apply(points)
}

fn rotate_rows(m: &mut Matrix3<f64>, iy: usize, iz: usize, sig: f64, gam: f64, sg: f64) {
    for i in 0..3 {
        let bb = gam * m[(iy, i)] + sig * m[(iz, i)];
        let cc = gam * m[(iz, i)] - sig * m[(iy, i)];
        m[(iy, i)] = bb / sg;
        m[(iz, i)] = cc / sg;
    }
}

fn to_points<R: AsRef<[f64]>>(rows: &[R]) -> Result<Vec<Point3<f64>>, FitError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| match row.as_ref() {
            &[x, y, z] => Ok(Point3::new(x, y, z)),
            other => Err(FitError::InvalidDimension {
                index,
                dimension: other.len(),
            }),
        })
        .collect()
}
