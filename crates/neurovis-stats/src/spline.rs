//! Cubic spline resampling for time courses
//!
//! Uses the not-a-knot end condition: the third derivative is continuous
//! across the second and the second-to-last knot. The knot system only
//! depends on the sample positions, so it is factorized once and reused for
//! every channel sampled on the same time axis.

use nalgebra::{DMatrix, DVector, Dyn, LU};

use crate::error::{StatsError, StatsResult};

/// `num` evenly spaced values from `start` to `stop` inclusive
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| if i == num - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// A not-a-knot cubic spline basis over fixed, strictly increasing knots
pub struct CubicSpline {
    knots: Vec<f64>,
    widths: Vec<f64>,
    system: LU<f64, Dyn, Dyn>,
}

impl CubicSpline {
    /// Minimum number of knots for a not-a-knot spline
    pub const MIN_KNOTS: usize = 4;

    /// Build the spline basis for the given knot positions
    pub fn new(knots: &[f64]) -> StatsResult<Self> {
        let n = knots.len();
        if n < Self::MIN_KNOTS {
            return Err(StatsError::InvalidInput(format!(
                "cubic interpolation needs at least {} samples, got {}",
                Self::MIN_KNOTS,
                n
            )));
        }

        let widths: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();
        if widths.iter().any(|h| !(*h > 0.0)) {
            return Err(StatsError::InvalidInput(
                "spline knots must be strictly increasing".to_string(),
            ));
        }

        let h = &widths;
        let mut a = DMatrix::<f64>::zeros(n, n);

        a[(0, 0)] = h[1];
        a[(0, 1)] = -(h[0] + h[1]);
        a[(0, 2)] = h[0];

        for i in 1..n - 1 {
            a[(i, i - 1)] = h[i - 1];
            a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
            a[(i, i + 1)] = h[i];
        }

        a[(n - 1, n - 3)] = h[n - 2];
        a[(n - 1, n - 2)] = -(h[n - 3] + h[n - 2]);
        a[(n - 1, n - 1)] = h[n - 3];

        let system = a.lu();
        if !system.is_invertible() {
            return Err(StatsError::InvalidInput(
                "spline knot system is singular".to_string(),
            ));
        }

        Ok(Self {
            knots: knots.to_vec(),
            widths,
            system,
        })
    }

    /// Knot positions
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Second derivatives of the spline through `values` at each knot
    pub fn second_derivatives(&self, values: &[f64]) -> StatsResult<Vec<f64>> {
        let n = self.knots.len();
        if values.len() != n {
            return Err(StatsError::shape_mismatch(&[n], &[values.len()]));
        }

        let h = &self.widths;
        let mut rhs = DVector::<f64>::zeros(n);
        for i in 1..n - 1 {
            rhs[i] = 6.0
                * ((values[i + 1] - values[i]) / h[i] - (values[i] - values[i - 1]) / h[i - 1]);
        }

        let m = self.system.solve(&rhs).ok_or_else(|| {
            StatsError::InvalidInput("spline knot system is singular".to_string())
        })?;
        Ok(m.iter().copied().collect())
    }

    /// Evaluate the spline through `values` at each point of `at`
    ///
    /// Points outside the knot range extrapolate with the end polynomials.
    pub fn evaluate(&self, values: &[f64], at: &[f64]) -> StatsResult<Vec<f64>> {
        let m = self.second_derivatives(values)?;
        let x = &self.knots;
        let last = x.len() - 2;

        Ok(at
            .iter()
            .map(|&t| {
                let i = x.partition_point(|k| *k <= t).saturating_sub(1).min(last);
                let h = self.widths[i];
                let left = x[i + 1] - t;
                let right = t - x[i];
                m[i] * left.powi(3) / (6.0 * h)
                    + m[i + 1] * right.powi(3) / (6.0 * h)
                    + (values[i] / h - m[i] * h / 6.0) * left
                    + (values[i + 1] / h - m[i + 1] * h / 6.0) * right
            })
            .collect())
    }
}
