//! Multiple-comparisons correction for 3-D p-value maps
//!
//! Both corrections only look at *active* voxels (finite and non-zero).
//! The family size `n` is the number of active voxels in the map.
//!
//! - **FWE**: Bonferroni, `p * n`
//! - **FDR**: rank-based rescaling, `p * n / rank`

use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::is_active;

/// Values below this magnitude are treated as exactly zero by [`lim_to_zero`]
pub const ZERO_TOLERANCE: f64 = 1e-15;

/// Clamp values that are numerically indistinguishable from zero to 0
///
/// Anything below [`ZERO_TOLERANCE`] (including negative values) becomes 0.
pub fn lim_to_zero(x: f64) -> f64 {
    if x < ZERO_TOLERANCE {
        0.0
    } else {
        x
    }
}

/// Count the active voxels of a map
pub fn count_active(p: ArrayView3<f64>) -> usize {
    p.iter().filter(|v| is_active(**v)).count()
}

/// FWE (Bonferroni) correction
///
/// Every active p-value is multiplied by the number of active voxels.
/// Zero and NaN voxels pass through unchanged.
pub fn fwe_correct(p: ArrayView3<f64>) -> Array3<f64> {
    let n = count_active(p) as f64;
    let corrected = p.mapv(|v| if is_active(v) { v * n } else { v });

    tracing::info!(active_voxels = n as usize, "finished FWE correct");
    corrected
}

/// Rank convention used by [`fdr_correct_with`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FdrMethod {
    /// `p * n / (rank - 0.5)` with no monotonicity pass (the historical
    /// neurovis behaviour)
    #[default]
    HalfRank,
    /// Benjamini-Hochberg: `p * n / rank` followed by a step-down pass that
    /// makes corrected values non-decreasing in rank
    BenjaminiHochberg,
}

/// FDR correction with the default [`FdrMethod::HalfRank`] convention
pub fn fdr_correct(p: ArrayView3<f64>) -> Array3<f64> {
    fdr_correct_with(p, FdrMethod::default())
}

/// FDR correction
///
/// Active p-values are ranked ascending (ties keep scan order) and rescaled
/// according to `method`. Each corrected value is written back to the voxel it
/// came from. All inactive voxels (NaN or exactly zero) are NaN in the output.
pub fn fdr_correct_with(p: ArrayView3<f64>, method: FdrMethod) -> Array3<f64> {
    let mut corrected = Array3::from_elem(p.raw_dim(), f64::NAN);

    let active: Vec<((usize, usize, usize), f64)> = p
        .indexed_iter()
        .filter(|(_, v)| is_active(**v))
        .map(|(idx, v)| (idx, *v))
        .collect();

    let n = active.len();
    if n == 0 {
        tracing::warn!("FDR correction on a map without active voxels");
        return corrected;
    }

    // Stable ascending order of the active values
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| active[a].1.total_cmp(&active[b].1));

    let nf = n as f64;
    let mut values = vec![0.0; n];
    for (rank0, &i) in order.iter().enumerate() {
        let rank = match method {
            FdrMethod::HalfRank => rank0 as f64 + 0.5,
            FdrMethod::BenjaminiHochberg => rank0 as f64 + 1.0,
        };
        values[i] = active[i].1 * nf / rank;
    }

    if method == FdrMethod::BenjaminiHochberg {
        // Walk down from the largest rank, carrying the running minimum
        for w in (0..n.saturating_sub(1)).rev() {
            let upper = values[order[w + 1]];
            if upper < values[order[w]] {
                values[order[w]] = upper;
            }
        }
    }

    for ((idx, _), value) in active.iter().zip(values) {
        corrected[*idx] = value;
    }

    tracing::info!(active_voxels = n, ?method, "finished FDR correct");
    corrected
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn example_map() -> Array3<f64> {
        let mut p = Array3::zeros((2, 2, 1));
        p[[0, 0, 0]] = 0.01;
        p[[0, 1, 0]] = 0.02;
        p[[1, 0, 0]] = 0.0;
        p[[1, 1, 0]] = f64::NAN;
        p
    }

    #[test]
    fn test_lim_to_zero() {
        assert_eq!(lim_to_zero(1e-16), 0.0);
        assert_eq!(lim_to_zero(-3.0), 0.0);
        assert_eq!(lim_to_zero(0.5), 0.5);
    }

    #[test]
    fn test_fwe_example() {
        let out = fwe_correct(example_map().view());
        assert!((out[[0, 0, 0]] - 0.02).abs() < 1e-12);
        assert!((out[[0, 1, 0]] - 0.04).abs() < 1e-12);
        assert_eq!(out[[1, 0, 0]], 0.0);
        assert!(out[[1, 1, 0]].is_nan());
    }

    #[test]
    fn test_fdr_half_rank() {
        let out = fdr_correct(example_map().view());
        // n = 2: rank 1 -> p * 2 / 0.5, rank 2 -> p * 2 / 1.5
        assert!((out[[0, 0, 0]] - 0.04).abs() < 1e-12);
        assert!((out[[0, 1, 0]] - 0.04 / 1.5).abs() < 1e-12);
        assert!(out[[1, 0, 0]].is_nan());
        assert!(out[[1, 1, 0]].is_nan());
    }

    #[test]
    fn test_fdr_writes_back_to_source_voxel() {
        // Scan order is descending in value, so ranks are reversed
        let mut p = Array3::zeros((3, 1, 1));
        p[[0, 0, 0]] = 0.3;
        p[[1, 0, 0]] = 0.2;
        p[[2, 0, 0]] = 0.1;

        let out = fdr_correct(p.view());
        assert!((out[[2, 0, 0]] - 0.1 * 3.0 / 0.5).abs() < 1e-12);
        assert!((out[[1, 0, 0]] - 0.2 * 3.0 / 1.5).abs() < 1e-12);
        assert!((out[[0, 0, 0]] - 0.3 * 3.0 / 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_bh_step_down_is_monotone() {
        let mut p = Array3::zeros((4, 1, 1));
        p[[0, 0, 0]] = 0.010;
        p[[1, 0, 0]] = 0.011;
        p[[2, 0, 0]] = 0.040;
        p[[3, 0, 0]] = 0.041;

        let out = fdr_correct_with(p.view(), FdrMethod::BenjaminiHochberg);
        let vals: Vec<f64> = out.iter().copied().collect();
        for w in vals.windows(2) {
            assert!(w[0] <= w[1] + 1e-15);
        }
        // Largest rank keeps p * n / n
        assert!((vals[3] - 0.041).abs() < 1e-12);
    }

    #[test]
    fn test_fdr_without_active_voxels() {
        let p = Array3::<f64>::zeros((2, 2, 2));
        let out = fdr_correct(p.view());
        assert!(out.iter().all(|v| v.is_nan()));
    }
}
