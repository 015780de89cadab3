//! Butterworth low-pass design and zero-phase filtering
//!
//! The design follows the usual analog-prototype route: Butterworth poles on
//! the unit circle, frequency pre-warping, low-pass scaling and the bilinear
//! transform into the z-plane. Filtering runs forward and backward with
//! odd-symmetric edge padding and steady-state initial conditions, so the
//! result has no phase shift.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};

/// Transfer-function coefficients `b / a` of a digital IIR filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCoefficients {
    /// Numerator coefficients
    pub b: Vec<f64>,
    /// Denominator coefficients, `a[0]` is 1 after normalization
    pub a: Vec<f64>,
}

impl FilterCoefficients {
    /// Filter order
    pub fn order(&self) -> usize {
        self.a.len().max(self.b.len()).saturating_sub(1)
    }

    /// Gain at zero frequency
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    fn normalized(&self) -> StatsResult<(Vec<f64>, Vec<f64>)> {
        let a0 = *self
            .a
            .first()
            .ok_or_else(|| StatsError::InvalidInput("empty denominator".to_string()))?;
        if a0 == 0.0 {
            return Err(StatsError::InvalidInput(
                "first denominator coefficient must be non-zero".to_string(),
            ));
        }

        let len = self.a.len().max(self.b.len());
        let mut b: Vec<f64> = self.b.iter().map(|v| v / a0).collect();
        let mut a: Vec<f64> = self.a.iter().map(|v| v / a0).collect();
        b.resize(len, 0.0);
        a.resize(len, 0.0);
        Ok((b, a))
    }
}

/// Expand the monic polynomial with the given roots
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for r in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (j, c) in coeffs.iter().enumerate() {
            next[j] += *c;
            next[j + 1] -= *r * *c;
        }
        coeffs = next;
    }
    coeffs
}

/// Design a digital Butterworth low-pass filter
///
/// `cutoff` is normalized to the Nyquist frequency and must lie in (0, 1).
pub fn butter_lowpass(order: usize, cutoff: f64) -> StatsResult<FilterCoefficients> {
    if order == 0 {
        return Err(StatsError::InvalidInput(
            "filter order must be at least 1".to_string(),
        ));
    }
    if !(cutoff > 0.0 && cutoff < 1.0) {
        return Err(StatsError::InvalidInput(format!(
            "normalized cutoff must be in (0, 1), got {}",
            cutoff
        )));
    }

    let n = order as f64;

    // Analog prototype poles, left half plane
    let prototype: Vec<Complex64> = (0..order)
        .map(|i| {
            let m = -(order as f64) + 1.0 + 2.0 * i as f64;
            -Complex64::from_polar(1.0, std::f64::consts::PI * m / (2.0 * n))
        })
        .collect();

    // Pre-warp for a sampling rate of 2 (Nyquist = 1)
    let fs = 2.0;
    let warped = 2.0 * fs * (std::f64::consts::PI * cutoff / fs).tan();

    let poles: Vec<Complex64> = prototype.iter().map(|p| *p * warped).collect();
    let gain = warped.powi(order as i32);

    // Bilinear transform
    let fs2 = Complex64::new(2.0 * fs, 0.0);
    let z_poles: Vec<Complex64> = poles.iter().map(|p| (fs2 + *p) / (fs2 - *p)).collect();
    let z_zeros = vec![Complex64::new(-1.0, 0.0); order];
    let denom: Complex64 = poles.iter().map(|p| fs2 - *p).product();
    let z_gain = gain * (Complex64::new(1.0, 0.0) / denom).re;

    let b = poly(&z_zeros).iter().map(|c| c.re * z_gain).collect();
    let a = poly(&z_poles).iter().map(|c| c.re).collect();

    tracing::debug!(order, cutoff, "designed Butterworth low-pass");
    Ok(FilterCoefficients { b, a })
}

/// Run the filter over `x` (direct form II transposed)
///
/// `zi` is the initial delay-line state, one entry per filter order.
pub fn lfilter(coeffs: &FilterCoefficients, x: &[f64], zi: Option<&[f64]>) -> StatsResult<Vec<f64>> {
    let (b, a) = coeffs.normalized()?;
    let order = b.len() - 1;

    let mut z = match zi {
        Some(state) if state.len() == order => state.to_vec(),
        Some(state) => return Err(StatsError::shape_mismatch(&[order], &[state.len()])),
        None => vec![0.0; order],
    };

    let mut y = Vec::with_capacity(x.len());
    for &xn in x {
        let yn = b[0] * xn + z.first().copied().unwrap_or(0.0);
        for i in 0..order {
            let carry = if i + 1 < order { z[i + 1] } else { 0.0 };
            z[i] = b[i + 1] * xn + carry - a[i + 1] * yn;
        }
        y.push(yn);
    }
    Ok(y)
}

/// Steady-state delay-line state for a unit step input
pub fn lfilter_zi(coeffs: &FilterCoefficients) -> StatsResult<Vec<f64>> {
    let (b, a) = coeffs.normalized()?;
    let order = b.len() - 1;
    if order == 0 {
        return Ok(Vec::new());
    }

    // I - companion(a)^T
    let mut system = DMatrix::<f64>::identity(order, order);
    for i in 0..order {
        system[(i, 0)] += a[i + 1];
        if i + 1 < order {
            system[(i, i + 1)] -= 1.0;
        }
    }

    let rhs = DVector::from_iterator(order, (0..order).map(|i| b[i + 1] - a[i + 1] * b[0]));
    let zi = system.lu().solve(&rhs).ok_or_else(|| {
        StatsError::InvalidInput("filter initial-condition system is singular".to_string())
    })?;
    Ok(zi.iter().copied().collect())
}

/// Zero-phase forward-backward filtering
///
/// The signal is extended at both ends by `3 * (order + 1)` samples of odd
/// reflection, which must be shorter than the signal itself.
pub fn filtfilt(coeffs: &FilterCoefficients, x: &[f64]) -> StatsResult<Vec<f64>> {
    let pad = 3 * (coeffs.order() + 1);
    let n = x.len();
    if n <= pad {
        return Err(StatsError::InvalidInput(format!(
            "signal of length {} is too short for zero-phase filtering (needs more than {})",
            n, pad
        )));
    }

    let first = x[0];
    let last = x[n - 1];
    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - x[i]));
    extended.extend_from_slice(x);
    extended.extend((1..=pad).map(|i| 2.0 * last - x[n - 1 - i]));

    let zi = lfilter_zi(coeffs)?;

    let scaled: Vec<f64> = zi.iter().map(|z| z * extended[0]).collect();
    let mut forward = lfilter(coeffs, &extended, Some(&scaled))?;

    forward.reverse();
    let scaled: Vec<f64> = zi.iter().map(|z| z * forward[0]).collect();
    let mut backward = lfilter(coeffs, &forward, Some(&scaled))?;
    backward.reverse();

    Ok(backward[pad..pad + n].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_order_matches_closed_form() {
        // First-order Butterworth at Wn = 0.5: b = [0.5, 0.5], a = [1, 0]
        let f = butter_lowpass(1, 0.5).unwrap();
        assert!((f.b[0] - 0.5).abs() < 1e-12);
        assert!((f.b[1] - 0.5).abs() < 1e-12);
        assert!((f.a[0] - 1.0).abs() < 1e-12);
        assert!(f.a[1].abs() < 1e-12);
    }

    #[test]
    fn test_fourth_order_has_unit_dc_gain() {
        let f = butter_lowpass(4, 0.12).unwrap();
        assert_eq!(f.b.len(), 5);
        assert_eq!(f.a.len(), 5);
        assert!((f.a[0] - 1.0).abs() < 1e-12);
        assert!((f.dc_gain() - 1.0).abs() < 1e-9);
        // Numerator is k * (1 + z^-1)^4
        assert!((f.b[2] / f.b[0] - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_cutoff_must_be_normalized() {
        assert!(butter_lowpass(4, 0.0).is_err());
        assert!(butter_lowpass(4, 1.0).is_err());
        assert!(butter_lowpass(4, f64::INFINITY).is_err());
        assert!(butter_lowpass(0, 0.3).is_err());
    }

    #[test]
    fn test_lfilter_zi_gives_steady_state() {
        let f = butter_lowpass(4, 0.2).unwrap();
        let zi = lfilter_zi(&f).unwrap();
        let step = vec![1.0; 50];
        let y = lfilter(&f, &step, Some(&zi)).unwrap();
        for v in y {
            assert!((v - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_filtfilt_keeps_constant_signal() {
        let f = butter_lowpass(4, 0.12).unwrap();
        let x = vec![0.42; 200];
        let y = filtfilt(&f, &x).unwrap();
        assert_eq!(y.len(), 200);
        for v in y {
            assert!((v - 0.42).abs() < 1e-9);
        }
    }

    #[test]
    fn test_filtfilt_attenuates_high_frequency() {
        let f = butter_lowpass(4, 0.05).unwrap();
        let x: Vec<f64> = (0..400)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let y = filtfilt(&f, &x).unwrap();
        let peak = y[150..250].iter().fold(0.0f64, |m, v| m.max(v.abs()));
        assert!(peak < 1e-2);
    }

    #[test]
    fn test_filtfilt_rejects_short_signal() {
        let f = butter_lowpass(4, 0.12).unwrap();
        assert!(filtfilt(&f, &[1.0; 15]).is_err());
    }
}
