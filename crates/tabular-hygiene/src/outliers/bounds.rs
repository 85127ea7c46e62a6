//! Quartile fences and distribution statistics.

use serde::Serialize;

/// Multiplier applied to the IQR to place the fences.
pub const FENCE_MULTIPLIER: f64 = 1.5;

/// IQR fences of one column, derived from its current values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    /// `1.5 × IQR`
    pub margin: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    pub fn from_quartiles(q1: f64, q3: f64) -> Self {
        let iqr = q3 - q1;
        let margin = iqr * FENCE_MULTIPLIER;
        Self {
            q1,
            q3,
            iqr,
            margin,
            lower: q1 - margin,
            upper: q3 + margin,
        }
    }

    /// Fences of ascending, NaN-free values. `None` when there are no values.
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        Some(Self::from_quartiles(
            quantile(sorted, 0.25)?,
            quantile(sorted, 0.75)?,
        ))
    }

    /// Strictly outside the fences.
    #[inline]
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }

    /// Nearest fence for out-of-range values, the value itself otherwise.
    #[inline]
    pub fn clip(&self, value: f64) -> f64 {
        if value < self.lower {
            self.lower
        } else if value > self.upper {
            self.upper
        } else {
            value
        }
    }
}

/// Linearly interpolated quantile of ascending values, position `(n − 1) × q`.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = last as f64 * q.clamp(0.0, 1.0);
    let below = position.floor() as usize;
    let above = position.ceil() as usize;
    let fraction = position - below as f64;
    Some(sorted[below] + (sorted[above] - sorted[below]) * fraction)
}

/// Population skewness (third standardized moment). 0 for constant input.
pub fn skewness(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let (m2, m3) = values.iter().fold((0.0, 0.0), |(m2, m3), v| {
        let d = v - mean;
        (m2 + d * d, m3 + d * d * d)
    });
    let (m2, m3) = (m2 / n, m3 / n);
    if m2 == 0.0 {
        0.0
    } else {
        m3 / m2.powf(1.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [10.0, 11.0, 12.0, 13.0, 1000.0];
        assert_eq!(quantile(&sorted, 0.25), Some(11.0));
        assert_eq!(quantile(&sorted, 0.5), Some(12.0));
        assert_eq!(quantile(&sorted, 0.75), Some(13.0));

        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile(&sorted, 0.75), Some(3.25));
    }

    #[test]
    fn test_quantile_edge_cases() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.25), Some(7.0));
    }

    #[test]
    fn test_bounds_reference_example() {
        let bounds = OutlierBounds::from_sorted(&[10.0, 11.0, 12.0, 13.0, 1000.0]).unwrap();
        assert_eq!(bounds.q1, 11.0);
        assert_eq!(bounds.q3, 13.0);
        assert_eq!(bounds.iqr, 2.0);
        assert_eq!(bounds.margin, 3.0);
        assert_eq!(bounds.lower, 8.0);
        assert_eq!(bounds.upper, 16.0);

        assert!(bounds.is_outlier(1000.0));
        assert!(!bounds.is_outlier(16.0));
        assert_eq!(bounds.clip(1000.0), 16.0);
        assert_eq!(bounds.clip(-5.0), 8.0);
        assert_eq!(bounds.clip(12.0), 12.0);
    }

    #[test]
    fn test_skewness() {
        assert_eq!(skewness(&[5.0, 5.0, 5.0]), 0.0);
        assert_eq!(skewness(&[]), 0.0);
        assert!(skewness(&[1.0, 2.0, 3.0]).abs() < 1e-12);
        assert!(skewness(&[10.0, 11.0, 12.0, 13.0, 1000.0]) > 1.0);
        assert!(skewness(&[-1000.0, 1.0, 2.0, 3.0]) < -1.0);
    }
}
