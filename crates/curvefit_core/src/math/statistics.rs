//! Goodness-of-fit statistics shared by the linear and nonlinear fitters.
//!
//! - Sums of squares and the coefficient of determination
//! - Residual-based outlier detection ([`OutlierRule`], [`detect_outliers`])

/// Sum of squared values.
#[inline]
pub fn sum_of_squares(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sum of squared deviations from the mean (`0` for an empty slice).
pub fn total_sum_of_squares(values: &[f64]) -> f64 {
    match mean(values) {
        Some(m) => values.iter().map(|v| (v - m) * (v - m)).sum(),
        None => 0.0,
    }
}

/// `R² = 1 − SSE/SST`.
///
/// A constant dependent variable (`SST == 0`) yields `1` when it is fitted
/// exactly and `0` otherwise, so the result is always finite.
pub fn coefficient_of_determination(sse: f64, sst: f64) -> f64 {
    if sst > 0.0 {
        1.0 - sse / sst
    } else if sse == 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Threshold rule for flagging outlying residuals.
///
/// A residual is an outlier when its magnitude is at least
/// `standard_deviation * confidence_multiplier` **and** at least `floor`.
/// The floor keeps near-exact fits (tiny standard deviation) from flagging
/// round-off noise.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutlierRule {
    /// Standard-deviation multiplier (1.645 ≈ 90%, 1.96 ≈ 95%, 2.576 ≈ 99%).
    pub confidence_multiplier: f64,
    /// Absolute residual below which nothing is flagged.
    pub floor: f64,
}

impl OutlierRule {
    /// Create a rule.
    pub fn new(confidence_multiplier: f64, floor: f64) -> Self {
        Self {
            confidence_multiplier,
            floor,
        }
    }

    /// Whether `residual` is an outlier for the given standard deviation.
    #[inline]
    pub fn is_outlier(&self, residual: f64, standard_deviation: f64) -> bool {
        let magnitude = residual.abs();
        !(magnitude < standard_deviation * self.confidence_multiplier || magnitude < self.floor)
    }
}

/// One flagged sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outlier {
    /// Sample index in the input order.
    pub index: usize,
    /// Independent value of the sample.
    pub x: f64,
    /// Dependent value of the sample.
    pub y: f64,
    /// Residual `y − ŷ`.
    pub residual: f64,
}

/// Flag every sample whose residual breaks `rule`.
///
/// `x_values`, `y_values` and `residuals` are parallel; the shortest length
/// wins.
pub fn detect_outliers(
    x_values: &[f64],
    y_values: &[f64],
    residuals: &[f64],
    standard_deviation: f64,
    rule: &OutlierRule,
) -> Vec<Outlier> {
    x_values
        .iter()
        .zip(y_values)
        .zip(residuals)
        .enumerate()
        .filter(|(_, (_, &r))| rule.is_outlier(r, standard_deviation))
        .map(|(index, ((&x, &y), &residual))| Outlier {
            index,
            x,
            y,
            residual,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sums_of_squares() {
        assert_eq!(sum_of_squares(&[1.0, -2.0, 3.0]), 14.0);
        assert_eq!(sum_of_squares(&[]), 0.0);
        assert_abs_diff_eq!(total_sum_of_squares(&[1.0, 2.0, 3.0]), 2.0, epsilon = 1e-12);
        assert_eq!(total_sum_of_squares(&[]), 0.0);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_coefficient_of_determination() {
        assert_abs_diff_eq!(coefficient_of_determination(1.0, 4.0), 0.75, epsilon = 1e-12);
        assert_eq!(coefficient_of_determination(0.0, 0.0), 1.0);
        assert_eq!(coefficient_of_determination(2.0, 0.0), 0.0);
        // Worse than the mean
        assert!(coefficient_of_determination(8.0, 4.0) < 0.0);
    }

    #[test]
    fn test_outlier_rule_requires_both_thresholds() {
        let rule = OutlierRule::new(2.0, 1e-6);
        assert!(rule.is_outlier(3.0, 1.0));
        assert!(rule.is_outlier(-3.0, 1.0));
        assert!(rule.is_outlier(2.0, 1.0)); // boundary is flagged
        assert!(!rule.is_outlier(1.9, 1.0));
        // Near-exact fit: tiny residual exceeds 2σ but sits under the floor
        assert!(!rule.is_outlier(1e-9, 1e-12));
    }

    #[test]
    fn test_detect_outliers() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 10.0, 3.0];
        let r = [0.1, -0.1, 7.0, 0.05];
        let found = detect_outliers(&x, &y, &r, 1.0, &OutlierRule::new(1.96, 1e-10));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].index, 2);
        assert_eq!(found[0].y, 10.0);
        assert_eq!(found[0].residual, 7.0);
    }
}
