//! Significant-digit rounding.
//!
//! Fitted parameters are reported to a fixed number of significant digits
//! (not decimal places):
//!
//! ```text
//! round(x, s) = round(x · 10^(s − ⌈log10|x|⌉)) / 10^(s − ⌈log10|x|⌉)
//! ```
//!
//! with `x == 0` mapped to `0`.

use num_traits::Float;

/// Round to a number of significant digits.
///
/// # Examples
///
/// ```
/// use curvefit_core::math::rounding::RoundToSignificant;
///
/// assert!((123456.789_f64.round_to_significant(4) - 123500.0).abs() < 1e-9);
/// assert_eq!(0.0_f64.round_to_significant(9), 0.0);
/// assert!((0.000123456_f64.round_to_significant(2) - 0.00012).abs() < 1e-15);
/// ```
pub trait RoundToSignificant: Sized {
    /// Round `self` to `digits` significant digits.
    fn round_to_significant(self, digits: u32) -> Self;
}

impl<T: Float> RoundToSignificant for T {
    fn round_to_significant(self, digits: u32) -> Self {
        if self == T::zero() || !self.is_finite() {
            return self;
        }
        let Some(ten) = T::from(10.0) else {
            return self;
        };
        let magnitude = self.abs().log10().ceil();
        let Some(magnitude) = magnitude.to_i32() else {
            return self;
        };
        let exponent = digits as i32 - magnitude;

        // Keep the scale factor an exact power of ten on the side it is applied
        if exponent >= 0 {
            let factor = ten.powi(exponent);
            if !factor.is_finite() {
                return self;
            }
            (self * factor).round() / factor
        } else {
            let factor = ten.powi(-exponent);
            if !factor.is_finite() {
                return self;
            }
            (self / factor).round() * factor
        }
    }
}
