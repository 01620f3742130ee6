//! End-to-end regression workflow through the public API.

use approx::assert_abs_diff_eq;
use curvefit_core::math::matrix::DenseMatrix;
use curvefit_regression::{
    correlation_matrix, variance_inflation_factors, LinearRegression, RegressionConfig,
    RegressionError,
};
use proptest::prelude::*;

/// Three process variables with a deterministic wobble on the response.
fn process_data() -> (DenseMatrix, DenseMatrix) {
    let mut rows = Vec::new();
    let mut y = Vec::new();
    for i in 0..12 {
        let t = f64::from(i);
        let temperature = 300.0 + 5.0 * t;
        let pressure = 1.0 + ((t * 1.3).sin() + 1.0) * 0.5;
        let flow = 10.0 + (t * 0.7).cos() * 2.0;
        let wobble = if i % 3 == 0 { 0.05 } else { -0.025 };
        rows.push(vec![temperature, pressure, flow]);
        y.push(2.0 + 0.1 * temperature - 4.0 * pressure + 0.5 * flow + wobble);
    }
    (
        DenseMatrix::from_rows(&rows).unwrap(),
        DenseMatrix::column_vector(&y),
    )
}

#[test]
fn test_process_regression() {
    let (x, y) = process_data();
    let fit = LinearRegression::with_defaults().fit(&x, &y).unwrap();

    assert_abs_diff_eq!(fit.coefficients[1], 0.1, epsilon = 0.01);
    assert_abs_diff_eq!(fit.coefficients[2], -4.0, epsilon = 0.2);
    assert_abs_diff_eq!(fit.coefficients[3], 0.5, epsilon = 0.1);
    assert!(fit.r_squared > 0.99);
    assert!(fit.adjusted_r_squared <= fit.r_squared);
    assert_eq!(fit.vifs, variance_inflation_factors(&x).unwrap());
    assert_eq!(fit.correlation, correlation_matrix(&x).unwrap());
    assert_eq!(fit.corrected_dependents(1).unwrap().len(), 12);
}

#[test]
fn test_config_from_toml() {
    let config = RegressionConfig::from_toml_str(
        r#"
        confidence_multiplier = 2.576
        outlier_floor = 1e-8
        "#,
    )
    .unwrap();
    let regressor = LinearRegression::new(config);
    assert_eq!(regressor.config().confidence_multiplier, 2.576);

    let (x, y) = process_data();
    assert!(regressor.fit(&x, &y).is_ok());
}

#[test]
fn test_collinear_independents_fail() {
    let x = DenseMatrix::from_rows(&[
        vec![1.0, 2.0],
        vec![2.0, 4.0],
        vec![3.0, 6.0],
        vec![4.0, 8.0],
    ])
    .unwrap();
    let y = DenseMatrix::column_vector(&[1.0, 2.0, 3.5, 4.0]);
    assert!(matches!(
        LinearRegression::with_defaults().fit(&x, &y),
        Err(RegressionError::Solver(_))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_simple_line_recovered(
        intercept in -10.0f64..10.0,
        slope in -10.0f64..10.0,
    ) {
        let xs: Vec<f64> = (0..6).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|x| intercept + slope * x).collect();
        let fit = LinearRegression::with_defaults()
            .fit(&DenseMatrix::column_vector(&xs), &DenseMatrix::column_vector(&ys))
            .unwrap();

        prop_assert!((fit.intercept - intercept).abs() < 1e-8);
        prop_assert!((fit.slope - slope).abs() < 1e-8);
        prop_assert!(fit.outliers.is_empty());
    }
}
