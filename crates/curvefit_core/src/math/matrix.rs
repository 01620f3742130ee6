//! Dense row-major matrix of `f64`.
//!
//! [`DenseMatrix`] is the single matrix type used throughout curvefit. Storage
//! is a flat `Vec<f64>` whose length always equals `rows * cols`; element
//! `(r, c)` lives at `r * cols + c`.
//!
//! Arithmetic never mutates its operands: every operation returns a freshly
//! owned matrix. Only indexed assignment, wholesale value replacement and the
//! row/column removal helpers mutate in place.
//!
//! # Example
//!
//! ```
//! use curvefit_core::math::matrix::DenseMatrix;
//!
//! let m = DenseMatrix::from_rows(&[vec![4.0, 7.0], vec![2.0, 6.0]]).unwrap();
//! let inv = m.invert().unwrap();
//! let identity = m.multiply(&inv).unwrap();
//!
//! assert!((identity.get(0, 0).unwrap() - 1.0).abs() < 1e-12);
//! assert!(identity.get(0, 1).unwrap().abs() < 1e-12);
//! ```

use std::fmt;

use crate::types::MatrixError;

/// Dense matrix with row-major flat storage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl DenseMatrix {
    /// Create a `rows x cols` matrix filled with zeros.
    ///
    /// # Errors
    ///
    /// `InvalidShape` if `rows * cols` overflows `usize`.
    pub fn new(rows: usize, cols: usize) -> Result<Self, MatrixError> {
        let len = checked_len(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            values: vec![0.0; len],
        })
    }

    /// Create a matrix from row-major values.
    ///
    /// # Errors
    ///
    /// `InvalidShape` if `values.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self, MatrixError> {
        let len = checked_len(rows, cols)?;
        if values.len() != len {
            return Err(MatrixError::InvalidShape {
                rows,
                cols,
                reason: format!("expected {} values, got {}", len, values.len()),
            });
        }
        Ok(Self { rows, cols, values })
    }

    /// Create a matrix from a slice of rows.
    ///
    /// # Errors
    ///
    /// `InvalidShape` if the rows are ragged.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, MatrixError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(MatrixError::InvalidShape {
                    rows: n_rows,
                    cols: n_cols,
                    reason: format!("row {} has {} columns", i, row.len()),
                });
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            values,
        })
    }

    /// Create an `n x 1` column vector.
    pub fn column_vector(values: &[f64]) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            values: values.to_vec(),
        }
    }

    /// Create the `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
        }
        Self {
            rows: n,
            cols: n,
            values,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the matrix has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether `rows == cols`.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Row-major view of the elements.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Consume the matrix and return its row-major storage.
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    /// Replace all elements at once, keeping the shape.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if `values.len() != rows * cols`.
    pub fn set_values(&mut self, values: Vec<f64>) -> Result<(), MatrixError> {
        if values.len() != self.values.len() {
            return Err(MatrixError::ShapeMismatch {
                operation: "set_values".to_string(),
                left_rows: self.rows,
                left_cols: self.cols,
                right_rows: values.len(),
                right_cols: 1,
            });
        }
        self.values = values;
        Ok(())
    }

    /// Element at `(row, col)`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` outside `[0, rows) x [0, cols)`.
    pub fn get(&self, row: usize, col: usize) -> Result<f64, MatrixError> {
        let idx = self.index_of(row, col)?;
        Ok(self.values[idx])
    }

    /// Assign the element at `(row, col)`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` outside `[0, rows) x [0, cols)`.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), MatrixError> {
        let idx = self.index_of(row, col)?;
        self.values[idx] = value;
        Ok(())
    }

    /// Copy of row `row`.
    pub fn row(&self, row: usize) -> Result<Vec<f64>, MatrixError> {
        if row >= self.rows {
            return Err(self.out_of_range(row, 0));
        }
        let start = row * self.cols;
        Ok(self.values[start..start + self.cols].to_vec())
    }

    /// Copy of column `col`.
    pub fn column(&self, col: usize) -> Result<Vec<f64>, MatrixError> {
        if col >= self.cols {
            return Err(self.out_of_range(0, col));
        }
        Ok((0..self.rows)
            .map(|r| self.values[r * self.cols + col])
            .collect())
    }

    // ------------------------------------------------------------------
    // Elementwise arithmetic
    // ------------------------------------------------------------------

    /// Add `scalar` to every element.
    pub fn add_scalar(&self, scalar: f64) -> Self {
        self.map(|v| v + scalar)
    }

    /// Multiply every element by `scalar`.
    pub fn scale(&self, scalar: f64) -> Self {
        self.map(|v| v * scalar)
    }

    /// Elementwise sum.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` unless both operands have the same shape.
    pub fn add(&self, other: &Self) -> Result<Self, MatrixError> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    /// Elementwise difference `self - other`.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` unless both operands have the same shape.
    pub fn subtract(&self, other: &Self) -> Result<Self, MatrixError> {
        self.zip_with(other, "subtract", |a, b| a - b)
    }

    /// Matrix product `self * other`.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` unless `self.cols() == other.rows()`.
    pub fn multiply(&self, other: &Self) -> Result<Self, MatrixError> {
        if self.cols != other.rows {
            return Err(self.mismatch("multiply", other));
        }
        let (n, m, p) = (self.rows, self.cols, other.cols);
        let mut values = vec![0.0; n * p];
        for i in 0..n {
            let lhs_row = &self.values[i * m..(i + 1) * m];
            let out_row = &mut values[i * p..(i + 1) * p];
            for (k, &a) in lhs_row.iter().enumerate() {
                let rhs_row = &other.values[k * p..(k + 1) * p];
                for (out, &b) in out_row.iter_mut().zip(rhs_row) {
                    *out += a * b;
                }
            }
        }
        Ok(Self {
            rows: n,
            cols: p,
            values,
        })
    }

    /// Transpose.
    pub fn transpose(&self) -> Self {
        let mut values = vec![0.0; self.values.len()];
        for i in 0..self.rows {
            for j in 0..self.cols {
                values[j * self.rows + i] = self.values[i * self.cols + j];
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            values,
        }
    }

    /// Dot product treating both matrices as flat vectors.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if the element counts differ.
    pub fn dot(&self, other: &Self) -> Result<f64, MatrixError> {
        if self.values.len() != other.values.len() {
            return Err(self.mismatch("dot", other));
        }
        Ok(self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .sum())
    }

    // ------------------------------------------------------------------
    // Inversion
    // ------------------------------------------------------------------

    /// Inverse via LU decomposition with partial pivoting.
    ///
    /// Pivots are chosen by magnitude relative to the largest absolute
    /// element of their original row. A pivot is treated as zero when it
    /// does not exceed `n * f64::EPSILON` times that row maximum, so badly
    /// scaled but well-conditioned systems such as `diag(1e16, 1)` invert.
    ///
    /// # Errors
    ///
    /// - `NotSquare` for non-square input
    /// - `NonFiniteValue` if the input contains NaN or infinity
    /// - `SingularMatrix` on a numerically zero pivot or an overflowing inverse
    pub fn invert(&self) -> Result<Self, MatrixError> {
        let lu = LuDecomposition::new(self)?;
        let n = self.rows;
        let mut values = vec![0.0; n * n];
        let mut column = vec![0.0; n];
        for j in 0..n {
            column.iter_mut().for_each(|v| *v = 0.0);
            column[j] = 1.0;
            lu.solve_in_place(&mut column);
            for (i, &v) in column.iter().enumerate() {
                if !v.is_finite() {
                    return Err(MatrixError::SingularMatrix { column: j });
                }
                values[i * n + j] = v;
            }
        }
        Ok(Self {
            rows: n,
            cols: n,
            values,
        })
    }

    /// Same-shape matrix holding only the diagonal; `None` if not square.
    pub fn diagonal(&self) -> Option<Self> {
        if !self.is_square() {
            return None;
        }
        let n = self.rows;
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = self.values[i * n + i];
        }
        Some(Self {
            rows: n,
            cols: n,
            values,
        })
    }

    // ------------------------------------------------------------------
    // Reductions
    // ------------------------------------------------------------------

    /// Mean of all elements; `None` when empty.
    pub fn mean_value(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Largest element; `None` when empty.
    pub fn max_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Smallest element; `None` when empty.
    pub fn min_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    /// Row-major index of the smallest element; `None` when empty.
    ///
    /// Ties resolve to the first occurrence.
    pub fn argmin(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.values.iter().enumerate() {
            match best {
                Some((_, b)) if v >= b => {}
                _ => best = Some((i, v)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Largest absolute element; `0.0` when empty.
    pub fn infinity_norm(&self) -> f64 {
        self.values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
    }

    /// Euclidean norm over all elements.
    pub fn l2_norm(&self) -> f64 {
        // Scaled accumulation avoids overflow for large entries.
        let scale = self.infinity_norm();
        if scale == 0.0 || !scale.is_finite() {
            return scale;
        }
        let sum: f64 = self
            .values
            .iter()
            .map(|v| {
                let s = v / scale;
                s * s
            })
            .sum();
        scale * sum.sqrt()
    }

    /// Smallest value in column `col`.
    pub fn column_min(&self, col: usize) -> Result<f64, MatrixError> {
        self.column_reduce(col, f64::min)
    }

    /// Largest value in column `col`.
    pub fn column_max(&self, col: usize) -> Result<f64, MatrixError> {
        self.column_reduce(col, f64::max)
    }

    /// Mean of column `col`.
    pub fn column_mean(&self, col: usize) -> Result<f64, MatrixError> {
        let values = self.column(col)?;
        if values.is_empty() {
            return Err(self.out_of_range(0, col));
        }
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }

    // ------------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------------

    /// Remove row `row`, shrinking the row count by one.
    pub fn remove_row(&mut self, row: usize) -> Result<(), MatrixError> {
        if row >= self.rows {
            return Err(self.out_of_range(row, 0));
        }
        let start = row * self.cols;
        self.values.drain(start..start + self.cols);
        self.rows -= 1;
        Ok(())
    }

    /// Remove several rows; indices may be given in any order.
    ///
    /// All indices are validated before anything is removed.
    pub fn remove_rows(&mut self, rows: &[usize]) -> Result<(), MatrixError> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.rows) {
            return Err(self.out_of_range(bad, 0));
        }
        let mut sorted = rows.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        for row in sorted {
            self.remove_row(row)?;
        }
        Ok(())
    }

    /// Remove column `col`, shrinking the column count by one.
    pub fn remove_col(&mut self, col: usize) -> Result<(), MatrixError> {
        if col >= self.cols {
            return Err(self.out_of_range(0, col));
        }
        let cols = self.cols;
        let values = self
            .values
            .iter()
            .enumerate()
            .filter(|(i, _)| i % cols != col)
            .map(|(_, &v)| v)
            .collect();
        self.values = values;
        self.cols -= 1;
        Ok(())
    }

    /// First non-finite element, if any, as a `NonFiniteValue` error.
    pub fn ensure_finite(&self) -> Result<(), MatrixError> {
        match self.values.iter().position(|v| !v.is_finite()) {
            None => Ok(()),
            Some(idx) => Err(MatrixError::NonFiniteValue {
                row: idx / self.cols.max(1),
                col: idx % self.cols.max(1),
                value: self.values[idx],
            }),
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn index_of(&self, row: usize, col: usize) -> Result<usize, MatrixError> {
        if row >= self.rows || col >= self.cols {
            return Err(self.out_of_range(row, col));
        }
        Ok(row * self.cols + col)
    }

    fn out_of_range(&self, row: usize, col: usize) -> MatrixError {
        MatrixError::IndexOutOfRange {
            row,
            col,
            rows: self.rows,
            cols: self.cols,
        }
    }

    fn mismatch(&self, operation: &str, other: &Self) -> MatrixError {
        MatrixError::ShapeMismatch {
            operation: operation.to_string(),
            left_rows: self.rows,
            left_cols: self.cols,
            right_rows: other.rows,
            right_cols: other.cols,
        }
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    fn zip_with(
        &self,
        other: &Self,
        operation: &str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Self, MatrixError> {
        if self.shape() != other.shape() {
            return Err(self.mismatch(operation, other));
        }
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    fn column_reduce(&self, col: usize, f: impl Fn(f64, f64) -> f64) -> Result<f64, MatrixError> {
        self.column(col)?
            .into_iter()
            .reduce(f)
            .ok_or_else(|| self.out_of_range(0, col))
    }
}

impl fmt::Display for DenseMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            write!(f, "[")?;
            for c in 0..self.cols {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.values[r * self.cols + c])?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

fn checked_len(rows: usize, cols: usize) -> Result<usize, MatrixError> {
    rows.checked_mul(cols).ok_or_else(|| MatrixError::InvalidShape {
        rows,
        cols,
        reason: "element count overflows usize".to_string(),
    })
}

/// Packed LU factors of a square matrix with the row permutation applied.
struct LuDecomposition {
    n: usize,
    lu: Vec<f64>,
    perm: Vec<usize>,
}

impl LuDecomposition {
    fn new(matrix: &DenseMatrix) -> Result<Self, MatrixError> {
        if !matrix.is_square() {
            return Err(MatrixError::NotSquare {
                rows: matrix.rows,
                cols: matrix.cols,
            });
        }
        matrix.ensure_finite()?;

        let n = matrix.rows;
        let mut lu = matrix.values.clone();
        let mut perm: Vec<usize> = (0..n).collect();
        // Largest absolute element of each row, permuted alongside the rows
        let mut row_scale: Vec<f64> = matrix
            .values
            .chunks(n.max(1))
            .map(|row| row.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())))
            .collect();
        let tolerance = n as f64 * f64::EPSILON;

        for k in 0..n {
            // Scaled partial pivot: largest |a_rk| / max_c |a_rc| at or below the diagonal
            let (pivot_row, _) = (k..n)
                .map(|r| {
                    let scale = row_scale[r];
                    let ratio = if scale > 0.0 {
                        lu[r * n + k].abs() / scale
                    } else {
                        0.0
                    };
                    (r, ratio)
                })
                .fold((k, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });

            if pivot_row != k {
                for c in 0..n {
                    lu.swap(k * n + c, pivot_row * n + c);
                }
                perm.swap(k, pivot_row);
                row_scale.swap(k, pivot_row);
            }

            if lu[k * n + k].abs() <= tolerance * row_scale[k] {
                return Err(MatrixError::SingularMatrix { column: k });
            }

            let pivot = lu[k * n + k];
            for r in (k + 1)..n {
                let factor = lu[r * n + k] / pivot;
                lu[r * n + k] = factor;
                if factor == 0.0 {
                    continue;
                }
                for c in (k + 1)..n {
                    lu[r * n + c] -= factor * lu[k * n + c];
                }
            }
        }

        Ok(Self { n, lu, perm })
    }

    /// Overwrite `b` with the solution of `A x = b`.
    fn solve_in_place(&self, b: &mut [f64]) {
        let n = self.n;
        let permuted: Vec<f64> = self.perm.iter().map(|&p| b[p]).collect();
        b.copy_from_slice(&permuted);

        // Forward substitution with unit lower triangle
        for i in 0..n {
            let mut sum = b[i];
            for j in 0..i {
                sum -= self.lu[i * n + j] * b[j];
            }
            b[i] = sum;
        }

        // Back substitution
        for i in (0..n).rev() {
            let mut sum = b[i];
            for j in (i + 1)..n {
                sum -= self.lu[i * n + j] * b[j];
            }
            b[i] = sum / self.lu[i * n + i];
        }
    }
}
