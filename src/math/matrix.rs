use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

use crate::error::{NnError, Result};
use crate::math::rng;

/// How [`Matrix::add_with`] treats operands with different row counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AddPolicy {
    /// Rows and columns must both match.
    Strict,
    /// Columns must match; the operand with fewer rows repeats its rows
    /// cyclically, so a `1 x n` bias row can be added to an `m x n` batch.
    #[default]
    Broadcast,
}

/// Dense row-major `f32` matrix.
///
/// Element `(row, col)` lives at `data[row * cols + col]`. The default value is
/// the empty `0 x 0` matrix, which owns no allocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixRepr")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

/// Unchecked wire form; deserialization goes through [`Matrix::from_vec`].
#[derive(Deserialize)]
struct MatrixRepr {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl TryFrom<MatrixRepr> for Matrix {
    type Error = NnError;

    fn try_from(repr: MatrixRepr) -> Result<Matrix> {
        Matrix::from_vec(repr.rows, repr.cols, repr.data)
    }
}

impl Matrix {
    /// # Panics
    /// Panics if `rows * cols` overflows `usize`, like any oversized `Vec`.
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        let len = rows.checked_mul(cols).expect("matrix size overflows usize");
        Matrix {
            rows,
            cols,
            data: vec![0.0; len],
        }
    }

    /// Same as [`Matrix::zeros`].
    pub fn new(rows: usize, cols: usize) -> Matrix {
        Matrix::zeros(rows, cols)
    }

    /// Builds a matrix from row-major `values`.
    ///
    /// On a length mismatch the error's `right` is `(values.len(), 0)`: the
    /// buffer length, not a shape.
    pub fn from_vec(rows: usize, cols: usize, values: Vec<f32>) -> Result<Matrix> {
        if rows.checked_mul(cols) != Some(values.len()) {
            return Err(NnError::mismatch("Matrix::from_vec", (rows, cols), (values.len(), 0)));
        }
        Ok(Matrix { rows, cols, data: values })
    }

    /// Allocates a `rows x cols` matrix filled with uniform draws in `[low, high]`.
    pub fn random(rows: usize, cols: usize, low: f32, high: f32) -> Result<Matrix> {
        let mut res = Matrix::zeros(rows, cols);
        res.randomize(low, high)?;
        Ok(res)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major view of the whole buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable row-major view. The shape cannot change through it.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        self.data.iter()
    }

    /// Borrows row `row` as a slice.
    pub fn row(&self, row: usize) -> Result<&[f32]> {
        if row >= self.rows {
            return Err(self.out_of_range(row, 0));
        }
        Ok(&self.data[row * self.cols..(row + 1) * self.cols])
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f32> {
        let idx = self.offset(row, col)?;
        Ok(self.data[idx])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        let idx = self.offset(row, col)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Moves the contents out, leaving `self` as the empty `0 x 0` matrix.
    pub fn take(&mut self) -> Matrix {
        std::mem::take(self)
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Overwrites every cell with an independent uniform draw in `[low, high]`
    /// taken from the process-wide random source.
    pub fn randomize(&mut self, low: f32, high: f32) -> Result<()> {
        let dist = uniform(low, high)?;
        rng::with_rng(|rng| {
            for x in self.data.iter_mut() {
                *x = dist.sample(rng);
            }
        });
        Ok(())
    }

    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    pub fn transposed(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f32) -> f32,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Adds `other` under the default [`AddPolicy::Broadcast`] policy.
    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        self.add_with(other, AddPolicy::default())
    }

    pub fn add_with(&self, other: &Matrix, policy: AddPolicy) -> Result<Matrix> {
        let rows = self.sum_rows(other, policy, "Matrix::add")?;
        let mut res = Matrix::zeros(rows, self.cols);

        for i in 0..rows {
            let lhs = self.cyclic_row(i);
            let rhs = other.cyclic_row(i);
            let out = &mut res.data[i * self.cols..(i + 1) * self.cols];
            for ((o, a), b) in out.iter_mut().zip(lhs).zip(rhs) {
                *o = a + b;
            }
        }

        Ok(res)
    }

    /// In-place [`Matrix::add`]. Under broadcasting `self` keeps its shape, so it
    /// must have at least as many rows as `other`.
    pub fn add_assign(&mut self, other: &Matrix) -> Result<()> {
        self.add_assign_with(other, AddPolicy::default())
    }

    pub fn add_assign_with(&mut self, other: &Matrix, policy: AddPolicy) -> Result<()> {
        let rows = self.sum_rows(other, policy, "Matrix::add_assign")?;
        if rows != self.rows {
            return Err(NnError::mismatch("Matrix::add_assign", self.shape(), other.shape()));
        }

        let cols = self.cols;
        for i in 0..rows {
            let rhs = other.cyclic_row(i);
            for (o, b) in self.data[i * cols..(i + 1) * cols].iter_mut().zip(rhs) {
                *o += b;
            }
        }

        Ok(())
    }

    pub fn subtract(&self, other: &Matrix) -> Result<Matrix> {
        self.ensure_same_shape(other, "Matrix::subtract")?;

        let data = self.data.iter().zip(&other.data).map(|(a, b)| a - b).collect();
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    pub fn subtract_assign(&mut self, other: &Matrix) -> Result<()> {
        self.ensure_same_shape(other, "Matrix::subtract_assign")?;

        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a -= b;
        }
        Ok(())
    }

    /// Matrix product `self * other`.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(NnError::mismatch("Matrix::multiply", self.shape(), other.shape()));
        }

        let n = other.cols;
        let mut res = Matrix::zeros(self.rows, n);

        // i-k-j order: the innermost loop walks contiguous rows of `other` and `res`.
        for i in 0..self.rows {
            let out = &mut res.data[i * n..(i + 1) * n];
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                let rhs = &other.data[k * n..(k + 1) * n];
                for (o, b) in out.iter_mut().zip(rhs) {
                    *o += a * b;
                }
            }
        }

        Ok(res)
    }

    /// Elementwise scale by `scalar`.
    pub fn scale(&self, scalar: f32) -> Matrix {
        self.map(|x| x * scalar)
    }

    fn offset(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(self.out_of_range(row, col));
        }
        Ok(row * self.cols + col)
    }

    fn out_of_range(&self, row: usize, col: usize) -> NnError {
        NnError::IndexOutOfRange {
            row,
            col,
            rows: self.rows,
            cols: self.cols,
        }
    }

    fn ensure_same_shape(&self, other: &Matrix, op: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(NnError::mismatch(op, self.shape(), other.shape()));
        }
        Ok(())
    }

    /// Row count of `self + other` under `policy`, or the mismatch error.
    fn sum_rows(&self, other: &Matrix, policy: AddPolicy, op: &'static str) -> Result<usize> {
        match policy {
            AddPolicy::Strict => {
                self.ensure_same_shape(other, op)?;
                Ok(self.rows)
            }
            AddPolicy::Broadcast => {
                // A zero-row operand has nothing to repeat.
                let one_side_empty = (self.rows == 0) != (other.rows == 0);
                if self.cols != other.cols || one_side_empty {
                    return Err(NnError::mismatch(op, self.shape(), other.shape()));
                }
                Ok(self.rows.max(other.rows))
            }
        }
    }

    /// Row `i % rows`; only called on matrices with at least one row.
    fn cyclic_row(&self, i: usize) -> &[f32] {
        let r = i % self.rows;
        &self.data[r * self.cols..(r + 1) * self.cols]
    }
}

impl Mul<f32> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: f32) -> Self::Output {
        self.scale(rhs)
    }
}

impl Mul<f32> for Matrix {
    type Output = Matrix;

    fn mul(mut self, rhs: f32) -> Self::Output {
        for x in self.data.iter_mut() {
            *x *= rhs;
        }
        self
    }
}

/// Uniform distribution over `[low, high]`, rejecting bounds `rand` would panic on:
/// non-finite or inverted bounds, and spans that overflow `f32`.
pub(crate) fn uniform(low: f32, high: f32) -> Result<Uniform<f32>> {
    if !(low.is_finite() && high.is_finite() && low <= high && (high - low).is_finite()) {
        return Err(NnError::InvalidConfiguration(format!(
            "invalid uniform range [{low}, {high}]"
        )));
    }
    Ok(Uniform::new_inclusive(low, high))
}
