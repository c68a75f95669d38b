use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Mean squared error.
///
/// Both reductions divide by the column count only, never by `rows * cols`:
/// each row's squared error is averaged over its outputs, and rows are then
/// kept apart (`per_row`) or summed (`total`).
pub struct MseLoss;

/// How the per-row loss vector is collapsed into one fitness score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reduction {
    /// Sum of the row losses; equal to [`MseLoss::total`].
    #[default]
    Sum,
    /// Mean of the row losses.
    Mean,
}

impl MseLoss {
    /// `rows x 1` column vector: `sum_j (p_ij - t_ij)^2 / cols` for each row.
    pub fn per_row(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        Self::check(predicted, expected, "MseLoss::per_row")?;

        let cols = predicted.cols();
        if cols == 0 {
            return Ok(Matrix::zeros(predicted.rows(), 1));
        }
        let values = (0..predicted.rows())
            .map(|i| {
                let p = &predicted.as_slice()[i * cols..(i + 1) * cols];
                let t = &expected.as_slice()[i * cols..(i + 1) * cols];
                squared_sum(p, t) / cols as f32
            })
            .collect();

        Matrix::from_vec(predicted.rows(), 1, values)
    }

    /// Squared differences over the whole matrix, divided once by `cols`.
    pub fn total(predicted: &Matrix, expected: &Matrix) -> Result<f32> {
        Self::check(predicted, expected, "MseLoss::total")?;
        if predicted.cols() == 0 {
            return Ok(0.0);
        }
        Ok(squared_sum(predicted.as_slice(), expected.as_slice()) / predicted.cols() as f32)
    }

    /// Per-row loss collapsed with `reduction`. Lower is better.
    pub fn reduce(predicted: &Matrix, expected: &Matrix, reduction: Reduction) -> Result<f32> {
        let rows = Self::per_row(predicted, expected)?;
        Ok(match reduction {
            Reduction::Sum => rows.sum(),
            Reduction::Mean if rows.rows() == 0 => 0.0,
            Reduction::Mean => rows.sum() / rows.rows() as f32,
        })
    }

    fn check(predicted: &Matrix, expected: &Matrix, op: &'static str) -> Result<()> {
        if predicted.shape() != expected.shape() {
            return Err(NnError::mismatch(op, predicted.shape(), expected.shape()));
        }
        Ok(())
    }
}

fn squared_sum(predicted: &[f32], expected: &[f32]) -> f32 {
    predicted.iter().zip(expected)
        .map(|(a, b)| (a - b).powi(2))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample() -> (Matrix, Matrix) {
        let predicted = Matrix::from_vec(4, 2, vec![
            0.0, 0.0,
            1.0, 1.0,
            0.5, 0.5,
            0.75, 0.75,
        ]).unwrap();
        let target = Matrix::from_vec(4, 2, vec![
            0.0, 0.0,
            0.0, 1.0,
            1.0, 0.0,
            1.0, 1.0,
        ]).unwrap();
        (predicted, target)
    }

    #[test]
    fn per_row_divides_by_columns() {
        let (predicted, target) = sample();
        let actual = MseLoss::per_row(&predicted, &target).unwrap();
        assert_eq!(actual.shape(), (4, 1));
        assert_abs_diff_eq!(actual.as_slice(), &[0.0, 0.5, 0.25, 0.0625][..], epsilon = 1e-6);
    }

    #[test]
    fn total_divides_by_columns_only() {
        let (predicted, target) = sample();
        let total = MseLoss::total(&predicted, &target).unwrap();
        assert_abs_diff_eq!(total, 0.8125, epsilon = 1e-6);
    }

    #[test]
    fn reductions() {
        let (predicted, target) = sample();
        let sum = MseLoss::reduce(&predicted, &target, Reduction::Sum).unwrap();
        let mean = MseLoss::reduce(&predicted, &target, Reduction::Mean).unwrap();
        assert_abs_diff_eq!(sum, MseLoss::total(&predicted, &target).unwrap(), epsilon = 1e-6);
        assert_abs_diff_eq!(mean, 0.8125 / 4.0, epsilon = 1e-6);
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let a = Matrix::zeros(4, 2);
        let b = Matrix::zeros(2, 4);
        assert!(matches!(MseLoss::per_row(&a, &b), Err(NnError::DimensionMismatch { .. })));
        assert!(MseLoss::total(&a, &b).is_err());
        assert!(MseLoss::reduce(&a, &Matrix::zeros(4, 1), Reduction::Mean).is_err());
    }
}
