use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, NnError>;

/// Everything that can go wrong inside the matrix engine and the network.
///
/// All variants abort the operation that produced them. Nothing in the crate
/// catches or converts these; a shape mismatch deep inside a forward pass
/// surfaces unchanged from `Network::predict` and `Network::train`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NnError {
    /// Operand shapes are incompatible for `op`. Shapes are `(rows, cols)`.
    #[error("{op}: dimension mismatch ({}x{} vs {}x{})", .left.0, .left.1, .right.0, .right.1)]
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("index ({row}, {col}) out of range for {rows}x{cols} matrix")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl NnError {
    pub(crate) fn mismatch(op: &'static str, left: (usize, usize), right: (usize, usize)) -> Self {
        NnError::DimensionMismatch { op, left, right }
    }
}
