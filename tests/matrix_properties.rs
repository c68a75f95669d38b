use ferrite_evo::{AddPolicy, Matrix, Network, NnError};
use proptest::prelude::*;

fn matrix_of(rows: usize, cols: usize) -> impl Strategy<Value = Matrix> {
    proptest::collection::vec(-100.0f32..100.0, rows * cols).prop_map(move |data| {
        Matrix::from_vec(rows, cols, data).expect("Test data should be valid")
    })
}

/// Any shape up to 7x7, including empty ones.
fn matrix_strategy() -> impl Strategy<Value = Matrix> {
    (0usize..8, 0usize..8).prop_flat_map(|(rows, cols)| matrix_of(rows, cols))
}

/// A non-empty batch and a single bias row of the same width.
fn batch_and_bias() -> impl Strategy<Value = (Matrix, Matrix)> {
    (1usize..8, 1usize..8).prop_flat_map(|(rows, cols)| (matrix_of(rows, cols), matrix_of(1, cols)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn zeros_reads_back_zero(rows in 0usize..8, cols in 0usize..8) {
        let m = Matrix::zeros(rows, cols);
        prop_assert_eq!(m.shape(), (rows, cols));
        for i in 0..rows {
            for j in 0..cols {
                prop_assert_eq!(m.get(i, j).unwrap(), 0.0);
            }
        }
        prop_assert!(m.get(rows, 0).is_err());
    }

    #[test]
    fn transpose_swaps_indices_and_round_trips(m in matrix_strategy()) {
        let t = m.transposed();
        prop_assert_eq!(t.shape(), (m.cols(), m.rows()));
        for i in 0..m.rows() {
            for j in 0..m.cols() {
                prop_assert_eq!(t.get(j, i).unwrap(), m.get(i, j).unwrap());
            }
        }
        prop_assert_eq!(t.transposed(), m);
    }

    #[test]
    fn multiply_succeeds_iff_inner_dimensions_agree(
        r1 in 0usize..6, c1 in 0usize..6, r2 in 0usize..6, c2 in 0usize..6,
    ) {
        let a = Matrix::zeros(r1, c1);
        let b = Matrix::zeros(r2, c2);
        match a.multiply(&b) {
            Ok(c) => {
                prop_assert_eq!(c1, r2);
                prop_assert_eq!(c.shape(), (r1, c2));
            }
            Err(NnError::DimensionMismatch { left, right, .. }) => {
                prop_assert_ne!(c1, r2);
                prop_assert_eq!(left, (r1, c1));
                prop_assert_eq!(right, (r2, c2));
            }
            Err(e) => prop_assert!(false, "unexpected error {}", e),
        }
    }

    #[test]
    fn multiply_by_identity_is_identity(m in matrix_strategy()) {
        let n = m.cols();
        let mut eye = Matrix::zeros(n, n);
        for i in 0..n {
            eye.set(i, i, 1.0).unwrap();
        }
        prop_assert_eq!(m.multiply(&eye).unwrap(), m);
    }

    #[test]
    fn broadcast_add_offsets_every_row((batch, bias) in batch_and_bias()) {
        let sum = batch.add_with(&bias, AddPolicy::Broadcast).unwrap();
        prop_assert_eq!(sum.shape(), batch.shape());
        for i in 0..batch.rows() {
            for j in 0..batch.cols() {
                prop_assert_eq!(sum.get(i, j).unwrap(), batch.get(i, j).unwrap() + bias.get(0, j).unwrap());
            }
        }
        if batch.rows() > 1 {
            prop_assert!(batch.add_with(&bias, AddPolicy::Strict).is_err());
        }
    }

    #[test]
    fn failed_subtract_leaves_operands_untouched(a in matrix_strategy(), b in matrix_strategy()) {
        prop_assume!(a.shape() != b.shape());
        let (before_a, before_b) = (a.clone(), b.clone());
        let mut lhs = a;
        prop_assert!(lhs.subtract_assign(&b).is_err());
        prop_assert_eq!(lhs, before_a);
        prop_assert_eq!(b, before_b);
    }

    #[test]
    fn network_layer_count_matches_sizes(sizes in proptest::collection::vec(1usize..6, 2..6)) {
        let nn = Network::new(&sizes).unwrap();
        prop_assert_eq!(nn.layers().len(), sizes.len() - 1);
        for (layer, pair) in nn.layers().iter().zip(sizes.windows(2)) {
            prop_assert_eq!(layer.weights.shape(), (pair[0], pair[1]));
            prop_assert_eq!(layer.biases.shape(), (1, pair[1]));
        }
        prop_assert_eq!(nn.input_size(), sizes[0]);
        prop_assert_eq!(nn.output_size(), sizes[sizes.len() - 1]);
    }
}
