//! Property tests: Strassen agrees with the naive kernel, and scratch usage
//! stays inside the sizing budget, across sizes, seeds and leaf cutoffs.

use matmul::matrix::generators::make_unit_matrix;
use matmul::{
    Matrix, MatrixKind, ScratchArena, StrassenConfig, gemm_naive, gemm_strassen,
    gemm_strassen_pow2_prealloc, strassen_scratch_bytes,
};
use proptest::prelude::*;

fn kind_strategy() -> impl Strategy<Value = MatrixKind> {
    prop_oneof![
        Just(MatrixKind::RandomUniform),
        Just(MatrixKind::SymmetricUniform),
        Just(MatrixKind::HermitianUniform),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    // Any square size, padded when needed, matches the naive product.
    #[test]
    fn strassen_matches_naive(
        n in 1usize..40,
        leaf in 1usize..10,
        seed in any::<u64>(),
        kind in kind_strategy(),
    ) {
        let a = make_unit_matrix::<f64>(n, n, kind, seed).unwrap();
        let b = make_unit_matrix::<f64>(n, n, MatrixKind::RandomUniform, seed.wrapping_add(1)).unwrap();

        let mut expected = Matrix::zeros(n, n).unwrap();
        let mut actual = Matrix::zeros(n, n).unwrap();
        gemm_naive(&a.view(), &b.view(), &mut expected.view_mut(), None).unwrap();
        gemm_strassen(
            &a.view(),
            &b.view(),
            &mut actual.view_mut(),
            None,
            StrassenConfig::default().with_leaf_size(leaf),
        )
        .unwrap();

        for (e, x) in expected.as_slice().iter().zip(actual.as_slice()) {
            prop_assert!((e - x).abs() <= 1e-9 * (1.0 + e.abs()), "expected {}, got {}", e, x);
        }
    }

    // The sized arena is never exceeded and always ends where it started.
    #[test]
    fn scratch_budget_holds(exp in 0u32..7, leaf in 1usize..8, seed in any::<u64>()) {
        let n = 1usize << exp;
        let budget = strassen_scratch_bytes::<f64>(n).unwrap();
        let mut arena = ScratchArena::<f64>::with_capacity(budget).unwrap();
        let a = make_unit_matrix::<f64>(n, n, MatrixKind::RandomUniform, seed).unwrap();
        let mut c = Matrix::zeros(n, n).unwrap();

        gemm_strassen_pow2_prealloc(
            &a.view(),
            &a.view(),
            &mut c.view_mut(),
            &mut arena,
            None,
            StrassenConfig::default().with_leaf_size(leaf),
        )
        .unwrap();

        prop_assert_eq!(arena.used_bytes(), 0);
        prop_assert!(arena.peak_bytes() <= budget);
    }
}
