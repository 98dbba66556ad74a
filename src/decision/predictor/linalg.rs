//! Small dense-matrix helpers for ordinary least squares. The feature
//! dimension here is fixed and small (§3's `FeatureVector::DIMENSIONS`
//! plus a bias term), so a hand-rolled Gauss-Jordan inverse is used
//! instead of pulling in a linear-algebra crate (see DESIGN.md).

/// Invert a square matrix via Gauss-Jordan elimination with partial
/// pivoting. Returns `None` if the matrix is (numerically) singular.
pub fn invert(matrix: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    if n == 0 || matrix.iter().any(|row| row.len() != n) {
        return None;
    }

    let mut aug: Vec<Vec<f64>> = matrix
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut r = row.clone();
            r.resize(2 * n, 0.0);
            r[n + i] = 1.0;
            r
        })
        .collect();

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&a, &b| {
            aug[a][col].abs().partial_cmp(&aug[b][col].abs()).unwrap()
        })?;
        if aug[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        aug.swap(col, pivot_row);

        let pivot = aug[col][col];
        for v in aug[col].iter_mut() {
            *v /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[row][col];
            if factor != 0.0 {
                for k in 0..2 * n {
                    aug[row][k] -= factor * aug[col][k];
                }
            }
        }
    }

    Some(aug.into_iter().map(|row| row[n..].to_vec()).collect())
}

/// `A^T * A` for an `m x n` matrix `a`, returning the `n x n` result.
pub fn gram(a: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = a[0].len();
    let mut out = vec![vec![0.0; n]; n];
    for row in a {
        for i in 0..n {
            for j in 0..n {
                out[i][j] += row[i] * row[j];
            }
        }
    }
    out
}

/// `A^T * y` for an `m x n` matrix `a` and length-`m` vector `y`.
pub fn transpose_mul_vec(a: &[Vec<f64>], y: &[f64]) -> Vec<f64> {
    let n = a[0].len();
    let mut out = vec![0.0; n];
    for (row, &yi) in a.iter().zip(y) {
        for (j, &aij) in row.iter().enumerate() {
            out[j] += aij * yi;
        }
    }
    out
}

/// `matrix * vector`.
pub fn mat_vec_mul(matrix: &[Vec<f64>], vector: &[f64]) -> Vec<f64> {
    matrix
        .iter()
        .map(|row| row.iter().zip(vector).map(|(a, b)| a * b).sum())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverts_identity_to_identity() {
        let identity = vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
        ];
        let inv = invert(&identity).unwrap();
        assert!((inv[0][0] - 1.0).abs() < 1e-9);
        assert!((inv[1][1] - 1.0).abs() < 1e-9);
        assert!(inv[0][1].abs() < 1e-9);
    }

    #[test]
    fn singular_matrix_returns_none() {
        let singular = vec![
            vec![1.0, 2.0],
            vec![2.0, 4.0],
        ];
        assert!(invert(&singular).is_none());
    }

    #[test]
    fn solves_a_known_2x2_system() {
        // [2 0; 0 2] inverse is [0.5 0; 0 0.5]
        let m = vec![vec![2.0, 0.0], vec![0.0, 2.0]];
        let inv = invert(&m).unwrap();
        assert!((inv[0][0] - 0.5).abs() < 1e-9);
        assert!((inv[1][1] - 0.5).abs() < 1e-9);
    }
}
