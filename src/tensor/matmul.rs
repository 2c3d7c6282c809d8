//! Row-major CPU matrix products used by the attention kernels
//!
//! Only the two shapes attention needs are provided:
//! - `A · Bᵀ` (query × key scores), where both operands are `[rows, k]`
//! - `A · B` (weights × values)

use super::MatrixView;
use thiserror::Error;

/// Matrix multiplication error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatmulError {
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("Buffer size mismatch: {0}")]
    BufferSizeError(String),
}

pub type MatmulResult<T> = Result<T, MatmulError>;

/// Dot product of two equal-length rows
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let mut acc = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        acc += x * y;
    }
    acc
}

/// `out[i][j] = scale * (a[i] · b[j])`
///
/// `a` is `[m, k]`, `b` is `[n, k]`, `out` is `[m, n]`.
pub fn matmul_transposed_scaled(
    a: MatrixView<'_>,
    b: MatrixView<'_>,
    scale: f32,
    out: &mut [f32],
) -> MatmulResult<()> {
    if a.cols() != b.cols() {
        return Err(MatmulError::DimensionMismatch(format!(
            "inner dims differ: a is [{}, {}], b is [{}, {}]",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols()
        )));
    }
    let (m, n) = (a.rows(), b.rows());
    if out.len() != m * n {
        return Err(MatmulError::BufferSizeError(format!(
            "output has {} elements, expected {}",
            out.len(),
            m * n
        )));
    }

    for (i, out_row) in out.chunks_exact_mut(n).enumerate() {
        let a_row = a.row(i);
        for (j, o) in out_row.iter_mut().enumerate() {
            *o = dot(a_row, b.row(j)) * scale;
        }
    }
    Ok(())
}

/// `out = a · b` where `a` is `[m, k]` (flat), `b` is `[k, n]`, `out` is `[m, n]`
pub fn matmul_into(a: &[f32], m: usize, b: MatrixView<'_>, out: &mut [f32]) -> MatmulResult<()> {
    let (k, n) = (b.rows(), b.cols());
    if a.len() != m * k {
        return Err(MatmulError::BufferSizeError(format!(
            "left operand has {} elements, expected {}x{}",
            a.len(),
            m,
            k
        )));
    }
    if out.len() != m * n {
        return Err(MatmulError::BufferSizeError(format!(
            "output has {} elements, expected {}x{}",
            out.len(),
            m,
            n
        )));
    }

    out.fill(0.0);
    for (a_row, out_row) in a.chunks_exact(k).zip(out.chunks_exact_mut(n)) {
        for (l, &w) in a_row.iter().enumerate() {
            if w == 0.0 {
                continue;
            }
            for (o, &bv) in out_row.iter_mut().zip(b.row(l)) {
                *o += w * bv;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matmul_transposed_identity() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let eye = [1.0, 0.0, 0.0, 1.0];
        let mut out = [0.0; 4];
        matmul_transposed_scaled(
            MatrixView::new(&a, 2, 2),
            MatrixView::new(&eye, 2, 2),
            1.0,
            &mut out,
        )
        .unwrap();
        assert_eq!(out, a);
    }

    #[test]
    fn test_matmul_transposed_scale() {
        let a = [1.0, 1.0];
        let b = [2.0, 3.0, 4.0, 5.0];
        let mut out = [0.0; 2];
        matmul_transposed_scaled(
            MatrixView::new(&a, 1, 2),
            MatrixView::new(&b, 2, 2),
            0.5,
            &mut out,
        )
        .unwrap();
        assert_eq!(out, [2.5, 4.5]);
    }

    #[test]
    fn test_matmul_into_2x3_3x2() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let mut out = [0.0; 4];
        matmul_into(&a, 2, MatrixView::new(&b, 3, 2), &mut out).unwrap();
        assert_eq!(out, [58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = [0.0; 6];
        let b = [0.0; 4];
        let mut out = [0.0; 4];
        let err = matmul_transposed_scaled(
            MatrixView::new(&a, 2, 3),
            MatrixView::new(&b, 2, 2),
            1.0,
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, MatmulError::DimensionMismatch(_)));
    }
}
