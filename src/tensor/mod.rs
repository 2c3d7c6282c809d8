//! Host tensors used by the attention kernels
//!
//! A [`Tensor`] is a contiguous, row-major `f32` buffer plus a [`TensorShape`].
//! Attention inputs use the `[batch, heads, seq_len, head_dim]` layout; a single
//! head is viewed as a 2-D `[seq_len, head_dim]` [`MatrixView`] borrowed from
//! the parent buffer, so kernels never copy their inputs.

pub mod matmul;

use crate::attention::{AttentionError, AttentionResult};

/// Row-major shape descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorShape {
    dims: Vec<usize>,
    strides: Vec<usize>,
}

impl TensorShape {
    /// Create tensor shape from dimensions, computing row-major strides
    pub fn from_dims(dims: &[usize]) -> Self {
        let mut strides = vec![0usize; dims.len()];
        let mut acc = 1usize;
        for i in (0..dims.len()).rev() {
            strides[i] = acc;
            acc = acc.saturating_mul(dims[i]);
        }
        Self {
            dims: dims.to_vec(),
            strides,
        }
    }

    /// Attention layout `[batch, heads, seq_len, head_dim]`
    pub fn attention(batch: usize, heads: usize, seq_len: usize, head_dim: usize) -> Self {
        Self::from_dims(&[batch, heads, seq_len, head_dim])
    }

    /// 2-D `[rows, cols]` shape for intermediate matrices
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self::from_dims(&[rows, cols])
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements, `None` on overflow
    pub fn checked_numel(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Total number of elements (saturating)
    pub fn numel(&self) -> usize {
        self.checked_numel().unwrap_or(usize::MAX)
    }

    /// Interpret as `[batch, heads, seq_len, head_dim]`
    pub fn as_attention_dims(&self) -> AttentionResult<(usize, usize, usize, usize)> {
        match self.dims.as_slice() {
            &[b, h, s, d] => Ok((b, h, s, d)),
            other => Err(AttentionError::InvalidShape(format!(
                "expected rank-4 [batch, heads, seq_len, head_dim], got {:?}",
                other
            ))),
        }
    }
}

/// Owned row-major `f32` tensor
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    shape: TensorShape,
}

impl Tensor {
    /// Wrap a buffer, checking that its length matches the shape
    pub fn new(data: Vec<f32>, shape: TensorShape) -> AttentionResult<Self> {
        let expected = checked_len(&shape)?;
        if data.len() != expected {
            return Err(AttentionError::InvalidShape(format!(
                "buffer has {} elements but shape {:?} needs {}",
                data.len(),
                shape.dims(),
                expected
            )));
        }
        Ok(Self { data, shape })
    }

    /// Convenience constructor from a dims slice
    pub fn from_vec(data: Vec<f32>, dims: &[usize]) -> AttentionResult<Self> {
        Self::new(data, TensorShape::from_dims(dims))
    }

    /// Zero-filled tensor; `InvalidShape` if the shape overflows usize
    pub fn zeros(shape: TensorShape) -> AttentionResult<Self> {
        let len = checked_len(&shape)?;
        Ok(Self {
            data: vec![0.0; len],
            shape,
        })
    }

    /// Tensor whose element `i` (flat index) is `f(i)`
    pub fn from_fn(shape: TensorShape, f: impl FnMut(usize) -> f32) -> AttentionResult<Self> {
        let len = checked_len(&shape)?;
        let data = (0..len).map(f).collect();
        Ok(Self { data, shape })
    }

    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Element at a multi-dimensional index
    pub fn get(&self, index: &[usize]) -> Option<f32> {
        if index.len() != self.shape.rank() {
            return None;
        }
        let mut offset = 0usize;
        for ((&i, &dim), &stride) in index
            .iter()
            .zip(self.shape.dims())
            .zip(self.shape.strides())
        {
            if i >= dim {
                return None;
            }
            offset += i * stride;
        }
        self.data.get(offset).copied()
    }

    /// Borrow the `[seq_len, head_dim]` matrix of one (batch, head) pair
    pub fn head(&self, batch: usize, head: usize) -> AttentionResult<MatrixView<'_>> {
        let (b, h, s, d) = self.shape.as_attention_dims()?;
        if batch >= b || head >= h {
            return Err(AttentionError::InvalidShape(format!(
                "head ({}, {}) out of range for [{}, {}, {}, {}]",
                batch, head, b, h, s, d
            )));
        }
        let stride = s * d;
        let offset = (batch * h + head) * stride;
        Ok(MatrixView::new(&self.data[offset..offset + stride], s, d))
    }
}

fn checked_len(shape: &TensorShape) -> AttentionResult<usize> {
    shape.checked_numel().ok_or_else(|| {
        AttentionError::InvalidShape(format!("shape {:?} overflows usize", shape.dims()))
    })
}

/// Borrowed row-major 2-D view
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a> {
    data: &'a [f32],
    rows: usize,
    cols: usize,
}

impl<'a> MatrixView<'a> {
    /// Caller guarantees `data.len() == rows * cols`
    pub fn new(data: &'a [f32], rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    #[inline]
    pub fn row(&self, i: usize) -> &'a [f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Rows `[start, end)` as a new view
    pub fn row_range(&self, start: usize, end: usize) -> MatrixView<'a> {
        MatrixView::new(&self.data[start * self.cols..end * self.cols], end - start, self.cols)
    }
}
