//! Sparse matrices assembled from triplets, stored with `faer`.

pub use faer::sparse::Triplet;

use crate::util::{MosaicError, MosaicResult};
use faer::sparse::SparseColMat;
use faer::Col;

/// Sparse matrix with products against `A` and `A^T`.
///
/// The transpose is assembled once alongside the matrix so both products are
/// plain column-major sparse-times-dense products.
#[derive(Clone, Debug)]
pub struct SparseMatrix {
    matrix: SparseColMat<usize, f64>,
    transposed: SparseColMat<usize, f64>,
}

impl SparseMatrix {
    /// Builds a `rows x cols` matrix from triplets; duplicates are summed.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        triplets: &[Triplet<usize, usize, f64>],
    ) -> MosaicResult<Self> {
        if triplets.iter().any(|t| t.row >= rows || t.col >= cols) {
            return Err(MosaicError::InvalidInput("triplet index outside the matrix"));
        }
        let swapped: Vec<Triplet<usize, usize, f64>> = triplets
            .iter()
            .map(|t| Triplet::new(t.col, t.row, t.val))
            .collect();

        let matrix = SparseColMat::try_new_from_triplets(rows, cols, triplets)
            .map_err(|_| MosaicError::InvalidInput("sparse matrix assembly failed"))?;
        let transposed = SparseColMat::try_new_from_triplets(cols, rows, &swapped)
            .map_err(|_| MosaicError::InvalidInput("sparse matrix assembly failed"))?;
        Ok(Self { matrix, transposed })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.matrix.ncols()
    }

    /// `y = A x`.
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.cols());
        debug_assert_eq!(y.len(), self.rows());
        product(&self.matrix, x, y);
    }

    /// `y = A^T x`.
    pub fn mul_vec_transposed(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.rows());
        debug_assert_eq!(y.len(), self.cols());
        product(&self.transposed, x, y);
    }
}

fn product(matrix: &SparseColMat<usize, f64>, x: &[f64], y: &mut [f64]) {
    let x = Col::from_fn(x.len(), |i| x[i]);
    let prod = matrix * &x;
    for (i, out) in y.iter_mut().enumerate() {
        *out = prod[i];
    }
}
