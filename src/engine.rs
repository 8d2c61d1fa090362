// src/engine.rs

//! Rank-truncated reconstruction of a single grayscale matrix.
//!
//! The engine factorizes the matrix once, fuses the left singular vectors with
//! their singular values, and afterwards answers every `reconstruct(k)` with a
//! single truncated matrix product `fused[:, ..k] · vt[..k, :]`.

use crate::linalg_backends::{BackendSVD, LinAlgBackendProvider, ThinSVD};
use log::{debug, info, trace};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, LinalgScalar, ScalarOperand};
use num_traits::Float;
use std::error::Error;
use std::fmt;

/// Scalar types a grayscale matrix can be factorized in.
pub trait Intensity:
    Float + LinalgScalar + ScalarOperand + Into<f64> + fmt::Debug + fmt::Display + Send + Sync + 'static
{
}

impl Intensity for f32 {}
impl Intensity for f64 {}

/// Errors raised by the reconstruction engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The input matrix (or a caller supplied factorization) cannot be decomposed:
    /// it is empty, contains NaN or infinity, or the backend failed.
    Decomposition(String),
    /// A rank outside `[1, max_rank]` was requested.
    RankOutOfRange { rank: usize, max_rank: usize },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Decomposition(msg) => write!(f, "decomposition error: {msg}"),
            EngineError::RankOutOfRange { rank, max_rank } => {
                write!(f, "rank {rank} is outside the valid range [1, {max_rank}]")
            }
        }
    }
}

impl Error for EngineError {}

/// Economy-size SVD `A = U · diag(σ) · Vᵗ` of one grayscale matrix.
///
/// Invariant: `rank == singular_values.len() == left.ncols() == right_t.nrows()`
/// and `rank == min(rows, cols)`, with singular values non-negative and descending.
#[derive(Debug, Clone)]
pub struct Factorization<F: Intensity> {
    /// Shape: `(rows, rank)`
    left: Array2<F>,
    /// Shape: `(rank)`
    singular_values: Array1<F>,
    /// Shape: `(rank, cols)`
    right_t: Array2<F>,
}

impl<F: Intensity> Factorization<F> {
    /// Factorizes `matrix` with the linear algebra backend selected at compile time.
    ///
    /// # Errors
    /// Returns [`EngineError::Decomposition`] if the matrix has a zero dimension,
    /// contains a non-finite value, or the backend fails.
    pub fn compute(matrix: Array2<F>) -> Result<Self, EngineError>
    where
        LinAlgBackendProvider<F>: BackendSVD<F>,
    {
        let (rows, cols) = matrix.dim();
        if rows == 0 || cols == 0 {
            return Err(EngineError::Decomposition(format!(
                "input matrix is empty ({}x{})",
                rows, cols
            )));
        }
        if let Some(((row, col), value)) = matrix.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(EngineError::Decomposition(format!(
                "input matrix contains non-finite value {} at ({}, {})",
                value, row, col
            )));
        }

        // Backends read the raw buffer; reversed axes or stepped slices must be packed first.
        let matrix = if matrix.is_standard_layout() {
            matrix
        } else {
            debug!("Packing {}x{} input with strides {:?} into row-major order.", rows, cols, matrix.strides());
            matrix.as_standard_layout().into_owned()
        };

        info!("Performing SVD decomposition of a {}x{} matrix.", rows, cols);
        let start_time = std::time::Instant::now();
        let backend = LinAlgBackendProvider::<F>::new();
        let ThinSVD { u, s, vt } = backend
            .thin_svd_into(matrix)
            .map_err(|e| EngineError::Decomposition(format!("backend SVD failed: {e}")))?;
        info!("SVD computation time: {:.2?}", start_time.elapsed());

        Self::from_parts(u, s, vt)
    }

    /// Assembles a factorization computed elsewhere.
    ///
    /// # Errors
    /// Returns [`EngineError::Decomposition`] when the shapes disagree, the rank is
    /// not `min(rows, cols)`, or the singular values are negative, non-finite or
    /// not in descending order.
    pub fn from_parts(
        left: Array2<F>,
        singular_values: Array1<F>,
        right_t: Array2<F>,
    ) -> Result<Self, EngineError> {
        let rank = singular_values.len();
        let rows = left.nrows();
        let cols = right_t.ncols();

        if rank == 0 || rows == 0 || cols == 0 {
            return Err(EngineError::Decomposition(
                "factorization has no singular triples".to_string(),
            ));
        }
        if left.ncols() != rank || right_t.nrows() != rank {
            return Err(EngineError::Decomposition(format!(
                "factor shapes disagree: left {:?}, {} singular values, right_t {:?}",
                left.dim(),
                rank,
                right_t.dim()
            )));
        }
        if rank != rows.min(cols) {
            return Err(EngineError::Decomposition(format!(
                "expected economy-size factorization with {} triples for a {}x{} matrix, got {}",
                rows.min(cols),
                rows,
                cols,
                rank
            )));
        }
        if singular_values.iter().any(|s| !s.is_finite() || *s < F::zero()) {
            return Err(EngineError::Decomposition(
                "singular values must be finite and non-negative".to_string(),
            ));
        }
        if singular_values.windows(2).into_iter().any(|pair| pair[0] < pair[1]) {
            return Err(EngineError::Decomposition(
                "singular values must be in descending order".to_string(),
            ));
        }
        if left.iter().chain(right_t.iter()).any(|v| !v.is_finite()) {
            return Err(EngineError::Decomposition(
                "singular vectors contain non-finite values".to_string(),
            ));
        }

        Ok(Self { left, singular_values, right_t })
    }

    /// Number of singular triples, `min(rows, cols)`.
    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }

    /// Shape `(rows, cols)` of the factorized matrix.
    pub fn shape(&self) -> (usize, usize) {
        (self.left.nrows(), self.right_t.ncols())
    }

    pub fn left(&self) -> ArrayView2<'_, F> {
        self.left.view()
    }

    pub fn singular_values(&self) -> ArrayView1<'_, F> {
        self.singular_values.view()
    }

    pub fn right_t(&self) -> ArrayView2<'_, F> {
        self.right_t.view()
    }
}

/// Produces rank-k reconstructions of one grayscale matrix.
///
/// Immutable after construction; `reconstruct` only reads `fused` and the right
/// singular vectors, so one engine can be shared across threads.
#[derive(Debug, Clone)]
pub struct ReconstructionEngine<F: Intensity> {
    factorization: Factorization<F>,
    /// `left * singular_values`, column-wise. Shape: `(rows, rank)`
    fused: Array2<F>,
    /// Cumulative fraction of squared singular mass. Shape: `(rank)`
    explained_variance: Array1<f64>,
}

impl<F: Intensity> ReconstructionEngine<F> {
    /// Factorizes `matrix` and precomputes the fused term and the explained variance curve.
    ///
    /// # Errors
    /// Returns [`EngineError::Decomposition`] if the matrix is empty or not finite.
    pub fn new(matrix: Array2<F>) -> Result<Self, EngineError>
    where
        LinAlgBackendProvider<F>: BackendSVD<F>,
    {
        let factorization = Factorization::compute(matrix)?;
        Ok(Self::from_factorization(factorization))
    }

    pub fn from_factorization(factorization: Factorization<F>) -> Self {
        let fused = &factorization.left * &factorization.singular_values;
        let explained_variance = cumulative_explained_variance(factorization.singular_values.view());
        debug!(
            "Prepared reconstruction engine: shape {:?}, {} singular values, leading value {}.",
            factorization.shape(),
            factorization.rank(),
            factorization.singular_values[0]
        );
        Self { factorization, fused, explained_variance }
    }

    fn check_rank(&self, k: usize) -> Result<(), EngineError> {
        let max_rank = self.max_rank();
        if k == 0 || k > max_rank {
            return Err(EngineError::RankOutOfRange { rank: k, max_rank });
        }
        Ok(())
    }

    /// Rank-k approximation `Σ_{i<k} σ_i u_i v_iᵗ` in the original shape.
    ///
    /// Values are not clipped; truncation can overshoot the intensity range, see
    /// [`clip_intensities`](crate::display::clip_intensities).
    ///
    /// # Errors
    /// Returns [`EngineError::RankOutOfRange`] unless `1 <= k <= max_rank()`.
    pub fn reconstruct(&self, k: usize) -> Result<Array2<F>, EngineError> {
        self.check_rank(k)?;
        trace!("Reconstructing with {} singular values.", k);
        let fused = self.fused.slice(s![.., ..k]);
        let right_t = self.factorization.right_t.slice(s![..k, ..]);
        Ok(fused.dot(&right_t))
    }

    /// Fraction of squared singular mass captured by the top `k` components.
    pub fn explained_variance_at(&self, k: usize) -> Result<f64, EngineError> {
        self.check_rank(k)?;
        Ok(self.explained_variance[k - 1])
    }

    /// Whole cumulative curve; entry `k - 1` belongs to rank `k`.
    pub fn explained_variance(&self) -> ArrayView1<'_, f64> {
        self.explained_variance.view()
    }

    /// Storage of `k` singular triples relative to storing every pixel.
    pub fn compression_ratio(&self, k: usize) -> Result<f64, EngineError> {
        self.check_rank(k)?;
        let (rows, cols) = self.shape();
        Ok((k * (rows + cols + 1)) as f64 / (rows * cols) as f64)
    }

    pub fn max_rank(&self) -> usize {
        self.factorization.rank()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.factorization.shape()
    }

    pub fn singular_values(&self) -> ArrayView1<'_, F> {
        self.factorization.singular_values()
    }

    pub fn factorization(&self) -> &Factorization<F> {
        &self.factorization
    }
}

/// Cumulative sum of squared singular values normalized by the total, accumulated in `f64`.
///
/// A zero matrix has no mass to explain; every rank reproduces it exactly, so the
/// curve is all ones.
fn cumulative_explained_variance<F: Intensity>(singular_values: ArrayView1<'_, F>) -> Array1<f64> {
    let mut running_total = 0.0f64;
    let mut cumulative: Array1<f64> = singular_values
        .iter()
        .map(|s| {
            let value: f64 = (*s).into();
            running_total += value * value;
            running_total
        })
        .collect();

    if running_total > 0.0 {
        cumulative.mapv_inplace(|v| (v / running_total).min(1.0));
    } else {
        cumulative.fill(1.0);
    }
    cumulative
}
