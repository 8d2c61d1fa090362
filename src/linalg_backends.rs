// src/linalg_backends.rs

use ndarray::{s, Array1, Array2};
use std::error::Error;
use std::marker::PhantomData;

/// A thread-safe boxed error, the currency of the backend seam.
pub type BackendError = Box<dyn Error + Send + Sync + 'static>;

#[derive(Debug, Default, Copy, Clone)]
pub struct LinAlgBackendProvider<F: 'static + Copy + Send + Sync> {
    _phantom: PhantomData<F>,
}

impl<F: 'static + Copy + Send + Sync> LinAlgBackendProvider<F> {
    pub fn new() -> Self {
        Self { _phantom: PhantomData }
    }
}

// --- Trait Definitions ---

/// Output of a Singular Value Decomposition with both bases.
///
/// Depending on the backend, `u` and `vt` may hold the full square bases
/// (LAPACK `gesvd` with `JOBU='A'`) or only the thin ones.
#[derive(Debug)]
pub struct SVDOutput<F: 'static> {
    pub u: Array2<F>,
    pub s: Array1<F>,
    pub vt: Array2<F>,
}

/// Economy-size factor triple: `u` is `rows x r`, `s` has `r` entries and
/// `vt` is `r x cols`, with `r = min(rows, cols)`.
#[derive(Debug)]
pub struct ThinSVD<F: 'static> {
    pub u: Array2<F>,
    pub s: Array1<F>,
    pub vt: Array2<F>,
}

/// Trait for Singular Value Decomposition.
pub trait BackendSVD<F: 'static + Copy + Send + Sync> {
    fn svd_into(&self, matrix: Array2<F>) -> Result<SVDOutput<F>, BackendError>;

    /// Runs the decomposition and trims both bases to economy size.
    fn thin_svd_into(&self, matrix: Array2<F>) -> Result<ThinSVD<F>, BackendError> {
        let (nrows, ncols) = matrix.dim();
        let rank = nrows.min(ncols);
        let SVDOutput { u, s, vt } = self.svd_into(matrix)?;

        if s.len() < rank || u.ncols() < rank || vt.nrows() < rank {
            return Err(to_dyn_error_msg(format!(
                "backend returned truncated factors for a {}x{} matrix: u {:?}, s {}, vt {:?}",
                nrows, ncols, u.dim(), s.len(), vt.dim()
            )));
        }

        Ok(ThinSVD {
            u: u.slice(s![.., ..rank]).to_owned(),
            s: s.slice(s![..rank]).to_owned(),
            vt: vt.slice(s![..rank, ..]).to_owned(),
        })
    }
}

fn to_dyn_error_msg(msg: String) -> BackendError {
    Box::new(std::io::Error::new(std::io::ErrorKind::Other, msg))
}

// --- NdarrayLinAlgBackend Implementation ---
use ndarray_linalg::SVDInto as NdLinalgSVDInto;

#[derive(Debug, Default, Copy, Clone)]
pub struct NdarrayLinAlgBackend;

// Helper to convert ndarray-linalg's error to a BackendError
fn to_dyn_error<E: Error + Send + Sync + 'static>(e: E) -> BackendError {
    Box::new(e)
}

impl BackendSVD<f64> for NdarrayLinAlgBackend {
    fn svd_into(&self, matrix: Array2<f64>) -> Result<SVDOutput<f64>, BackendError> {
        let (u, s, vt) = matrix.svd_into(true, true).map_err(to_dyn_error)?;
        let u = u.ok_or_else(|| to_dyn_error_msg("LAPACK did not return left singular vectors".to_string()))?;
        let vt = vt.ok_or_else(|| to_dyn_error_msg("LAPACK did not return right singular vectors".to_string()))?;
        Ok(SVDOutput { u, s, vt })
    }
}

impl BackendSVD<f32> for NdarrayLinAlgBackend {
    fn svd_into(&self, matrix: Array2<f32>) -> Result<SVDOutput<f32>, BackendError> {
        let (u, s, vt) = matrix.svd_into(true, true).map_err(to_dyn_error)?;
        let u = u.ok_or_else(|| to_dyn_error_msg("LAPACK did not return left singular vectors".to_string()))?;
        let vt = vt.ok_or_else(|| to_dyn_error_msg("LAPACK did not return right singular vectors".to_string()))?;
        Ok(SVDOutput { u, s, vt })
    }
}

// --- FaerLinAlgBackend Implementation ---
#[cfg(feature = "backend_faer")]
mod faer_specific_code {
    use super::{to_dyn_error_msg, BackendError, BackendSVD, SVDOutput};
    use bytemuck::Pod;
    use faer::linalg::solvers::Svd as FaerSolverSvd;
    use faer::traits::num_traits::Zero;
    use faer::traits::ComplexField;
    use faer::MatRef;
    use ndarray::{Array1, Array2, ShapeBuilder};

    #[derive(Debug, Default, Copy, Clone)]
    pub struct FaerLinAlgBackend;

    fn faer_mat_to_ndarray<F: ComplexField + Copy + Pod + Zero>(faer_mat: MatRef<'_, F>) -> Array2<F> {
        let nrows = faer_mat.nrows();
        let ncols = faer_mat.ncols();
        if nrows == 0 || ncols == 0 {
            return Array2::zeros((nrows, ncols).f());
        }
        Array2::from_shape_fn((nrows, ncols).f(), |(i, j)| faer_mat[(i, j)])
    }

    fn faer_col_to_ndarray_vec<F: ComplexField + Copy + Pod + Zero>(faer_col: faer::ColRef<'_, F>) -> Array1<F> {
        Array1::from_shape_fn(faer_col.nrows(), |i| faer_col[i])
    }

    /// Views a contiguous ndarray matrix as a faer matrix without copying.
    fn view_as_faer<F: ComplexField + Copy>(matrix: &Array2<F>) -> Result<MatRef<'_, F>, BackendError> {
        let (nrows, ncols) = matrix.dim();
        let slice = matrix.as_slice_memory_order().ok_or_else(|| {
            to_dyn_error_msg(format!(
                "Input ndarray matrix ({}x{}) is non-contiguous and cannot be directly viewed by faer.",
                nrows, ncols
            ))
        })?;
        if matrix.is_standard_layout() {
            Ok(MatRef::from_row_major_slice(slice, nrows, ncols))
        } else if matrix.t().is_standard_layout() {
            Ok(MatRef::from_column_major_slice(slice, nrows, ncols))
        } else {
            Err(to_dyn_error_msg(format!(
                "Input ndarray matrix ({}x{}) has strides {:?} that are neither C- nor F-contiguous.",
                nrows, ncols, matrix.strides()
            )))
        }
    }

    fn faer_svd<F: ComplexField + Copy + Pod + Zero>(matrix: Array2<F>) -> Result<SVDOutput<F>, BackendError> {
        let (nrows, ncols) = matrix.dim();
        if matrix.is_empty() {
            let k_dim = nrows.min(ncols);
            return Ok(SVDOutput {
                u: Array2::zeros((nrows, k_dim)),
                s: Array1::zeros(k_dim),
                vt: Array2::zeros((k_dim, ncols)),
            });
        }
        let faer_mat_ref = view_as_faer(&matrix)?;

        let svd_solver_instance = FaerSolverSvd::new_thin(faer_mat_ref)
            .map_err(|e| to_dyn_error_msg(format!("Faer SVD computation failed: {:?}", e)))?;

        let s_ndarray = faer_col_to_ndarray_vec(svd_solver_instance.S().column_vector());
        let u_ndarray = faer_mat_to_ndarray(svd_solver_instance.U());
        let vt_ndarray = faer_mat_to_ndarray(svd_solver_instance.V()).t().to_owned();

        Ok(SVDOutput { u: u_ndarray, s: s_ndarray, vt: vt_ndarray })
    }

    impl BackendSVD<f64> for FaerLinAlgBackend {
        fn svd_into(&self, matrix: Array2<f64>) -> Result<SVDOutput<f64>, BackendError> {
            faer_svd(matrix)
        }
    }

    impl BackendSVD<f32> for FaerLinAlgBackend {
        fn svd_into(&self, matrix: Array2<f32>) -> Result<SVDOutput<f32>, BackendError> {
            faer_svd(matrix)
        }
    }
}

// --- LinAlgBackendProvider Dispatch ---

/// Dispatches to the linear algebra backend selected by compile-time
/// feature flags: faer when `backend_faer` is on, LAPACK otherwise.
#[cfg(not(feature = "backend_faer"))]
impl<F> BackendSVD<F> for LinAlgBackendProvider<F>
where
    F: 'static + Copy + Send + Sync,
    NdarrayLinAlgBackend: BackendSVD<F>,
{
    fn svd_into(&self, matrix: Array2<F>) -> Result<SVDOutput<F>, BackendError> {
        NdarrayLinAlgBackend.svd_into(matrix)
    }
}

#[cfg(feature = "backend_faer")]
impl<F> BackendSVD<F> for LinAlgBackendProvider<F>
where
    F: 'static + Copy + Send + Sync,
    faer_specific_code::FaerLinAlgBackend: BackendSVD<F>,
{
    fn svd_into(&self, matrix: Array2<F>) -> Result<SVDOutput<F>, BackendError> {
        faer_specific_code::FaerLinAlgBackend.svd_into(matrix)
    }
}
