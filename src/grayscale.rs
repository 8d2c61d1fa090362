// src/grayscale.rs

use crate::config::Precision;
use crate::display::to_display_pixels;
use crate::engine::{EngineError, ReconstructionEngine};
use log::info;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// A reconstruction engine whose precision was chosen at load time.
#[derive(Debug, Clone)]
pub enum GrayscaleEngine {
    Single(ReconstructionEngine<f32>),
    Double(ReconstructionEngine<f64>),
}

impl GrayscaleEngine {
    /// Casts 8-bit grayscale intensities to the requested precision and factorizes them.
    pub fn from_pixels(pixels: ArrayView2<'_, u8>, precision: Precision) -> Result<Self, EngineError> {
        info!(
            "Building {:?} precision engine for a {}x{} image.",
            precision,
            pixels.nrows(),
            pixels.ncols()
        );
        match precision {
            Precision::Single => {
                ReconstructionEngine::new(pixels.mapv(f32::from)).map(GrayscaleEngine::Single)
            }
            Precision::Double => {
                ReconstructionEngine::new(pixels.mapv(f64::from)).map(GrayscaleEngine::Double)
            }
        }
    }

    pub fn precision(&self) -> Precision {
        match self {
            GrayscaleEngine::Single(_) => Precision::Single,
            GrayscaleEngine::Double(_) => Precision::Double,
        }
    }

    pub fn max_rank(&self) -> usize {
        match self {
            GrayscaleEngine::Single(engine) => engine.max_rank(),
            GrayscaleEngine::Double(engine) => engine.max_rank(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            GrayscaleEngine::Single(engine) => engine.shape(),
            GrayscaleEngine::Double(engine) => engine.shape(),
        }
    }

    /// Rank-k reconstruction, unclipped, widened to `f64`.
    pub fn reconstruct_f64(&self, k: usize) -> Result<Array2<f64>, EngineError> {
        match self {
            GrayscaleEngine::Single(engine) => Ok(engine.reconstruct(k)?.mapv(f64::from)),
            GrayscaleEngine::Double(engine) => engine.reconstruct(k),
        }
    }

    /// Rank-k reconstruction clipped and rounded to displayable 8-bit intensities.
    pub fn reconstruct_pixels(&self, k: usize) -> Result<Array2<u8>, EngineError> {
        match self {
            GrayscaleEngine::Single(engine) => Ok(to_display_pixels(engine.reconstruct(k)?.view())),
            GrayscaleEngine::Double(engine) => Ok(to_display_pixels(engine.reconstruct(k)?.view())),
        }
    }

    pub fn explained_variance_at(&self, k: usize) -> Result<f64, EngineError> {
        match self {
            GrayscaleEngine::Single(engine) => engine.explained_variance_at(k),
            GrayscaleEngine::Double(engine) => engine.explained_variance_at(k),
        }
    }

    pub fn explained_variance(&self) -> ArrayView1<'_, f64> {
        match self {
            GrayscaleEngine::Single(engine) => engine.explained_variance(),
            GrayscaleEngine::Double(engine) => engine.explained_variance(),
        }
    }

    pub fn compression_ratio(&self, k: usize) -> Result<f64, EngineError> {
        match self {
            GrayscaleEngine::Single(engine) => engine.compression_ratio(k),
            GrayscaleEngine::Double(engine) => engine.compression_ratio(k),
        }
    }

    pub fn singular_values(&self) -> Array1<f64> {
        match self {
            GrayscaleEngine::Single(engine) => engine.singular_values().mapv(f64::from),
            GrayscaleEngine::Double(engine) => engine.singular_values().to_owned(),
        }
    }
}
