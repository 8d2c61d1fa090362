// src/display.rs

//! The presentation seam: what a display collaborator receives, and the
//! clipping every reconstruction needs before it can be shown.

use crate::engine::Intensity;
use ndarray::{Array2, ArrayView1, ArrayView2, Zip};

/// Smallest displayable 8-bit grayscale intensity.
pub const INTENSITY_MIN: f64 = 0.0;
/// Largest displayable 8-bit grayscale intensity.
pub const INTENSITY_MAX: f64 = 255.0;

/// One reconstruction handed to a [`DisplaySink`].
#[derive(Debug, Clone, Copy)]
pub struct ReconstructionFrame<'a> {
    /// Number of singular values used.
    pub rank: usize,
    /// Explained variance at `rank`, for the marker on the variance plot.
    pub explained_variance: f64,
    /// Clipped 8-bit intensities, shape `(rows, cols)`.
    pub pixels: ArrayView2<'a, u8>,
}

/// Receives everything the explorer wants drawn. Implementations own the
/// window, textures, and plotting; the core never draws.
pub trait DisplaySink {
    /// Called once per loaded image.
    fn show_original(&mut self, name: &str, pixels: ArrayView2<'_, u8>);

    /// Called once per loaded image with the cumulative explained variance
    /// curve; entry `k - 1` belongs to rank `k`.
    fn show_explained_variance(&mut self, curve: ArrayView1<'_, f64>);

    /// Called whenever the displayed reconstruction changes.
    fn show_reconstruction(&mut self, frame: ReconstructionFrame<'_>);
}

/// Clips every element into `[lo, hi]` in place. NaN becomes `lo`.
pub fn clip_intensities<F: Intensity>(matrix: &mut Array2<F>, lo: F, hi: F) {
    matrix.par_mapv_inplace(|v| if v.is_nan() { lo } else { v.max(lo).min(hi) });
}

/// Clips to `[0, 255]`, rounds to the nearest integer, and converts to `u8`.
pub fn to_display_pixels<F: Intensity>(matrix: ArrayView2<'_, F>) -> Array2<u8> {
    let mut pixels = Array2::<u8>::zeros(matrix.dim());
    Zip::from(&mut pixels).and(&matrix).par_for_each(|pixel, value| {
        let value: f64 = (*value).into();
        *pixel = if value.is_nan() {
            0
        } else {
            value.clamp(INTENSITY_MIN, INTENSITY_MAX).round() as u8
        };
    });
    pixels
}
