// src/config.rs

use serde::{Deserialize, Serialize};

/// Rank the slider starts at when an image is loaded.
pub const DEFAULT_INITIAL_RANK: usize = 3;

/// Floating point precision the factorization is computed in.
///
/// Resolved once when an image is loaded and threaded explicitly into the
/// engine constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// `f32` arithmetic. Halves the memory of the factors.
    Single,
    /// `f64` arithmetic.
    #[default]
    Double,
}

/// Configuration for loading an image into an [`ExplorerSession`](crate::session::ExplorerSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Precision of the factorization and of every reconstruction.
    pub precision: Precision,
    /// Upper bound of the rank slider. Values above the number of singular
    /// values are clamped down; `None` exposes every singular value.
    pub max_singular_values: Option<usize>,
    /// Rank selected right after loading, clamped into the slider range.
    pub initial_rank: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        ExplorerConfig {
            precision: Precision::Double,
            max_singular_values: None,
            initial_rank: DEFAULT_INITIAL_RANK,
        }
    }
}

impl ExplorerConfig {
    /// Slider upper bound for a factorization with `available_rank` singular values.
    pub fn resolve_max_rank(&self, available_rank: usize) -> usize {
        match self.max_singular_values {
            Some(requested) => requested.min(available_rank),
            None => available_rank,
        }
    }
}
