// Truncated SVD image compression explorer

#![doc = include_str!("../README.md")]

pub mod config;
pub mod controller;
pub mod display;
pub mod engine;
pub mod grayscale;
pub mod image_source;
pub mod linalg_backends;
pub mod loader;
pub mod session;


pub use config::{ExplorerConfig, Precision};
pub use controller::{
    ControllerError, PointerEvent, PointerPosition, RankController, RankUpdate, TrackGeometry,
};
pub use display::{clip_intensities, to_display_pixels, DisplaySink, ReconstructionFrame};
pub use engine::{EngineError, Factorization, Intensity, ReconstructionEngine};
pub use grayscale::GrayscaleEngine;
#[cfg(feature = "image-io")]
pub use image_source::FileImageSource;
pub use image_source::{GrayscaleImage, ImageSource, ImageSourceError, InMemoryImageSource};
pub use loader::{spawn_engine, PendingEngine};
pub use session::{ExplorerSession, SessionError};
