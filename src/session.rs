// src/session.rs

use crate::config::ExplorerConfig;
use crate::controller::{ControllerError, PointerEvent, RankController, TrackGeometry};
use crate::display::{DisplaySink, ReconstructionFrame};
use crate::engine::EngineError;
use crate::grayscale::GrayscaleEngine;
use crate::image_source::{GrayscaleImage, ImageSource, ImageSourceError};
use log::{debug, info};
use ndarray::Array2;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum SessionError {
    Image(ImageSourceError),
    Engine(EngineError),
    Controller(ControllerError),
    /// An engine built elsewhere does not match the image it is paired with.
    ShapeMismatch { image: (usize, usize), engine: (usize, usize) },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Image(err) => write!(f, "image source error: {err}"),
            SessionError::Engine(err) => write!(f, "engine error: {err}"),
            SessionError::Controller(err) => write!(f, "controller error: {err}"),
            SessionError::ShapeMismatch { image, engine } => write!(
                f,
                "engine shape {:?} does not match image shape {:?}",
                engine, image
            ),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SessionError::Image(err) => Some(err),
            SessionError::Engine(err) => Some(err),
            SessionError::Controller(err) => Some(err),
            SessionError::ShapeMismatch { .. } => None,
        }
    }
}

impl From<ImageSourceError> for SessionError {
    fn from(err: ImageSourceError) -> Self {
        SessionError::Image(err)
    }
}

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        SessionError::Engine(err)
    }
}

impl From<ControllerError> for SessionError {
    fn from(err: ControllerError) -> Self {
        SessionError::Controller(err)
    }
}

/// One loaded image with its engine and rank slider.
///
/// Loading another image replaces the whole engine/controller pair; nothing
/// survives from the previous image except the track geometry.
#[derive(Debug)]
pub struct ExplorerSession {
    image: GrayscaleImage,
    engine: GrayscaleEngine,
    controller: RankController,
    current: Array2<u8>,
}

impl ExplorerSession {
    /// Factorizes `image` at `config.precision` and prepares the initial reconstruction.
    pub fn load(
        image: GrayscaleImage,
        geometry: TrackGeometry,
        config: &ExplorerConfig,
    ) -> Result<Self, SessionError> {
        let engine = GrayscaleEngine::from_pixels(image.pixels().view(), config.precision)?;
        Self::from_engine(image, engine, geometry, config)
    }

    /// Loads from an [`ImageSource`].
    pub fn open<S: ImageSource + ?Sized>(
        source: &S,
        geometry: TrackGeometry,
        config: &ExplorerConfig,
    ) -> Result<Self, SessionError> {
        let image = source.load_grayscale()?;
        Self::load(image, geometry, config)
    }

    /// Adopts an engine that was factorized elsewhere, e.g. by [`spawn_engine`](crate::loader::spawn_engine).
    pub fn from_engine(
        image: GrayscaleImage,
        engine: GrayscaleEngine,
        geometry: TrackGeometry,
        config: &ExplorerConfig,
    ) -> Result<Self, SessionError> {
        let image_shape = image.pixels().dim();
        if engine.shape() != image_shape {
            return Err(SessionError::ShapeMismatch { image: image_shape, engine: engine.shape() });
        }
        let controller = RankController::for_engine_rank(engine.max_rank(), config, geometry)?;
        let current = engine.reconstruct_pixels(controller.rank())?;
        info!(
            "Session ready for '{}': {} singular values, slider range [{}, {}], rank {}.",
            image.name(),
            engine.max_rank(),
            controller.min_rank(),
            controller.max_rank(),
            controller.rank()
        );
        Ok(Self { image, engine, controller, current })
    }

    /// Discards the current engine and controller, loads `image` in their place,
    /// and presents the new image to `sink`. On failure the session keeps its
    /// previous image and nothing is drawn.
    pub fn replace_image<D: DisplaySink + ?Sized>(
        &mut self,
        image: GrayscaleImage,
        config: &ExplorerConfig,
        sink: &mut D,
    ) -> Result<(), SessionError> {
        let geometry = self.controller.geometry();
        *self = Self::load(image, geometry, config)?;
        self.present(sink)
    }

    /// Pushes the original, the explained variance curve, and the current reconstruction.
    pub fn present<D: DisplaySink + ?Sized>(&self, sink: &mut D) -> Result<(), SessionError> {
        sink.show_original(self.image.name(), self.image.pixels().view());
        sink.show_explained_variance(self.engine.explained_variance());
        self.push_current(sink)
    }

    /// Feeds one pointer event to the slider. When the rank changes, reconstructs
    /// and pushes the new image to `sink`. Returns whether the rank changed.
    pub fn handle_event<D: DisplaySink + ?Sized>(
        &mut self,
        event: PointerEvent,
        sink: &mut D,
    ) -> Result<bool, SessionError> {
        let update = self.controller.handle(event);
        if !update.changed {
            return Ok(false);
        }
        debug!("Reconstructing '{}' at rank {}.", self.image.name(), update.rank);
        self.current = self.engine.reconstruct_pixels(update.rank)?;
        self.push_current(sink)?;
        Ok(true)
    }

    fn push_current<D: DisplaySink + ?Sized>(&self, sink: &mut D) -> Result<(), SessionError> {
        let rank = self.controller.rank();
        sink.show_reconstruction(ReconstructionFrame {
            rank,
            explained_variance: self.engine.explained_variance_at(rank)?,
            pixels: self.current.view(),
        });
        Ok(())
    }

    pub fn set_geometry(&mut self, geometry: TrackGeometry) -> Result<(), SessionError> {
        self.controller.set_geometry(geometry)?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        self.image.name()
    }

    pub fn rank(&self) -> usize {
        self.controller.rank()
    }

    pub fn image(&self) -> &GrayscaleImage {
        &self.image
    }

    pub fn current_reconstruction(&self) -> &Array2<u8> {
        &self.current
    }

    pub fn engine(&self) -> &GrayscaleEngine {
        &self.engine
    }

    pub fn controller(&self) -> &RankController {
        &self.controller
    }
}
