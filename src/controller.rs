// src/controller.rs

//! Discrete rank slider driven by continuous pointer input.
//!
//! The controller is a two-state machine (idle / dragging) that turns pointer
//! positions into an integer rank and reports whether the rank actually changed,
//! so the caller only asks the engine for a new reconstruction when needed.
//!
//! Pointer x-coordinates map linearly onto `[min_rank, max_rank]` and are rounded
//! half away from zero: on a `[0, 100]` track with ranks `1..=10`, `x = 50` maps to
//! `5.5`, which rounds to `6`.

use crate::config::ExplorerConfig;
use log::{debug, trace};
use std::error::Error;
use std::fmt;

/// Pointer position in the caller's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for PointerPosition {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Raw input delivered by the event loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press(PointerPosition),
    Move(PointerPosition),
    Release,
}

/// Horizontal extent of the slider track, plus an optional vertical extent.
///
/// Without a vertical extent the hit region is the band `x0 <= x <= x0 + width`
/// at any height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackGeometry {
    x0: f64,
    width: f64,
    vertical: Option<(f64, f64)>,
}

impl TrackGeometry {
    pub fn horizontal(x0: f64, width: f64) -> Self {
        Self { x0, width, vertical: None }
    }

    /// Restricts the hit region to `y0 <= y <= y0 + height`.
    pub fn with_vertical_extent(self, y0: f64, height: f64) -> Self {
        Self { vertical: Some((y0, height)), ..self }
    }

    pub fn x0(&self) -> f64 {
        self.x0
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn vertical_extent(&self) -> Option<(f64, f64)> {
        self.vertical
    }

    fn validate(&self) -> Result<(), ControllerError> {
        let height = self.vertical.map(|(_, height)| height);
        let width_ok = self.x0.is_finite() && self.width.is_finite() && self.width > 0.0;
        let height_ok = match self.vertical {
            Some((y0, height)) => y0.is_finite() && height.is_finite() && height > 0.0,
            None => true,
        };
        if width_ok && height_ok {
            Ok(())
        } else {
            Err(ControllerError::InvalidGeometry { x0: self.x0, width: self.width, height })
        }
    }

    /// Edges are inclusive.
    pub fn contains(&self, position: PointerPosition) -> bool {
        let inside_x = position.x >= self.x0 && position.x <= self.x0 + self.width;
        let inside_y = match self.vertical {
            Some((y0, height)) => position.y >= y0 && position.y <= y0 + height,
            None => true,
        };
        inside_x && inside_y
    }
}

/// Misconfiguration detected when building a [`RankController`].
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerError {
    /// Track width (or height) is not a positive finite number.
    InvalidGeometry { x0: f64, width: f64, height: Option<f64> },
    /// `min_rank` is zero or not strictly below `max_rank`.
    InvalidRange { min_rank: usize, max_rank: usize },
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::InvalidGeometry { x0, width, height: Some(height) } => write!(
                f,
                "invalid track geometry: x0 {x0}, width {width}, height {height}; extents must be positive and finite"
            ),
            ControllerError::InvalidGeometry { x0, width, height: None } => write!(
                f,
                "invalid track geometry: x0 {x0}, width {width}; width must be positive and finite"
            ),
            ControllerError::InvalidRange { min_rank, max_rank } => write!(
                f,
                "invalid rank range [{min_rank}, {max_rank}]: need 1 <= min < max"
            ),
        }
    }
}

impl Error for ControllerError {}

/// Result of feeding one event to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankUpdate {
    pub rank: usize,
    /// True only when this event moved the rank to a new value.
    pub changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Dragging,
}

/// Interactive rank selector bound to a slider track.
#[derive(Debug, Clone)]
pub struct RankController {
    rank: usize,
    min_rank: usize,
    max_rank: usize,
    geometry: TrackGeometry,
    state: DragState,
}

impl RankController {
    /// Builds an idle controller; `initial_rank` is clamped into `[min_rank, max_rank]`.
    ///
    /// # Errors
    /// [`ControllerError::InvalidRange`] unless `1 <= min_rank < max_rank`,
    /// [`ControllerError::InvalidGeometry`] unless the track has positive finite extent.
    pub fn new(
        initial_rank: usize,
        min_rank: usize,
        max_rank: usize,
        geometry: TrackGeometry,
    ) -> Result<Self, ControllerError> {
        if min_rank == 0 || min_rank >= max_rank {
            return Err(ControllerError::InvalidRange { min_rank, max_rank });
        }
        geometry.validate()?;

        let rank = initial_rank.clamp(min_rank, max_rank);
        debug!(
            "Rank controller ready: rank {} in [{}, {}], track x0 {} width {}.",
            rank, min_rank, max_rank, geometry.x0, geometry.width
        );
        Ok(Self { rank, min_rank, max_rank, geometry, state: DragState::Idle })
    }

    /// Binds a controller to an engine exposing `engine_rank` singular values.
    ///
    /// The range is `[1, config.resolve_max_rank(engine_rank)]` and the starting
    /// rank is `config.initial_rank`.
    pub fn for_engine_rank(
        engine_rank: usize,
        config: &ExplorerConfig,
        geometry: TrackGeometry,
    ) -> Result<Self, ControllerError> {
        Self::new(config.initial_rank, 1, config.resolve_max_rank(engine_rank), geometry)
    }

    /// Starts dragging if `position` hits the track. Returns whether dragging started.
    pub fn press(&mut self, position: PointerPosition) -> bool {
        if self.geometry.contains(position) {
            trace!("Press at ({}, {}) grabbed the rank slider.", position.x, position.y);
            self.state = DragState::Dragging;
            true
        } else {
            false
        }
    }

    /// Updates the rank from the pointer x-coordinate while dragging; a no-op when idle.
    pub fn move_to(&mut self, position: PointerPosition) -> RankUpdate {
        if self.state != DragState::Dragging {
            return self.unchanged();
        }
        match self.rank_at(position.x) {
            Some(candidate) if candidate != self.rank => {
                debug!("Rank changed from {} to {}.", self.rank, candidate);
                self.rank = candidate;
                RankUpdate { rank: candidate, changed: true }
            }
            _ => self.unchanged(),
        }
    }

    /// Stops dragging. Never changes the rank.
    pub fn release(&mut self) {
        self.state = DragState::Idle;
    }

    pub fn handle(&mut self, event: PointerEvent) -> RankUpdate {
        match event {
            PointerEvent::Press(position) => {
                self.press(position);
                self.unchanged()
            }
            PointerEvent::Move(position) => self.move_to(position),
            PointerEvent::Release => {
                self.release();
                self.unchanged()
            }
        }
    }

    /// Replaces the track, e.g. after the window was resized. The rank is kept.
    pub fn set_geometry(&mut self, geometry: TrackGeometry) -> Result<(), ControllerError> {
        geometry.validate()?;
        self.geometry = geometry;
        Ok(())
    }

    /// Rank for pointer x-coordinate `x`, clamped to the track. NaN maps to nothing.
    fn rank_at(&self, x: f64) -> Option<usize> {
        if x.is_nan() {
            return None;
        }
        let min = self.min_rank as f64;
        let max = self.max_rank as f64;
        let fraction = (x - self.geometry.x0) / self.geometry.width;
        let continuous = (min + fraction * (max - min)).clamp(min, max);
        Some(continuous.round() as usize)
    }

    fn unchanged(&self) -> RankUpdate {
        RankUpdate { rank: self.rank, changed: false }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn min_rank(&self) -> usize {
        self.min_rank
    }

    pub fn max_rank(&self) -> usize {
        self.max_rank
    }

    pub fn geometry(&self) -> TrackGeometry {
        self.geometry
    }

    pub fn is_dragging(&self) -> bool {
        self.state == DragState::Dragging
    }

    /// Filled fraction of the track, `(rank - min) / (max - min)`.
    pub fn percent(&self) -> f64 {
        if self.max_rank > self.min_rank {
            (self.rank - self.min_rank) as f64 / (self.max_rank - self.min_rank) as f64
        } else {
            0.0
        }
    }
}
