// src/loader.rs

//! Off-thread factorization so a render loop stays responsive while an image loads.

use crate::config::Precision;
use crate::engine::EngineError;
use crate::grayscale::GrayscaleEngine;
use log::{debug, info};
use ndarray::Array2;
use std::sync::mpsc::{self, Receiver, TryRecvError};

type EngineResult = Result<GrayscaleEngine, EngineError>;

/// Handle to a factorization running on the rayon pool.
#[derive(Debug)]
pub struct PendingEngine {
    receiver: Option<Receiver<EngineResult>>,
}

/// Starts factorizing `pixels` in the background and returns immediately.
pub fn spawn_engine(pixels: Array2<u8>, precision: Precision) -> PendingEngine {
    let (sender, receiver) = mpsc::channel();
    info!(
        "Scheduling background factorization of a {}x{} image.",
        pixels.nrows(),
        pixels.ncols()
    );
    rayon::spawn(move || {
        let result = GrayscaleEngine::from_pixels(pixels.view(), precision);
        if sender.send(result).is_err() {
            debug!("Background factorization finished after its handle was dropped.");
        }
    });
    PendingEngine { receiver: Some(receiver) }
}

fn worker_vanished() -> EngineError {
    EngineError::Decomposition("background factorization worker exited without a result".to_string())
}

impl PendingEngine {
    /// Polls without blocking. Yields the result exactly once; `None` before and after.
    pub fn try_take(&mut self) -> Option<EngineResult> {
        let receiver = self.receiver.as_ref()?;
        let outcome = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(worker_vanished()),
        };
        self.receiver = None;
        Some(outcome)
    }

    /// True once the result has been taken.
    pub fn is_taken(&self) -> bool {
        self.receiver.is_none()
    }

    /// Blocks until the factorization is done.
    pub fn wait(self) -> EngineResult {
        match self.receiver {
            Some(receiver) => receiver.recv().unwrap_or_else(|_| Err(worker_vanished())),
            None => Err(EngineError::Decomposition(
                "background factorization result was already taken".to_string(),
            )),
        }
    }
}
