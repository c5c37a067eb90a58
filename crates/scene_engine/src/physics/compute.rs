//! Pluggable broad-phase acceleration
//!
//! The broad phase is the only part of the simulation a compute device
//! may accelerate. A backend receives the frame's bounds snapshot and
//! returns overlapping index pairs; it must report exactly the pairs the
//! CPU reference would. Backends are injected at startup as a boxed
//! trait object and are always optional: the CPU path is compiled in
//! unconditionally and takes over whenever no backend is present or a
//! backend returns an error.

use crate::physics::bounds::Bounds;

/// Errors surfaced by a compute backend
///
/// Any error makes the world log a warning and redo the frame's broad
/// phase on the CPU; a failing backend can never change simulation
/// results.
#[derive(thiserror::Error, Debug)]
pub enum ComputeError {
    /// The device or queue is gone and the backend cannot recover
    #[error("compute device lost: {0}")]
    DeviceLost(String),

    /// A single dispatch failed but the backend may work next frame
    #[error("compute dispatch failed: {0}")]
    DispatchFailed(String),

    /// The input exceeds what the backend can handle
    #[error("compute capacity exceeded: {requested} bounds, capacity {capacity}")]
    CapacityExceeded {
        /// Number of bounds in the rejected snapshot
        requested: usize,
        /// Backend's maximum supported snapshot size
        capacity: usize,
    },
}

/// A broad-phase accelerator
pub trait ComputeBackend {
    /// Human-readable backend name for logs
    fn name(&self) -> &str;

    /// Overlapping index pairs within the bounds snapshot
    ///
    /// Pairs use indices into `bounds` with the lower index first. Order
    /// is unspecified; the caller sorts before resolving.
    fn overlap_pairs(&mut self, bounds: &[Bounds]) -> Result<Vec<(u32, u32)>, ComputeError>;
}

/// CPU reference broad phase: exhaustive pairwise overlap tests
///
/// Quadratic and unapologetic about it. This is both the fallback path
/// and the correctness oracle for every backend.
#[must_use]
pub fn cpu_overlap_pairs(bounds: &[Bounds]) -> Vec<(u32, u32)> {
    let mut pairs = Vec::new();
    for i in 0..bounds.len() {
        for j in (i + 1)..bounds.len() {
            if bounds[i].overlaps(&bounds[j]) {
                pairs.push((i as u32, j as u32));
            }
        }
    }
    pairs
}
