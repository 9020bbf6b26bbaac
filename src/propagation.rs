// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use rayon::prelude::*;

use crate::error::{RtmError, Result};
use crate::volume::Volume3D;

/// Uniform cell spacing along each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpacing {
    /// In-line spacing.
    pub dx: f32,
    /// Cross-line spacing.
    pub dy: f32,
    /// Depth spacing.
    pub dz: f32,
}

/// Courant number `v * dt * sqrt(1/dx^2 + 1/dy^2 + 1/dz^2)` of the
/// second-order 3D scheme. The explicit update is stable for values <= 1.
pub fn courant_number(vmax: f32, dt: f32, spacing: GridSpacing) -> f32 {
    let GridSpacing { dx, dy, dz } = spacing;
    let s = 1.0 / (dx * dx) + 1.0 / (dy * dy) + 1.0 / (dz * dz);
    vmax * dt * s.sqrt()
}

/// Three same-shaped buffers holding a wavefield at `t-1`, `t` and `t+1`.
///
/// [`WavefieldTriple::rotate`] shifts the roles forward in time by swapping
/// buffers; contents are never copied.
#[derive(Debug, Clone)]
pub struct WavefieldTriple {
    prev: Vec<f32>,
    cur: Vec<f32>,
    next: Vec<f32>,
}

impl WavefieldTriple {
    /// Three zeroed buffers of `len` cells.
    pub fn zeros(len: usize) -> Self {
        WavefieldTriple {
            prev: vec![0.0; len],
            cur: vec![0.0; len],
            next: vec![0.0; len],
        }
    }

    /// Field at `t-1`.
    pub fn prev(&self) -> &[f32] {
        &self.prev
    }

    /// Field at `t`.
    pub fn cur(&self) -> &[f32] {
        &self.cur
    }

    /// Field at `t+1`.
    pub fn next(&self) -> &[f32] {
        &self.next
    }

    /// Mutable field at `t+1`, for source and receiver injection.
    pub fn next_mut(&mut self) -> &mut [f32] {
        &mut self.next
    }

    /// `prev <- cur`, `cur <- next`; the old `prev` buffer becomes scratch
    /// space for the following step.
    pub fn rotate(&mut self) {
        std::mem::swap(&mut self.prev, &mut self.cur);
        std::mem::swap(&mut self.cur, &mut self.next);
    }
}

/// Explicit second-order finite-difference propagator for the acoustic wave
/// equation over a fixed velocity volume and damping mask.
pub struct Propagator {
    shape: [usize; 3],
    spacing: GridSpacing,
    /// `v^2 * dt^2` per cell.
    vel2_dt2: Vec<f32>,
    damp: Vec<f32>,
}

impl Propagator {
    /// Build a propagator for `velocity` with the given damping mask.
    ///
    /// # Errors
    /// Returns [`RtmError::ShapeMismatch`] if the mask and velocity volumes
    /// differ in shape.
    pub fn new(velocity: &Volume3D, damp: &Volume3D, dt: f32, spacing: GridSpacing) -> Result<Self> {
        if velocity.shape() != damp.shape() {
            return Err(RtmError::ShapeMismatch {
                expected: velocity.shape().to_vec(),
                got: damp.shape().to_vec(),
            });
        }
        let dt2 = dt * dt;
        let vel2_dt2 = velocity.as_slice().iter().map(|&v| (v * v) * dt2).collect();
        Ok(Propagator {
            shape: velocity.shape(),
            spacing,
            vel2_dt2,
            damp: damp.as_slice().to_vec(),
        })
    }

    /// Volume shape as `[nx, ny, nz]`.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Number of cells per field.
    pub fn len(&self) -> usize {
        self.vel2_dt2.len()
    }

    /// True if the volume has no cells.
    pub fn is_empty(&self) -> bool {
        self.vel2_dt2.is_empty()
    }

    /// Compute `next` from `prev` and `cur`.
    ///
    /// `next` is zero-filled first, then every interior cell receives
    /// `(2 cur - prev + v^2 dt^2 lap(cur)) * damp`. Cells on any face stay 0.
    /// Each cell is written by exactly one task, so the result does not depend
    /// on the number of threads.
    pub fn step(&self, prev: &[f32], cur: &[f32], next: &mut [f32]) {
        let [nx, ny, nz] = self.shape;
        let GridSpacing { dx, dy, dz } = self.spacing;
        let (dx2, dy2, dz2) = (dx * dx, dy * dy, dz * dz);
        let slab = nx * ny;
        if slab == 0 {
            return;
        }
        debug_assert_eq!(prev.len(), self.len());
        debug_assert_eq!(cur.len(), self.len());
        debug_assert_eq!(next.len(), self.len());

        next.par_chunks_mut(slab)
            .enumerate()
            .for_each(|(iz, out)| {
                out.fill(0.0);
                if iz == 0 || iz + 1 >= nz {
                    return;
                }
                for iy in 1..ny.saturating_sub(1) {
                    let row = iy * nx;
                    for ix in 1..nx.saturating_sub(1) {
                        let i = iz * slab + row + ix;
                        let c = cur[i];
                        let d2x = (cur[i + 1] - 2.0 * c + cur[i - 1]) / dx2;
                        let d2y = (cur[i + nx] - 2.0 * c + cur[i - nx]) / dy2;
                        let d2z = (cur[i + slab] - 2.0 * c + cur[i - slab]) / dz2;
                        let lap = d2x + d2y + d2z;
                        out[row + ix] = (2.0 * c - prev[i] + self.vel2_dt2[i] * lap) * self.damp[i];
                    }
                }
            });
    }

    /// Step the triple's `(prev, cur)` into its `next` buffer. The caller
    /// rotates once any injection into `next` is done.
    pub fn advance(&self, field: &mut WavefieldTriple) {
        let WavefieldTriple { prev, cur, next } = field;
        self.step(prev, cur, next);
    }
}
