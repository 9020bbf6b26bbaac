// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{RtmError, Result};

/// Smallest model extent the engine accepts along x and z.
pub const MIN_MODEL_SIZE: usize = 8;
/// Smallest cross-line extent.
pub const MIN_NY: usize = 4;
/// Smallest number of time steps.
pub const MIN_NT: usize = 2;

/// A 2D velocity model on a uniform `(x, z)` grid.
///
/// `values` is row-major with depth as the row index: the sample at
/// `(ix, iz)` lives at `values[iz * nx + ix]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridModel2D {
    /// Number of in-line samples.
    pub nx: usize,
    /// Number of depth samples.
    pub nz: usize,
    /// In-line spacing.
    pub dx: f32,
    /// Depth spacing.
    pub dz: f32,
    /// Velocity samples, `[nz][nx]`.
    pub values: Vec<f32>,
}

impl GridModel2D {
    /// Create a model, checking that `values` holds exactly `nx * nz` samples.
    ///
    /// # Errors
    /// Returns [`RtmError::ModelSizeMismatch`] on a length mismatch.
    pub fn new(nx: usize, nz: usize, dx: f32, dz: f32, values: Vec<f32>) -> Result<Self> {
        if values.len() != nx * nz {
            return Err(RtmError::ModelSizeMismatch {
                expected: nx * nz,
                got: values.len(),
            });
        }
        Ok(GridModel2D {
            nx,
            nz,
            dx,
            dz,
            values,
        })
    }

    /// A model with the same velocity everywhere.
    pub fn uniform(nx: usize, nz: usize, dx: f32, dz: f32, velocity: f32) -> Self {
        GridModel2D {
            nx,
            nz,
            dx,
            dz,
            values: vec![velocity; nx * nz],
        }
    }

    /// Check the constraints the engine places on a model.
    ///
    /// # Errors
    /// Returns an error if either extent is below [`MIN_MODEL_SIZE`], a spacing
    /// is not positive, or the value array has the wrong length.
    pub fn validate(&self) -> Result<()> {
        if self.nx < MIN_MODEL_SIZE || self.nz < MIN_MODEL_SIZE {
            return Err(RtmError::InvalidModelShape {
                nx: self.nx,
                nz: self.nz,
            });
        }
        if !(self.dx > 0.0 && self.dx.is_finite()) || !(self.dz > 0.0 && self.dz.is_finite()) {
            return Err(RtmError::InvalidModelSpacing {
                dx: self.dx,
                dz: self.dz,
            });
        }
        if self.values.len() != self.nx * self.nz {
            return Err(RtmError::ModelSizeMismatch {
                expected: self.nx * self.nz,
                got: self.values.len(),
            });
        }
        Ok(())
    }

    /// Largest velocity in the model (0 for an empty model).
    pub fn max_velocity(&self) -> f32 {
        self.values.iter().fold(0.0_f32, |m, &v| m.max(v))
    }
}

/// Parameters of one single-shot migration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RtmConfig {
    /// Cross-line extent in cells.
    pub ny: usize,
    /// Cross-line spacing.
    pub dy: f32,
    /// Time step.
    pub dt: f32,
    /// Number of time steps.
    pub nt: usize,
    /// Source peak frequency.
    pub f0: f32,
    /// Absorbing layer thickness in cells.
    pub pml: usize,
    /// Cell spacing between receivers.
    pub receiver_stride: usize,
}

impl Default for RtmConfig {
    fn default() -> Self {
        RtmConfig {
            ny: 32,
            dy: 20.0,
            dt: 0.0015,
            nt: 300,
            f0: 12.0,
            pml: 10,
            receiver_stride: 8,
        }
    }
}

impl RtmConfig {
    /// Check every run parameter.
    ///
    /// # Errors
    /// Returns [`RtmError::InvalidConfig`] naming the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.ny < MIN_NY {
            return Err(RtmError::InvalidConfig(format!(
                "ny must be >= {}, got {}",
                MIN_NY, self.ny
            )));
        }
        if self.nt < MIN_NT {
            return Err(RtmError::InvalidConfig(format!(
                "nt must be >= {}, got {}",
                MIN_NT, self.nt
            )));
        }
        for (name, value) in [("dy", self.dy), ("dt", self.dt), ("f0", self.f0)] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(RtmError::InvalidConfig(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        if self.receiver_stride == 0 {
            return Err(RtmError::InvalidConfig(
                "receiver_stride must be > 0".to_string(),
            ));
        }
        if self.pml == 0 {
            return Err(RtmError::InvalidConfig("pml must be > 0".to_string()));
        }
        Ok(())
    }
}

/// The migrated in-line image.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationResult {
    /// Number of in-line samples.
    pub nx: usize,
    /// Number of depth samples.
    pub nz: usize,
    /// Image at the central cross-line, row-major `[nz][nx]`.
    pub inline_xz: Vec<f32>,
}

impl MigrationResult {
    /// Sum of absolute image values.
    pub fn l1_norm(&self) -> f64 {
        self.inline_xz.iter().map(|&v| (v as f64).abs()).sum()
    }

    /// Image value at `(ix, iz)`, or `None` outside the image.
    pub fn at(&self, ix: usize, iz: usize) -> Option<f32> {
        if ix >= self.nx || iz >= self.nz {
            return None;
        }
        self.inline_xz.get(iz * self.nx + ix).copied()
    }
}
