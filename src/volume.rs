// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{RtmError, Result};

/// Linear index of cell `(ix, iy, iz)` in a volume of in-line size `nx` and
/// cross-line size `ny`. x varies fastest, then y, then z.
#[inline(always)]
pub fn linear_index(nx: usize, ny: usize, ix: usize, iy: usize, iz: usize) -> usize {
    (iz * ny + iy) * nx + ix
}

/// A dense 3D scalar field on a uniform `(x, y, z)` grid.
///
/// The volume exclusively owns one flat buffer of `nx * ny * nz` values laid
/// out by [`linear_index`]. Its shape is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume3D {
    nx: usize,
    ny: usize,
    nz: usize,
    data: Box<[f32]>,
}

impl Volume3D {
    /// Create a volume of the given shape with every cell set to `fill`.
    pub fn new(nx: usize, ny: usize, nz: usize, fill: f32) -> Self {
        Volume3D {
            nx,
            ny,
            nz,
            data: vec![fill; nx * ny * nz].into_boxed_slice(),
        }
    }

    /// Wrap an existing buffer.
    ///
    /// # Errors
    /// Returns [`RtmError::ShapeMismatch`] if `data.len() != nx * ny * nz`.
    pub fn from_vec(nx: usize, ny: usize, nz: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != nx * ny * nz {
            return Err(RtmError::ShapeMismatch {
                expected: vec![nx, ny, nz],
                got: vec![data.len()],
            });
        }
        Ok(Volume3D {
            nx,
            ny,
            nz,
            data: data.into_boxed_slice(),
        })
    }

    /// Number of cells along x.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Number of cells along y.
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Number of cells along z.
    pub fn nz(&self) -> usize {
        self.nz
    }

    /// Shape as `[nx, ny, nz]`.
    pub fn shape(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if any axis has zero extent.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Linear index of `(ix, iy, iz)`. Performs no bounds check; use
    /// [`Volume3D::checked_index`] for untrusted coordinates.
    #[inline(always)]
    pub fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        linear_index(self.nx, self.ny, ix, iy, iz)
    }

    /// Linear index of `(ix, iy, iz)` after validating each coordinate against
    /// its dimension.
    ///
    /// # Errors
    /// Returns [`RtmError::IndexOutOfRange`] if any coordinate is >= its dimension.
    pub fn checked_index(&self, ix: usize, iy: usize, iz: usize) -> Result<usize> {
        if ix >= self.nx || iy >= self.ny || iz >= self.nz {
            return Err(RtmError::IndexOutOfRange {
                index: [ix, iy, iz],
                shape: self.shape(),
            });
        }
        Ok(self.index(ix, iy, iz))
    }

    /// Bounds-checked read.
    pub fn get(&self, ix: usize, iy: usize, iz: usize) -> Result<f32> {
        let i = self.checked_index(ix, iy, iz)?;
        Ok(self.data[i])
    }

    /// Bounds-checked write.
    pub fn set(&mut self, ix: usize, iy: usize, iz: usize, value: f32) -> Result<()> {
        let i = self.checked_index(ix, iy, iz)?;
        self.data[i] = value;
        Ok(())
    }

    /// Bounds-checked mutable reference.
    pub fn get_mut(&mut self, ix: usize, iy: usize, iz: usize) -> Result<&mut f32> {
        let i = self.checked_index(ix, iy, iz)?;
        Ok(&mut self.data[i])
    }

    /// Raw buffer for bulk operations.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable raw buffer for bulk operations.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume the volume and return its buffer.
    pub fn into_vec(self) -> Vec<f32> {
        self.data.into_vec()
    }
}
