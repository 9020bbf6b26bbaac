// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Exponential edge taper applied to the wavefield after every step.
//!
//! This is a simple multiplicative damping layer rather than a split-field
//! PML; some energy leaks back at grazing incidence.

use crate::volume::Volume3D;

/// Taper strength in `exp(-DAMPING_STRENGTH * x^2)`.
pub const DAMPING_STRENGTH: f32 = 0.03;

/// Distance in cells from `(ix, iy, iz)` to the nearest face of the domain.
#[inline]
pub fn boundary_distance(
    nx: usize,
    ny: usize,
    nz: usize,
    ix: usize,
    iy: usize,
    iz: usize,
) -> usize {
    ix.min(nx - 1 - ix)
        .min(iy)
        .min(ny - 1 - iy)
        .min(iz)
        .min(nz - 1 - iz)
}

/// Damping coefficient for a cell at `dist` cells from the boundary.
#[inline]
pub fn damping_coefficient(dist: usize, pml: usize) -> f32 {
    if dist >= pml {
        return 1.0;
    }
    let x = (pml - dist) as f32 / pml as f32;
    (-DAMPING_STRENGTH * x * x).exp()
}

/// Build the per-cell damping mask for a volume of shape `(nx, ny, nz)`.
///
/// Cells at least `pml` cells from every face get `1.0`; closer cells decay
/// toward the faces. The mask is read-only once built.
pub fn make_damping_mask(nx: usize, ny: usize, nz: usize, pml: usize) -> Volume3D {
    let mut mask = Volume3D::new(nx, ny, nz, 1.0);
    let data = mask.as_mut_slice();
    for iz in 0..nz {
        for iy in 0..ny {
            let row = (iz * ny + iy) * nx;
            for ix in 0..nx {
                let dist = boundary_distance(nx, ny, nz, ix, iy, iz);
                data[row + ix] = damping_coefficient(dist, pml);
            }
        }
    }
    mask
}
