// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{RtmError, Result};
use crate::model::{GridModel2D, RtmConfig};
use crate::volume::Volume3D;

/// Velocity assigned to every cell before the model is copied in.
pub const BACKGROUND_VELOCITY: f32 = 1500.0;

/// Lift a 2D `(x, z)` model into a 3D `(x, y, z)` velocity volume.
///
/// The result has shape `(model.nx, cfg.ny, model.nz)`. Every cross-line
/// index `iy` receives an identical copy of the model, so the medium varies
/// only in-line and with depth.
///
/// # Errors
/// Returns [`RtmError::ModelSizeMismatch`] if the model's value array does not
/// hold `nx * nz` samples.
pub fn embed_velocity(model: &GridModel2D, cfg: &RtmConfig) -> Result<Volume3D> {
    let (nx, nz, ny) = (model.nx, model.nz, cfg.ny);
    if model.values.len() != nx * nz {
        return Err(RtmError::ModelSizeMismatch {
            expected: nx * nz,
            got: model.values.len(),
        });
    }

    let mut vel = Volume3D::new(nx, ny, nz, BACKGROUND_VELOCITY);
    if nx == 0 {
        return Ok(vel);
    }
    let data = vel.as_mut_slice();
    for (iz, src_row) in model.values.chunks_exact(nx).enumerate() {
        for iy in 0..ny {
            let start = (iz * ny + iy) * nx;
            data[start..start + nx].copy_from_slice(src_row);
        }
    }
    Ok(vel)
}
