// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::f32::consts::PI;

use crate::error::{RtmError, Result};

/// Sample a Ricker (Mexican hat) wavelet of peak frequency `f0`.
///
/// The pulse is delayed by `t0 = 1 / f0`, so sample `it` is taken at
/// `t = it * dt - t0` and equals `(1 - 2a^2) * exp(-a^2)` with `a = pi * f0 * t`.
///
/// # Errors
/// Returns [`RtmError::InvalidWavelet`] if `nt < 2`, `dt <= 0` or `f0 <= 0`.
pub fn ricker_wavelet(nt: usize, dt: f32, f0: f32) -> Result<Vec<f32>> {
    if nt < 2 || !(dt > 0.0) || !(f0 > 0.0) {
        return Err(RtmError::InvalidWavelet { nt, dt, f0 });
    }

    let t0 = 1.0 / f0;
    let wavelet = (0..nt)
        .map(|it| {
            let t = it as f32 * dt - t0;
            let a = PI * f0 * t;
            let a2 = a * a;
            (1.0 - 2.0 * a2) * (-a2).exp()
        })
        .collect();
    Ok(wavelet)
}
