// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Single-shot acoustic reverse-time migration (RTM) on a 3D grid.
//!
//! A 2D velocity model (in-line `x` by depth `z`) is extruded along a
//! cross-line axis into a 3D volume. A Ricker source near the surface is
//! propagated with a second-order finite-difference scheme while every
//! wavefield snapshot is kept and a line of receivers is recorded. The
//! recorded traces are then injected back in reverse time, and the zero-lag
//! cross-correlation of the two wavefields forms the image. The output is the
//! image slice at the central cross-line.
//!
//! Stencil updates and imaging run in parallel with rayon. Results do not
//! depend on the thread count.

#![warn(missing_docs)]

/// Absorbing boundary taper.
pub mod boundary;
/// Command-line run options and JSON config files.
pub mod config;
/// Extrusion of a 2D model into a 3D velocity volume.
pub mod embed;
/// Migration driver: forward pass, backward pass and imaging.
pub mod engine;
/// Error types for the library.
pub mod error;
/// Source and receiver placement, trace recording and re-injection.
pub mod geometry;
/// Forward wavefield storage.
pub mod history;
/// Zero-lag cross-correlation imaging condition.
pub mod imaging;
/// Model loading and image writing.
pub mod io;
/// 2D models, run parameters and results.
pub mod model;
/// Finite-difference wave propagation.
pub mod propagation;
/// Dense 3D grids.
pub mod volume;
/// Source wavelets.
pub mod wavelet;

pub use crate::engine::{run_single_shot_rtm, ProgressInfo, RtmEngine, Stage};
pub use crate::error::{Result, RtmError};
pub use crate::model::{GridModel2D, MigrationResult, RtmConfig};
pub use crate::volume::Volume3D;
pub use crate::wavelet::ricker_wavelet;
