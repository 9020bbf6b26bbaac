// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

/// Errors that can occur during model loading, run setup, or image output.
#[derive(Debug)]
pub enum RtmError {
    /// Model grid is too small for the engine (each axis must be >= 8).
    InvalidModelShape {
        /// Number of in-line samples.
        nx: usize,
        /// Number of depth samples.
        nz: usize,
    },
    /// Model cell spacing is not positive and finite.
    InvalidModelSpacing {
        /// In-line spacing.
        dx: f32,
        /// Depth spacing.
        dz: f32,
    },
    /// Model value array length does not equal `nx * nz`.
    ModelSizeMismatch {
        /// Expected number of values.
        expected: usize,
        /// Number of values provided.
        got: usize,
    },
    /// A run parameter violates its constraint.
    InvalidConfig(String),
    /// Ricker wavelet arguments are out of range.
    InvalidWavelet {
        /// Number of samples requested.
        nt: usize,
        /// Sample interval.
        dt: f32,
        /// Peak frequency.
        f0: f32,
    },
    /// A 3D coordinate lies outside the volume.
    IndexOutOfRange {
        /// The coordinate that was requested, as `[ix, iy, iz]`.
        index: [usize; 3],
        /// The volume shape, as `[nx, ny, nz]`.
        shape: [usize; 3],
    },
    /// Array shape does not match expected shape.
    ShapeMismatch {
        /// The expected shape.
        expected: Vec<usize>,
        /// The actual shape encountered.
        got: Vec<usize>,
    },
    /// A text input (JSON array or config file) could not be parsed.
    Parse {
        /// The file being read.
        path: String,
        /// What went wrong.
        reason: String,
    },
    /// Unsupported data type in file.
    UnsupportedDtype(String),
    /// Unsupported file format (unrecognized extension or format name).
    UnsupportedFileFormat(String),
    /// I/O error occurred.
    IoError(std::io::Error),
    /// Other error with a descriptive message.
    Other(String),
}

impl RtmError {
    /// True for the configuration/validation class of errors, which are raised
    /// before any numeric work starts.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RtmError::InvalidModelShape { .. }
                | RtmError::InvalidModelSpacing { .. }
                | RtmError::ModelSizeMismatch { .. }
                | RtmError::InvalidConfig(_)
                | RtmError::InvalidWavelet { .. }
        )
    }
}

impl fmt::Display for RtmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtmError::InvalidModelShape { nx, nz } => {
                write!(
                    f,
                    "model too small: nx={} nz={} (both must be >= 8)",
                    nx, nz
                )
            }
            RtmError::InvalidModelSpacing { dx, dz } => {
                write!(
                    f,
                    "invalid model spacing: dx={} dz={} (must be positive and finite)",
                    dx, dz
                )
            }
            RtmError::ModelSizeMismatch { expected, got } => {
                write!(
                    f,
                    "model values length mismatch: expected {}, got {}",
                    expected, got
                )
            }
            RtmError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            RtmError::InvalidWavelet { nt, dt, f0 } => {
                write!(
                    f,
                    "invalid wavelet arguments: nt={} dt={} f0={} (need nt >= 2, dt > 0, f0 > 0)",
                    nt, dt, f0
                )
            }
            RtmError::IndexOutOfRange { index, shape } => {
                write!(f, "index {:?} out of range for shape {:?}", index, shape)
            }
            RtmError::ShapeMismatch { expected, got } => {
                write!(f, "shape mismatch: expected {:?}, got {:?}", expected, got)
            }
            RtmError::Parse { path, reason } => {
                write!(f, "cannot parse '{}': {}", path, reason)
            }
            RtmError::UnsupportedDtype(dtype) => {
                write!(f, "unsupported dtype: {}", dtype)
            }
            RtmError::UnsupportedFileFormat(ext) => {
                write!(f, "unsupported file format: {}", ext)
            }
            RtmError::IoError(e) => write!(f, "I/O error: {}", e),
            RtmError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RtmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RtmError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RtmError {
    fn from(e: std::io::Error) -> Self {
        RtmError::IoError(e)
    }
}

/// Convenience type alias for Results with RtmError.
pub type Result<T> = std::result::Result<T, RtmError>;
