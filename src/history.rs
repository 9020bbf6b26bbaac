// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{RtmError, Result};

/// Full-volume snapshots of the source wavefield, one per forward time step.
///
/// All snapshots live in one contiguous buffer reserved up front, which is
/// `nt * cells` values: the dominant memory cost of a run.
#[derive(Debug, Clone)]
pub struct WavefieldHistory {
    cells: usize,
    capacity: usize,
    data: Vec<f32>,
}

impl WavefieldHistory {
    /// Reserve room for `nt` snapshots of `cells` values each.
    pub fn with_capacity(nt: usize, cells: usize) -> Self {
        WavefieldHistory {
            cells,
            capacity: nt,
            data: Vec::with_capacity(nt * cells),
        }
    }

    /// Bytes needed for `nt` snapshots of `cells` values.
    pub fn bytes_required(nt: usize, cells: usize) -> usize {
        nt * cells * std::mem::size_of::<f32>()
    }

    /// Append a copy of `field` as the next snapshot.
    ///
    /// # Errors
    /// Returns an error if `field` has the wrong length or the history is full.
    pub fn push(&mut self, field: &[f32]) -> Result<()> {
        if field.len() != self.cells {
            return Err(RtmError::ShapeMismatch {
                expected: vec![self.cells],
                got: vec![field.len()],
            });
        }
        if self.len() >= self.capacity {
            return Err(RtmError::Other(format!(
                "wavefield history is full ({} snapshots)",
                self.capacity
            )));
        }
        self.data.extend_from_slice(field);
        Ok(())
    }

    /// Number of snapshots stored.
    pub fn len(&self) -> usize {
        if self.cells == 0 {
            0
        } else {
            self.data.len() / self.cells
        }
    }

    /// True if no snapshot has been stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Snapshot taken at step `it`, or `None` if it was never stored.
    pub fn snapshot(&self, it: usize) -> Option<&[f32]> {
        if it >= self.len() {
            return None;
        }
        let start = it * self.cells;
        Some(&self.data[start..start + self.cells])
    }

    /// Snapshots from the last step back to the first, paired with their step.
    pub fn iter_rev(&self) -> impl Iterator<Item = (usize, &[f32])> + '_ {
        let n = self.len();
        (0..n).rev().map(move |it| {
            let start = it * self.cells;
            (it, &self.data[start..start + self.cells])
        })
    }
}
