// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{RtmError, Result};
use crate::volume::Volume3D;

/// Depth index of the source and of the receiver line.
pub const SOURCE_DEPTH: usize = 2;

/// Minimum number of receivers on a line.
pub const MIN_RECEIVERS: usize = 2;

/// Source cell `[nx/2, ny/2, SOURCE_DEPTH]` of a volume.
pub fn source_position(vol: &Volume3D) -> [usize; 3] {
    [vol.nx() / 2, vol.ny() / 2, SOURCE_DEPTH]
}

/// In-line receiver positions for a line with `stride` cells between
/// receivers.
///
/// There are `max(2, nx / stride)` receivers at `min(1 + ir * stride, nx - 2)`,
/// so every receiver sits at least one cell inside the domain.
///
/// # Errors
/// Returns [`RtmError::InvalidConfig`] if `stride` is zero or the volume is
/// narrower than three cells.
pub fn receiver_positions(vol: &Volume3D, stride: usize) -> Result<Vec<usize>> {
    if stride == 0 {
        return Err(RtmError::InvalidConfig(
            "receiver_stride must be > 0".to_string(),
        ));
    }
    let nx = vol.nx();
    if nx < 3 {
        return Err(RtmError::InvalidConfig(format!(
            "receiver line needs nx >= 3, got {}",
            nx
        )));
    }
    let count = (nx / stride).max(MIN_RECEIVERS);
    Ok((0..count)
        .map(|ir| ir.saturating_mul(stride).saturating_add(1).min(nx - 2))
        .collect())
}

/// Receiver samples for every time step, stored as `[nt][receiver_count]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceTable {
    nt: usize,
    receiver_count: usize,
    data: Vec<f32>,
}

impl TraceTable {
    /// A zeroed table.
    pub fn zeros(nt: usize, receiver_count: usize) -> Self {
        TraceTable {
            nt,
            receiver_count,
            data: vec![0.0; nt * receiver_count],
        }
    }

    /// Number of time steps.
    pub fn nt(&self) -> usize {
        self.nt
    }

    /// Number of receivers.
    pub fn receiver_count(&self) -> usize {
        self.receiver_count
    }

    /// Sample of receiver `ir` at time `it`, or `None` outside the table.
    pub fn get(&self, it: usize, ir: usize) -> Option<f32> {
        if it >= self.nt || ir >= self.receiver_count {
            return None;
        }
        Some(self.data[it * self.receiver_count + ir])
    }

    /// All receiver samples at time `it`.
    pub fn row(&self, it: usize) -> &[f32] {
        let start = it * self.receiver_count;
        &self.data[start..start + self.receiver_count]
    }

    fn row_mut(&mut self, it: usize) -> &mut [f32] {
        let start = it * self.receiver_count;
        &mut self.data[start..start + self.receiver_count]
    }

    /// The trace recorded by receiver `ir`, one sample per time step.
    pub fn trace(&self, ir: usize) -> Vec<f32> {
        (0..self.nt)
            .map(|it| self.data[it * self.receiver_count + ir])
            .collect()
    }

    /// Raw `[nt][receiver_count]` buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    fn check(&self, it: usize, positions: &[usize]) -> Result<()> {
        if it >= self.nt || positions.len() != self.receiver_count {
            return Err(RtmError::ShapeMismatch {
                expected: vec![self.nt, self.receiver_count],
                got: vec![it + 1, positions.len()],
            });
        }
        Ok(())
    }
}

/// Copy `field` at each receiver cell `(positions[ir], iy, iz)` into
/// `table[it, ir]`.
///
/// # Errors
/// Returns an error if a receiver cell is outside `vol`, or `it` and
/// `positions` do not fit the table.
pub fn record(
    vol: &Volume3D,
    iy: usize,
    iz: usize,
    positions: &[usize],
    field: &[f32],
    table: &mut TraceTable,
    it: usize,
) -> Result<()> {
    table.check(it, positions)?;
    let row = table.row_mut(it);
    for (sample, &ix) in row.iter_mut().zip(positions) {
        *sample = field[vol.checked_index(ix, iy, iz)?];
    }
    Ok(())
}

/// Add `table[it, ir]` into `field` at each receiver cell. Contributions to a
/// cell shared by several receivers accumulate.
///
/// # Errors
/// Returns an error if a receiver cell is outside `vol`, or `it` and
/// `positions` do not fit the table.
pub fn inject(
    vol: &Volume3D,
    iy: usize,
    iz: usize,
    positions: &[usize],
    table: &TraceTable,
    it: usize,
    field: &mut [f32],
) -> Result<()> {
    table.check(it, positions)?;
    for (&sample, &ix) in table.row(it).iter().zip(positions) {
        field[vol.checked_index(ix, iy, iz)?] += sample;
    }
    Ok(())
}

/// Extract the `iy = ny / 2` slice of `image` as a row-major `[nz][nx]` array.
///
/// # Errors
/// Returns [`RtmError::ShapeMismatch`] if `image` does not match `vol`.
pub fn extract_inline_xz(vol: &Volume3D, image: &[f32]) -> Result<Vec<f32>> {
    if image.len() != vol.len() {
        return Err(RtmError::ShapeMismatch {
            expected: vol.shape().to_vec(),
            got: vec![image.len()],
        });
    }
    let (nx, nz) = (vol.nx(), vol.nz());
    let ymid = vol.ny() / 2;
    let mut inline_xz = Vec::with_capacity(nx * nz);
    for iz in 0..nz {
        let start = vol.index(0, ymid, iz);
        inline_xz.extend_from_slice(&image[start..start + nx]);
    }
    Ok(inline_xz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_with_stride() {
        let vol = Volume3D::new(32, 4, 8, 0.0);
        let rx = receiver_positions(&vol, 4).unwrap();
        assert_eq!(rx, vec![1, 5, 9, 13, 17, 21, 25, 29]);
    }

    #[test]
    fn positions_clamped_inside() {
        let vol = Volume3D::new(10, 4, 8, 0.0);
        let rx = receiver_positions(&vol, 3).unwrap();
        assert_eq!(rx, vec![1, 4, 7]);
        let rx = receiver_positions(&vol, 4).unwrap();
        assert_eq!(rx, vec![1, 5]);
        let rx = receiver_positions(&vol, 1).unwrap();
        assert_eq!(rx.len(), 10);
        assert_eq!(*rx.last().unwrap(), 8);
        assert!(rx.iter().all(|&x| (1..=8).contains(&x)));
    }

    #[test]
    fn at_least_two_receivers() {
        let vol = Volume3D::new(8, 4, 8, 0.0);
        let rx = receiver_positions(&vol, 100).unwrap();
        assert_eq!(rx, vec![1, 6]);
    }

    #[test]
    fn rejects_zero_stride() {
        let vol = Volume3D::new(8, 4, 8, 0.0);
        assert!(receiver_positions(&vol, 0).is_err());
    }

    #[test]
    fn source_at_midpoint() {
        let vol = Volume3D::new(33, 10, 24, 0.0);
        assert_eq!(source_position(&vol), [16, 5, 2]);
    }

    #[test]
    fn record_then_inject_is_lossless() {
        let vol = Volume3D::new(12, 6, 8, 0.0);
        let rx = receiver_positions(&vol, 3).unwrap();
        let (iy, iz) = (3, 2);
        let mut field = vec![0.0; vol.len()];
        for (k, &ix) in rx.iter().enumerate() {
            field[vol.index(ix, iy, iz)] = 0.25 * (k as f32 + 1.0);
        }
        let mut table = TraceTable::zeros(5, rx.len());
        record(&vol, iy, iz, &rx, &field, &mut table, 3).unwrap();

        let mut replay = vec![0.0; vol.len()];
        inject(&vol, iy, iz, &rx, &table, 3, &mut replay).unwrap();
        for &ix in &rx {
            let i = vol.index(ix, iy, iz);
            assert_eq!(replay[i], field[i]);
        }
        assert_eq!(table.row(2), vec![0.0; rx.len()].as_slice());
    }

    #[test]
    fn inject_accumulates() {
        let vol = Volume3D::new(8, 4, 4, 0.0);
        let rx = vec![3, 3];
        let mut table = TraceTable::zeros(1, 2);
        let mut src = vec![0.0; vol.len()];
        src[vol.index(3, 1, 1)] = 2.0;
        record(&vol, 1, 1, &rx, &src, &mut table, 0).unwrap();
        let mut field = vec![1.0; vol.len()];
        inject(&vol, 1, 1, &rx, &table, 0, &mut field).unwrap();
        assert_eq!(field[vol.index(3, 1, 1)], 5.0);
    }

    #[test]
    fn table_accessors() {
        let vol = Volume3D::new(8, 4, 4, 0.0);
        let rx = vec![1, 2];
        let mut table = TraceTable::zeros(3, 2);
        let mut field = vec![0.0; vol.len()];
        for it in 0..3 {
            field[vol.index(2, 0, 0)] = it as f32;
            record(&vol, 0, 0, &rx, &field, &mut table, it).unwrap();
        }
        assert_eq!(table.trace(1), vec![0.0, 1.0, 2.0]);
        assert_eq!(table.get(2, 1), Some(2.0));
        assert_eq!(table.get(3, 0), None);
        assert_eq!(table.as_slice().len(), 6);
    }

    #[test]
    fn record_out_of_range() {
        let vol = Volume3D::new(8, 4, 4, 0.0);
        let field = vec![0.0; vol.len()];
        let mut table = TraceTable::zeros(2, 1);
        assert!(matches!(
            record(&vol, 0, 9, &[1], &field, &mut table, 0),
            Err(RtmError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            record(&vol, 0, 0, &[1], &field, &mut table, 2),
            Err(RtmError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn extract_middle_slice() {
        let (nx, ny, nz) = (4, 5, 3);
        let vol = Volume3D::new(nx, ny, nz, 0.0);
        let image: Vec<f32> = (0..vol.len()).map(|i| i as f32).collect();
        let slice = extract_inline_xz(&vol, &image).unwrap();
        assert_eq!(slice.len(), nx * nz);
        for iz in 0..nz {
            for ix in 0..nx {
                assert_eq!(slice[iz * nx + ix], image[vol.index(ix, 2, iz)]);
            }
        }
        assert!(extract_inline_xz(&vol, &image[1..]).is_err());
    }
}
