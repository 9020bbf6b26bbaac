// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use rayon::prelude::*;

use crate::error::{RtmError, Result};

/// Cells per parallel work item.
const CORRELATE_CHUNK: usize = 4096;

/// Zero-lag cross-correlation imaging condition:
/// `image[i] += source[i] * receiver[i]` for every cell.
///
/// No illumination compensation is applied.
///
/// # Errors
/// Returns [`RtmError::ShapeMismatch`] if the three buffers differ in length.
pub fn correlate(source: &[f32], receiver: &[f32], image: &mut [f32]) -> Result<()> {
    if source.len() != image.len() || receiver.len() != image.len() {
        return Err(RtmError::ShapeMismatch {
            expected: vec![image.len()],
            got: vec![source.len(), receiver.len()],
        });
    }
    image
        .par_chunks_mut(CORRELATE_CHUNK)
        .zip(source.par_chunks(CORRELATE_CHUNK))
        .zip(receiver.par_chunks(CORRELATE_CHUNK))
        .for_each(|((img, src), rec)| {
            for ((acc, &s), &r) in img.iter_mut().zip(src).zip(rec) {
                *acc += s * r;
            }
        });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_products() {
        let src = vec![1.0, 2.0, -3.0, 0.5];
        let rec = vec![4.0, -1.0, 2.0, 2.0];
        let mut image = vec![0.0; 4];
        correlate(&src, &rec, &mut image).unwrap();
        assert_eq!(image, vec![4.0, -2.0, -6.0, 1.0]);
        correlate(&src, &rec, &mut image).unwrap();
        assert_eq!(image, vec![8.0, -4.0, -12.0, 2.0]);
    }

    #[test]
    fn spans_many_chunks() {
        let n = CORRELATE_CHUNK * 3 + 17;
        let src: Vec<f32> = (0..n).map(|i| (i % 7) as f32).collect();
        let rec = vec![2.0; n];
        let mut image = vec![1.0; n];
        correlate(&src, &rec, &mut image).unwrap();
        for (i, &v) in image.iter().enumerate() {
            assert_eq!(v, 1.0 + 2.0 * (i % 7) as f32);
        }
    }

    #[test]
    fn length_mismatch() {
        let mut image = vec![0.0; 3];
        let result = correlate(&[1.0; 3], &[1.0; 2], &mut image);
        assert!(matches!(result, Err(RtmError::ShapeMismatch { .. })));
    }
}
