// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::{s, Array2};
use serde::Serialize;

use crate::error::{RtmError, Result};
use crate::model::{GridModel2D, MigrationResult};

/// Decimation and cropping applied while loading a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLoadOptions {
    /// Keep every `decim_x`-th column (>= 1).
    pub decim_x: usize,
    /// Keep every `decim_z`-th row (>= 1).
    pub decim_z: usize,
    /// Keep at most this many columns after decimation; 0 keeps all.
    pub crop_x: usize,
    /// Keep at most this many rows after decimation; 0 keeps all.
    pub crop_z: usize,
}

impl Default for GridLoadOptions {
    fn default() -> Self {
        GridLoadOptions {
            decim_x: 1,
            decim_z: 1,
            crop_x: 0,
            crop_z: 0,
        }
    }
}

fn parse_error(path: &Path, reason: impl Into<String>) -> RtmError {
    RtmError::Parse {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Return the text strictly between the first `[` and the last `]`.
/// Anything around it (such as a `var x = ` prefix) is ignored.
fn array_body<'a>(text: &'a str, path: &Path) -> Result<&'a str> {
    match (text.find('['), text.rfind(']')) {
        (Some(b), Some(e)) if b < e => Ok(&text[b + 1..e]),
        _ => Err(parse_error(path, "no JSON array found")),
    }
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
}

/// Parse every number in `text`. Any character that cannot be part of a
/// number separates tokens, so stray, doubled or trailing commas are ignored.
fn parse_numbers(text: &str, path: &Path) -> Result<Vec<f32>> {
    text.split(|c: char| !is_number_char(c))
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            tok.parse::<f32>()
                .map_err(|_| parse_error(path, format!("invalid number '{}'", tok)))
        })
        .collect()
}

/// Load a 1D numeric array from a JSON (or JavaScript-wrapped JSON) file.
///
/// Numbers are tokenized leniently, so arrays exported with trailing or
/// doubled commas still load.
///
/// # Errors
/// Returns [`RtmError::Parse`] if no array is found, a token is not a number
/// or the array is empty.
pub fn load_array_1d_json(path: &Path) -> Result<Vec<f32>> {
    let text = std::fs::read_to_string(path)?;
    let values = parse_numbers(array_body(&text, path)?, path)?;
    if values.is_empty() {
        return Err(parse_error(path, "empty 1D array"));
    }
    Ok(values)
}

/// Load a 2D numeric array (array of rows) from a JSON file.
///
/// Every bracketed group at nesting depth 2 is one row; numbers inside it are
/// tokenized like [`load_array_1d_json`]. Empty rows are skipped.
///
/// # Errors
/// Returns [`RtmError::Parse`] if the file has no `[`, a token is not a number
/// or there are no non-empty rows.
pub fn load_array_2d_json(path: &Path) -> Result<Vec<Vec<f32>>> {
    let text = std::fs::read_to_string(path)?;
    if !text.contains('[') {
        return Err(parse_error(path, "no JSON array found"));
    }

    let mut rows = Vec::new();
    let mut depth = 0usize;
    let mut row_start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '[' => {
                depth += 1;
                if depth == 2 {
                    row_start = i + 1;
                }
            }
            ']' => {
                if depth == 2 {
                    let row = parse_numbers(&text[row_start..i], path)?;
                    if !row.is_empty() {
                        rows.push(row);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }
    if rows.is_empty() {
        return Err(parse_error(path, "empty 2D array"));
    }
    Ok(rows)
}

/// Load a 2D `[nz][nx]` array from a .npy file (f32, or f64 narrowed to f32).
pub fn load_values_npy(path: &Path) -> Result<Array2<f32>> {
    match ndarray_npy::read_npy::<_, Array2<f32>>(path) {
        Ok(a) => Ok(a),
        Err(_) => {
            let arr64: Array2<f64> = ndarray_npy::read_npy(path)
                .map_err(|e| RtmError::UnsupportedDtype(format!("{}", e)))?;
            Ok(arr64.mapv(|v| v as f32))
        }
    }
}

fn rows_to_array(rows: Vec<Vec<f32>>, ncols: usize) -> Result<Array2<f32>> {
    let nrows = rows.len();
    for row in &rows {
        if row.len() != ncols {
            return Err(RtmError::ShapeMismatch {
                expected: vec![nrows, ncols],
                got: vec![nrows, row.len()],
            });
        }
    }
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((nrows, ncols), flat)
        .map_err(|e| RtmError::Other(format!("shape error: {}", e)))
}

fn load_values(path: &Path, nx: usize) -> Result<Array2<f32>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("npy") => load_values_npy(path),
        _ => rows_to_array(load_array_2d_json(path)?, nx),
    }
}

/// Load a velocity model from an x-axis file, a z-axis file and a 2D value
/// file, applying decimation and cropping.
///
/// The axis files are 1D JSON arrays of coordinates; only their first two
/// samples matter for the spacing. The value file is a `[nz][nx]` JSON array
/// or, with a `.npy` extension, a NumPy array.
///
/// # Errors
/// Returns an error if a decimation factor is zero, an axis has fewer than two
/// samples, or the value array does not match the axis lengths.
pub fn load_grid_model(
    x_file: &Path,
    z_file: &Path,
    values_file: &Path,
    opts: &GridLoadOptions,
) -> Result<GridModel2D> {
    if opts.decim_x == 0 || opts.decim_z == 0 {
        return Err(RtmError::InvalidConfig(
            "decimation must be >= 1".to_string(),
        ));
    }

    let x = load_array_1d_json(x_file)?;
    let z = load_array_1d_json(z_file)?;
    if x.len() < 2 || z.len() < 2 {
        return Err(RtmError::InvalidConfig(
            "grid axes must have at least two samples".to_string(),
        ));
    }

    let values = load_values(values_file, x.len())?;
    if values.dim() != (z.len(), x.len()) {
        return Err(RtmError::ShapeMismatch {
            expected: vec![z.len(), x.len()],
            got: values.shape().to_vec(),
        });
    }

    let decimated = values.slice(s![..;opts.decim_z, ..;opts.decim_x]);
    let (nz_max, nx_max) = decimated.dim();
    let nx = if opts.crop_x == 0 {
        nx_max
    } else {
        opts.crop_x.min(nx_max)
    };
    let nz = if opts.crop_z == 0 {
        nz_max
    } else {
        opts.crop_z.min(nz_max)
    };
    let cropped = decimated.slice(s![..nz, ..nx]);

    GridModel2D::new(
        nx,
        nz,
        (x[1] - x[0]) * opts.decim_x as f32,
        (z[1] - z[0]) * opts.decim_z as f32,
        cropped.iter().copied().collect(),
    )
}

/// Supported image output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// 8-bit binary PGM, symmetric around mid-grey.
    Pgm8,
    /// Little-endian f32 samples plus a `<path>.json` header.
    Float32Raw,
    /// NumPy .npy, shape `[nz][nx]`.
    Npy,
}

impl OutputFormat {
    /// Name used in config files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Pgm8 => "pgm8",
            OutputFormat::Float32Raw => "float32_raw",
            OutputFormat::Npy => "npy",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = RtmError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pgm8" => Ok(OutputFormat::Pgm8),
            "float32_raw" => Ok(OutputFormat::Float32Raw),
            "npy" => Ok(OutputFormat::Npy),
            other => Err(RtmError::UnsupportedFileFormat(other.to_string())),
        }
    }
}

fn check_image_shape(image: &[f32], nx: usize, nz: usize) -> Result<()> {
    if nx == 0 || nz == 0 || image.len() != nx * nz {
        return Err(RtmError::ShapeMismatch {
            expected: vec![nz, nx],
            got: vec![image.len()],
        });
    }
    Ok(())
}

/// Write a row-major `[nz][nx]` image as an 8-bit binary PGM.
///
/// Values are scaled by the largest magnitude so that 0 maps to mid-grey.
pub fn write_pgm(path: &Path, image: &[f32], nx: usize, nz: usize) -> Result<()> {
    check_image_shape(image, nx, nz)?;

    let max_abs = image.iter().fold(1e-9_f32, |m, &v| m.max(v.abs()));
    let pixels: Vec<u8> = image
        .iter()
        .map(|&v| {
            let n = 0.5 + 0.5 * (v / max_abs);
            (n.clamp(0.0, 1.0) * 255.0) as u8
        })
        .collect();

    let file = std::fs::File::create(path)?;
    let mut w = std::io::BufWriter::new(file);
    write!(w, "P5\n{} {}\n255\n", nx, nz)?;
    w.write_all(&pixels)?;
    w.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct RawHeader {
    dtype: &'static str,
    layout: &'static str,
    nx: usize,
    nz: usize,
}

/// Path of the JSON header written next to a raw image.
pub fn raw_header_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".json");
    PathBuf::from(s)
}

/// Write a row-major `[nz][nx]` image as raw little-endian f32 samples, with a
/// JSON header at `<path>.json`.
pub fn write_float32_raw(path: &Path, image: &[f32], nx: usize, nz: usize) -> Result<()> {
    check_image_shape(image, nx, nz)?;

    let file = std::fs::File::create(path)?;
    let mut w = std::io::BufWriter::new(file);
    for &v in image {
        w.write_all(&v.to_le_bytes())?;
    }
    w.flush()?;

    let header = RawHeader {
        dtype: "float32",
        layout: "row-major [nz][nx]",
        nx,
        nz,
    };
    let hdr = std::fs::File::create(raw_header_path(path))?;
    let mut hw = std::io::BufWriter::new(hdr);
    serde_json::to_writer_pretty(&mut hw, &header)
        .map_err(|e| RtmError::Other(format!("header write error: {}", e)))?;
    hw.write_all(b"\n")?;
    hw.flush()?;
    Ok(())
}

/// Write a row-major `[nz][nx]` image as a 2D .npy array.
pub fn write_npy(path: &Path, image: &[f32], nx: usize, nz: usize) -> Result<()> {
    check_image_shape(image, nx, nz)?;
    let arr = Array2::from_shape_vec((nz, nx), image.to_vec())
        .map_err(|e| RtmError::Other(format!("shape error: {}", e)))?;
    ndarray_npy::write_npy(path, &arr)
        .map_err(|e| RtmError::Other(format!("npy write error: {}", e)))?;
    Ok(())
}

/// Write a migration result in the given format, creating the parent
/// directory if needed. Returns every file written.
pub fn write_image(
    path: &Path,
    result: &MigrationResult,
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let (image, nx, nz) = (&result.inline_xz, result.nx, result.nz);
    match format {
        OutputFormat::Pgm8 => {
            write_pgm(path, image, nx, nz)?;
            Ok(vec![path.to_path_buf()])
        }
        OutputFormat::Float32Raw => {
            write_float32_raw(path, image, nx, nz)?;
            Ok(vec![path.to_path_buf(), raw_header_path(path)])
        }
        OutputFormat::Npy => {
            write_npy(path, image, nx, nz)?;
            Ok(vec![path.to_path_buf()])
        }
    }
}
