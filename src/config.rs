// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{RtmError, Result};
use crate::io::{load_grid_model, GridLoadOptions, OutputFormat};
use crate::model::{GridModel2D, RtmConfig};

/// Default image path.
pub const DEFAULT_OUTPUT: &str = "output/migrated_inline.pgm";

/// Everything needed for one command-line run: inputs, load options, run
/// parameters and output.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// X-axis coordinate file.
    pub x_file: Option<PathBuf>,
    /// Z-axis coordinate file.
    pub z_file: Option<PathBuf>,
    /// 2D velocity values file.
    pub values_file: Option<PathBuf>,
    /// Image path.
    pub output_file: PathBuf,
    /// Image format.
    pub output_format: OutputFormat,
    /// Decimation and cropping.
    pub load: GridLoadOptions,
    /// Migration parameters.
    pub rtm: RtmConfig,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            x_file: None,
            z_file: None,
            values_file: None,
            output_file: PathBuf::from(DEFAULT_OUTPUT),
            output_format: OutputFormat::Pgm8,
            load: GridLoadOptions::default(),
            rtm: RtmConfig::default(),
        }
    }
}

impl RunOptions {
    /// Point all three inputs at `x.json`, `z.json` and `vel.json` in `dir`.
    pub fn set_data_dir(&mut self, dir: &Path) {
        self.x_file = Some(dir.join("x.json"));
        self.z_file = Some(dir.join("z.json"));
        self.values_file = Some(dir.join("vel.json"));
    }

    /// The three input files, if all are set.
    pub fn input_files(&self) -> Option<(&Path, &Path, &Path)> {
        match (&self.x_file, &self.z_file, &self.values_file) {
            (Some(x), Some(z), Some(v)) => Some((x.as_path(), z.as_path(), v.as_path())),
            _ => None,
        }
    }

    /// Check that inputs are present and every parameter is in range.
    ///
    /// # Errors
    /// Returns [`RtmError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.input_files().is_none() {
            return Err(RtmError::InvalidConfig(
                "x/z/values input files are required (or --data-dir / --config)".to_string(),
            ));
        }
        if self.load.decim_x == 0 || self.load.decim_z == 0 {
            return Err(RtmError::InvalidConfig(
                "decimation must be >= 1".to_string(),
            ));
        }
        self.rtm.validate()
    }

    /// Load the model described by the input files and load options.
    pub fn load_model(&self) -> Result<GridModel2D> {
        let (x, z, v) = self.input_files().ok_or_else(|| {
            RtmError::InvalidConfig("x/z/values input files are required".to_string())
        })?;
        load_grid_model(x, z, v, &self.load)
    }
}

/// A flat JSON config file. Every key is optional and unknown keys are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Directory holding `x.json`, `z.json` and `vel.json`.
    pub data_dir: Option<PathBuf>,
    /// X-axis file; overrides `data_dir`.
    pub x_file: Option<PathBuf>,
    /// Z-axis file; overrides `data_dir`.
    pub z_file: Option<PathBuf>,
    /// Values file; overrides `data_dir`.
    pub values_file: Option<PathBuf>,
    /// Image path.
    pub output_file: Option<PathBuf>,
    /// Image format name.
    pub output_format: Option<String>,
    /// In-line decimation.
    pub decim_x: Option<usize>,
    /// Depth decimation.
    pub decim_z: Option<usize>,
    /// In-line crop.
    pub crop_x: Option<usize>,
    /// Depth crop.
    pub crop_z: Option<usize>,
    /// Cross-line extent.
    pub ny: Option<usize>,
    /// Cross-line spacing.
    pub dy: Option<f32>,
    /// Time step.
    pub dt: Option<f32>,
    /// Number of time steps.
    pub nt: Option<usize>,
    /// Source peak frequency.
    pub f0: Option<f32>,
    /// Absorbing layer thickness.
    pub pml: Option<usize>,
    /// Receiver spacing in cells.
    pub receiver_stride: Option<usize>,
}

impl ConfigFile {
    /// Read and parse a config file.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read, or [`RtmError::Parse`]
    /// if it is not a JSON object with correctly typed values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| RtmError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Overlay every key present in the file onto `opts`.
    ///
    /// # Errors
    /// Returns [`RtmError::UnsupportedFileFormat`] for an unknown output format.
    pub fn apply(&self, opts: &mut RunOptions) -> Result<()> {
        if let Some(dir) = &self.data_dir {
            opts.set_data_dir(dir);
        }
        if let Some(v) = &self.x_file {
            opts.x_file = Some(v.clone());
        }
        if let Some(v) = &self.z_file {
            opts.z_file = Some(v.clone());
        }
        if let Some(v) = &self.values_file {
            opts.values_file = Some(v.clone());
        }
        if let Some(v) = &self.output_file {
            opts.output_file = v.clone();
        }
        if let Some(v) = &self.output_format {
            opts.output_format = v.parse()?;
        }

        let load = &mut opts.load;
        overlay(&mut load.decim_x, self.decim_x);
        overlay(&mut load.decim_z, self.decim_z);
        overlay(&mut load.crop_x, self.crop_x);
        overlay(&mut load.crop_z, self.crop_z);

        let rtm = &mut opts.rtm;
        overlay(&mut rtm.ny, self.ny);
        overlay(&mut rtm.dy, self.dy);
        overlay(&mut rtm.dt, self.dt);
        overlay(&mut rtm.nt, self.nt);
        overlay(&mut rtm.f0, self.f0);
        overlay(&mut rtm.pml, self.pml);
        overlay(&mut rtm.receiver_stride, self.receiver_stride);
        Ok(())
    }
}

/// Replace `slot` with `value` when one is given.
pub fn overlay<T: Copy>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}
