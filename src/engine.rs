// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::boundary::make_damping_mask;
use crate::embed::embed_velocity;
use crate::error::{RtmError, Result};
use crate::geometry::{
    extract_inline_xz, inject, receiver_positions, record, source_position, TraceTable,
};
use crate::history::WavefieldHistory;
use crate::imaging::correlate;
use crate::model::{GridModel2D, MigrationResult, RtmConfig};
use crate::propagation::{courant_number, GridSpacing, Propagator, WavefieldTriple};
use crate::volume::Volume3D;
use crate::wavelet::ricker_wavelet;

/// Stages of a single-shot migration, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Model and configuration checks.
    Validate,
    /// Velocity volume, damping mask, wavelet and acquisition setup.
    Embed,
    /// Source propagation with history capture and receiver recording.
    Forward,
    /// Receiver back-propagation and imaging.
    Backward,
    /// In-line slice extraction.
    Extract,
    /// Finished.
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validate => "validate",
            Stage::Embed => "embed",
            Stage::Forward => "forward",
            Stage::Backward => "backward",
            Stage::Extract => "extract",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Progress information passed to the optional callback.
#[derive(Debug, Clone, Copy)]
pub struct ProgressInfo {
    /// Pass currently running ([`Stage::Forward`] or [`Stage::Backward`]).
    pub stage: Stage,
    /// Time steps completed in this pass.
    pub step: usize,
    /// Time steps in this pass.
    pub total_steps: usize,
    /// Elapsed time since the run started.
    pub elapsed: Duration,
}

type ProgressFn<'a> = &'a (dyn Fn(ProgressInfo) + Sync);

struct ProgressReporter<'a> {
    callback: Option<ProgressFn<'a>>,
    start: Instant,
    interval: Duration,
    last: Duration,
    log_every: usize,
}

impl<'a> ProgressReporter<'a> {
    fn new(callback: Option<ProgressFn<'a>>, interval: Duration, total_steps: usize) -> Self {
        ProgressReporter {
            callback,
            start: Instant::now(),
            interval,
            last: Duration::ZERO,
            log_every: (total_steps / 10).max(1),
        }
    }

    fn tick(&mut self, stage: Stage, step: usize, total_steps: usize) {
        if step % self.log_every == 0 || step == total_steps {
            debug!(%stage, step, total_steps, "time step");
        }
        let Some(cb) = self.callback else {
            return;
        };
        let elapsed = self.start.elapsed();
        if step == total_steps || elapsed >= self.last + self.interval {
            self.last = elapsed;
            cb(ProgressInfo {
                stage,
                step,
                total_steps,
                elapsed,
            });
        }
    }
}

/// Everything built during the embed stage.
struct ShotSetup {
    velocity: Volume3D,
    propagator: Propagator,
    wavelet: Vec<f32>,
    source: [usize; 3],
    receivers: Vec<usize>,
}

/// A single-shot acoustic reverse-time migration.
///
/// The engine embeds a 2D model into a 3D volume, propagates a Ricker source
/// forward while keeping every wavefield snapshot and recording the receiver
/// line, then back-propagates the recorded traces and correlates them with
/// the stored source wavefield.
///
/// Time stepping is sequential; each stencil update is spread over the rayon
/// pool. Results are bit-identical for any thread count.
///
/// No stability check rejects a run: a `dt` above the Courant limit only logs
/// a warning and may produce divergent or NaN output.
pub struct RtmEngine {
    model: GridModel2D,
    cfg: RtmConfig,
    num_threads: Option<usize>,
    progress_interval: Duration,
    progress_callback: Option<Box<dyn Fn(ProgressInfo) + Send + Sync>>,
}

impl RtmEngine {
    /// Create an engine for `model` and `cfg`, validating both.
    ///
    /// # Errors
    /// Returns a validation error if the model is smaller than 8x8, has a
    /// non-positive spacing or a mis-sized value array, or if any `cfg` field
    /// violates its constraint.
    pub fn new(model: GridModel2D, cfg: RtmConfig) -> Result<Self> {
        info!(stage = %Stage::Validate, nx = model.nx, nz = model.nz, "checking run parameters");
        model.validate()?;
        cfg.validate()?;
        Ok(RtmEngine {
            model,
            cfg,
            num_threads: None,
            progress_interval: Duration::from_millis(500),
            progress_callback: None,
        })
    }

    /// Set the number of worker threads (builder method).
    /// If not specified, defaults to the number of available CPU cores.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Set a progress callback invoked during both passes (builder method).
    pub fn with_progress(mut self, callback: Box<dyn Fn(ProgressInfo) + Send + Sync>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Minimum time between progress callbacks (builder method). Default 500ms.
    /// The last step of each pass is always reported.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// The model being migrated.
    pub fn model(&self) -> &GridModel2D {
        &self.model
    }

    /// The run configuration.
    pub fn config(&self) -> &RtmConfig {
        &self.cfg
    }

    /// Bytes held by the wavefield history during a run.
    pub fn history_bytes(&self) -> usize {
        let cells = self.model.nx * self.cfg.ny * self.model.nz;
        WavefieldHistory::bytes_required(self.cfg.nt, cells)
    }

    fn get_num_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Run the migration and return the in-line image at the central
    /// cross-line.
    ///
    /// # Parameters
    /// - `progress_cb`: Optional callback for progress updates (overrides builder-set callback)
    ///
    /// # Errors
    /// Returns an error only if the worker pool cannot be created; all
    /// parameter checks happen in [`RtmEngine::new`].
    pub fn run(&self, progress_cb: Option<&(dyn Fn(ProgressInfo) + Sync)>) -> Result<MigrationResult> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.get_num_threads())
            .build()
            .map_err(|e| RtmError::Other(e.to_string()))?;

        let callback: Option<ProgressFn<'_>> = match progress_cb {
            Some(cb) => Some(cb),
            None => self
                .progress_callback
                .as_deref()
                .map(|cb| cb as &(dyn Fn(ProgressInfo) + Sync)),
        };

        pool.install(|| self.run_stages(callback))
    }

    fn run_stages(&self, callback: Option<ProgressFn<'_>>) -> Result<MigrationResult> {
        let start = Instant::now();

        let setup = self.embed()?;
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "embed finished");

        let mut reporter = ProgressReporter::new(callback, self.progress_interval, self.cfg.nt);
        let (history, traces) = self.forward(&setup, &mut reporter)?;
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "forward pass finished");

        let image = self.backward(&setup, &history, &traces, &mut reporter)?;
        drop(history);
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "backward pass finished");

        info!(stage = %Stage::Extract, iy = setup.velocity.ny() / 2, "extracting in-line slice");
        let inline_xz = extract_inline_xz(&setup.velocity, &image)?;
        let result = MigrationResult {
            nx: setup.velocity.nx(),
            nz: setup.velocity.nz(),
            inline_xz,
        };

        info!(
            stage = %Stage::Done,
            elapsed_s = start.elapsed().as_secs_f64(),
            "migration complete"
        );
        Ok(result)
    }

    fn embed(&self) -> Result<ShotSetup> {
        let cfg = &self.cfg;
        let velocity = embed_velocity(&self.model, cfg)?;
        let [nx, ny, nz] = velocity.shape();
        info!(
            stage = %Stage::Embed,
            nx,
            ny,
            nz,
            nt = cfg.nt,
            history_mib = self.history_bytes() as f64 / (1024.0 * 1024.0),
            "building velocity volume"
        );

        let damp = make_damping_mask(nx, ny, nz, cfg.pml);
        let spacing = GridSpacing {
            dx: self.model.dx,
            dy: cfg.dy,
            dz: self.model.dz,
        };

        let vmax = self.model.max_velocity();
        let courant = courant_number(vmax, cfg.dt, spacing);
        if !(courant <= 1.0) {
            warn!(
                courant,
                vmax,
                dt = cfg.dt,
                "time step exceeds the stability limit; output may diverge"
            );
        }

        let propagator = Propagator::new(&velocity, &damp, cfg.dt, spacing)?;
        let wavelet = ricker_wavelet(cfg.nt, cfg.dt, cfg.f0)?;
        let source = source_position(&velocity);
        let receivers = receiver_positions(&velocity, cfg.receiver_stride)?;
        debug!(?source, receivers = receivers.len(), "acquisition geometry");

        Ok(ShotSetup {
            velocity,
            propagator,
            wavelet,
            source,
            receivers,
        })
    }

    fn forward(
        &self,
        setup: &ShotSetup,
        reporter: &mut ProgressReporter<'_>,
    ) -> Result<(WavefieldHistory, TraceTable)> {
        let nt = self.cfg.nt;
        let vel = &setup.velocity;
        let [sx, sy, sz] = setup.source;
        let src_idx = vel.checked_index(sx, sy, sz)?;
        info!(stage = %Stage::Forward, nt, "propagating source wavefield");

        let mut field = WavefieldTriple::zeros(vel.len());
        let mut history = WavefieldHistory::with_capacity(nt, vel.len());
        let mut traces = TraceTable::zeros(nt, setup.receivers.len());

        for it in 0..nt {
            setup.propagator.advance(&mut field);
            field.next_mut()[src_idx] += setup.wavelet[it];
            record(vel, sy, sz, &setup.receivers, field.next(), &mut traces, it)?;
            history.push(field.next())?;
            field.rotate();
            reporter.tick(Stage::Forward, it + 1, nt);
        }

        Ok((history, traces))
    }

    fn backward(
        &self,
        setup: &ShotSetup,
        history: &WavefieldHistory,
        traces: &TraceTable,
        reporter: &mut ProgressReporter<'_>,
    ) -> Result<Vec<f32>> {
        let nt = self.cfg.nt;
        let vel = &setup.velocity;
        let [_, sy, sz] = setup.source;
        info!(stage = %Stage::Backward, nt, "back-propagating receiver wavefield");

        let mut field = WavefieldTriple::zeros(vel.len());
        let mut image = vec![0.0_f32; vel.len()];

        for (rit, (it, snapshot)) in history.iter_rev().enumerate() {
            setup.propagator.advance(&mut field);
            inject(vel, sy, sz, &setup.receivers, traces, it, field.next_mut())?;
            correlate(snapshot, field.next(), &mut image)?;
            field.rotate();
            reporter.tick(Stage::Backward, rit + 1, nt);
        }

        Ok(image)
    }
}

/// Validate `model` and `cfg`, then run a single-shot migration on the
/// default thread pool size.
///
/// # Errors
/// Returns a validation error (see [`RtmEngine::new`]) before any numeric
/// work starts.
pub fn run_single_shot_rtm(model: &GridModel2D, cfg: &RtmConfig) -> Result<MigrationResult> {
    RtmEngine::new(model.clone(), *cfg)?.run(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn layered_model(nx: usize, nz: usize) -> GridModel2D {
        let mut values = vec![0.0; nx * nz];
        for iz in 0..nz {
            let v = if iz < nz / 2 { 1800.0 } else { 2600.0 };
            for ix in 0..nx {
                values[iz * nx + ix] = v;
            }
        }
        GridModel2D::new(nx, nz, 25.0, 25.0, values).unwrap()
    }

    fn small_cfg() -> RtmConfig {
        RtmConfig {
            ny: 6,
            dy: 20.0,
            dt: 0.0015,
            nt: 24,
            f0: 12.0,
            pml: 3,
            receiver_stride: 3,
        }
    }

    #[test]
    fn output_shape() {
        let model = layered_model(12, 10);
        let out = RtmEngine::new(model, small_cfg())
            .unwrap()
            .with_threads(1)
            .run(None)
            .unwrap();
        assert_eq!(out.nx, 12);
        assert_eq!(out.nz, 10);
        assert_eq!(out.inline_xz.len(), 120);
        assert!(out.l1_norm() > 0.0);
    }

    #[test]
    fn validation_happens_before_run() {
        let model = layered_model(12, 10);
        let cfg = RtmConfig {
            pml: 0,
            ..small_cfg()
        };
        let err = RtmEngine::new(model, cfg).err().unwrap();
        assert!(err.is_validation());
    }

    #[test]
    fn forward_snapshots_include_source() {
        let model = layered_model(10, 10);
        let engine = RtmEngine::new(model, small_cfg()).unwrap();
        let setup = engine.embed().unwrap();
        let mut reporter = ProgressReporter::new(None, Duration::from_secs(1), 24);
        let (history, traces) = engine.forward(&setup, &mut reporter).unwrap();
        assert_eq!(history.len(), 24);
        assert_eq!(traces.nt(), 24);
        assert_eq!(traces.receiver_count(), setup.receivers.len());

        // The first step starts from rest, so only the injected sample is non-zero.
        let [sx, sy, sz] = setup.source;
        let first = history.snapshot(0).unwrap();
        let src = setup.velocity.index(sx, sy, sz);
        assert_eq!(first[src], setup.wavelet[0]);
        assert_eq!(first.iter().filter(|&&v| v != 0.0).count(), 1);

        // Traces are samples of the stored snapshots at the receiver cells.
        for it in [0, 7, 23] {
            let snap = history.snapshot(it).unwrap();
            for (ir, &ix) in setup.receivers.iter().enumerate() {
                let cell = setup.velocity.index(ix, sy, sz);
                assert_eq!(traces.get(it, ir), Some(snap[cell]));
            }
        }
    }

    #[test]
    fn progress_reports_both_passes() {
        let model = layered_model(10, 10);
        let seen = Mutex::new(Vec::new());
        let cb = |info: ProgressInfo| {
            seen.lock().unwrap().push((info.stage, info.step, info.total_steps));
        };
        RtmEngine::new(model, small_cfg())
            .unwrap()
            .with_threads(2)
            .run(Some(&cb))
            .unwrap();
        let seen = seen.into_inner().unwrap();
        assert!(seen.contains(&(Stage::Forward, 24, 24)));
        assert!(seen.contains(&(Stage::Backward, 24, 24)));
        let first_backward = seen.iter().position(|s| s.0 == Stage::Backward).unwrap();
        assert!(seen[..first_backward].iter().all(|s| s.0 == Stage::Forward));
    }

    #[test]
    fn builder_callback_is_used() {
        let model = layered_model(10, 10);
        let calls = std::sync::Arc::new(AtomicUsize::new(0));
        let counter = std::sync::Arc::clone(&calls);
        RtmEngine::new(model, small_cfg())
            .unwrap()
            .with_progress_interval(Duration::ZERO)
            .with_progress(Box::new(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            }))
            .run(None)
            .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 48);
    }

    #[test]
    fn unstable_step_is_not_rejected() {
        let model = layered_model(10, 10);
        let cfg = RtmConfig {
            dt: 0.05,
            ..small_cfg()
        };
        let out = run_single_shot_rtm(&model, &cfg).unwrap();
        assert_eq!(out.inline_xz.len(), 100);
    }

    #[test]
    fn history_size_estimate() {
        let engine = RtmEngine::new(layered_model(10, 8), small_cfg()).unwrap();
        assert_eq!(engine.history_bytes(), 24 * 10 * 6 * 8 * 4);
        assert_eq!(engine.model().nx, 10);
        assert_eq!(engine.model().max_velocity(), 2600.0);
        assert_eq!(*engine.config(), small_cfg());
    }

    /// At backward step 0 the field is still at rest, so the image picks up
    /// exactly the last trace row times the last source snapshot.
    #[test]
    fn first_backward_step_uses_last_time_step() {
        let model = layered_model(10, 10);
        let cfg = small_cfg();
        let nt = cfg.nt;
        let engine = RtmEngine::new(model, cfg).unwrap();
        let setup = engine.embed().unwrap();
        let vel = &setup.velocity;
        let [_, sy, sz] = setup.source;

        // Only the final snapshot is non-zero.
        let mut history = WavefieldHistory::with_capacity(nt, vel.len());
        let zeros = vec![0.0_f32; vel.len()];
        for _ in 0..nt - 1 {
            history.push(&zeros).unwrap();
        }
        history.push(&vec![1.0_f32; vel.len()]).unwrap();

        // Only the final trace row is non-zero.
        let mut traces = TraceTable::zeros(nt, setup.receivers.len());
        let mut field = vec![0.0_f32; vel.len()];
        for (ir, &ix) in setup.receivers.iter().enumerate() {
            field[vel.index(ix, sy, sz)] = 0.5 + ir as f32;
        }
        record(vel, sy, sz, &setup.receivers, &field, &mut traces, nt - 1).unwrap();

        let mut reporter = ProgressReporter::new(None, Duration::from_secs(1), nt);
        let image = engine
            .backward(&setup, &history, &traces, &mut reporter)
            .unwrap();
        assert_eq!(image, field);
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::Forward.to_string(), "forward");
        assert_eq!(Stage::Done.to_string(), "done");
    }
}
