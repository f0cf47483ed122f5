//! Per-step dispatch: volume classification, boundary handling, hit
//! counting and step recording.

mod record;
mod volume_id;

pub use record::{
    EventRows, MemorySink, RecordMode, StepContext, StepRecord, StepRecorder, StepSink,
};
pub use volume_id::{VolumeIdMap, VolumeIdRules, OUTSIDE_NAME, UNRECORDED};

use tracing::{debug, trace, warn};

use crate::boundary::{BoundaryOutcome, BoundaryProcess, BoundaryStatus};
use crate::config::OptrackConfig;
use crate::error::Result;
use crate::fiber::FiberConfig;
use crate::geometry::GeometryQuery;
use crate::random::RandomSource;
use crate::run::HitAccumulator;
use crate::track::{Step, Track};

/// Handles every step of every track on one worker.
///
/// Holds the worker's volume-ID cache, so one instance must not be shared
/// between threads.
#[derive(Debug)]
pub struct SteppingAction<S = MemorySink> {
    rules: VolumeIdRules,
    ids: VolumeIdMap,
    boundary: BoundaryProcess,
    fibers: FiberConfig,
    recorder: StepRecorder,
    sink: S,
    event: i32,
}

impl<S: StepSink> SteppingAction<S> {
    /// Creates an action writing rows to `sink`.
    #[must_use]
    pub fn new(config: &OptrackConfig, sink: S) -> Self {
        Self {
            rules: config.volume_ids.clone(),
            ids: VolumeIdMap::new(),
            boundary: BoundaryProcess::new(config.boundary.clone()),
            fibers: config.fibers.clone(),
            recorder: StepRecorder::new(config.record_mode, config.record_all_steps),
            sink,
            event: 0,
        }
    }

    #[must_use]
    pub fn volume_ids(&self) -> &VolumeIdMap {
        &self.ids
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Starts a run; volume IDs are assigned afresh.
    pub fn begin_run(&mut self) {
        self.ids.clear();
    }

    /// Sets the event number written into subsequent rows.
    pub fn begin_event(&mut self, event: i32) {
        self.event = event;
    }

    /// Flushes rows still buffered for the last event.
    pub fn end_run(&mut self) {
        self.recorder.finish(&mut self.sink);
    }

    /// Flushes and returns the sink.
    pub fn into_sink(mut self) -> S {
        self.end_run();
        self.sink
    }

    /// Processes one step of `track`.
    ///
    /// Optical photons that end the step inside the world go through the
    /// boundary process, whose outcome is applied to the track. Detections
    /// and fiber captures are counted in `hits` under the post-step
    /// volume's ID. Returns the boundary status, if the process ran.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry has no valid normal at a boundary
    /// or a hit lands in a volume without a counter.
    pub fn process_step<G, R>(
        &mut self,
        track: &mut Track,
        step: &Step,
        geometry: &G,
        rng: &mut R,
        hits: &mut HitAccumulator,
    ) -> Result<Option<BoundaryStatus>>
    where
        G: GeometryQuery + ?Sized,
        R: RandomSource + ?Sized,
    {
        let post = step.post.volume;
        let name = post
            .and_then(|v| geometry.volume_name(v))
            .unwrap_or(OUTSIDE_NAME);
        let id = self
            .ids
            .classify(post, name, &self.rules, self.recorder.record_all_steps());

        let mut deposit = step.energy_deposit;
        let mut status = None;
        if post.is_none() {
            trace!(track = track.track_id, "left the world");
        } else if track.is_optical_photon() && track.is_alive() {
            let outcome = self.boundary.post_step(step, geometry, rng)?;
            outcome.apply(track);
            match &outcome {
                BoundaryOutcome::Detection { deposit: d } => {
                    deposit += d;
                    debug!(volume = name, id, "photon detected");
                    hits.increment(id)?;
                }
                BoundaryOutcome::Absorption { deposit: d } => {
                    deposit += d;
                    trace!(volume = name, "photon absorbed");
                }
                BoundaryOutcome::NoRindex { deposit: d } => {
                    deposit += d;
                    warn!(volume = name, "missing refractive index for boundary");
                }
                BoundaryOutcome::SameMaterial => {
                    let from = step.pre.volume.and_then(|v| geometry.volume_name(v));
                    trace!(from = from.unwrap_or(OUTSIDE_NAME), to = name, "same material");
                    if from == Some(self.fibers.source_volume.as_str()) {
                        self.fiber_capture(name, id, track, step, rng, hits)?;
                    }
                }
                BoundaryOutcome::WavelengthShift { .. } => {
                    self.fiber_capture(name, id, track, step, rng, hits)?;
                }
                _ => {}
            }
            status = Some(outcome.status());
        }

        let context = StepContext {
            event: self.event,
            volume_id: id,
            energy_deposit: deposit,
        };
        self.recorder
            .record(context, track, step, geometry, &mut self.sink);
        Ok(status)
    }

    /// Rolls whether a shroud traps the photon; a trapped photon is
    /// counted and killed.
    fn fiber_capture<R: RandomSource + ?Sized>(
        &self,
        volume: &str,
        id: i32,
        track: &mut Track,
        step: &Step,
        rng: &mut R,
        hits: &mut HitAccumulator,
    ) -> Result<()> {
        let Some(p) = self
            .fibers
            .capture_probability(volume, &step.post.position, rng)
        else {
            return Ok(());
        };
        if rng.bernoulli(p) {
            debug!(volume, probability = p, "photon caught by fiber shroud");
            hits.increment(id)?;
            track.kill(0.0);
        }
        Ok(())
    }
}
