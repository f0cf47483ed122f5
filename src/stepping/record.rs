use serde::{Deserialize, Serialize};

use crate::geometry::GeometryQuery;
use crate::math::{Point3, Vector3};
use crate::track::{Step, StepPoint, Track};

use super::volume_id::UNRECORDED;

/// One observation row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub event: i32,
    pub pid: i32,
    pub track_id: i32,
    pub parent_id: i32,
    /// 0 for the pre-step row of a track.
    pub step_number: u32,
    pub kinetic_energy: f64,
    pub energy_deposit: f64,
    pub position: Point3,
    /// Position in the frame of the volume the point lies in.
    pub local_position: Point3,
    pub momentum_direction: Vector3,
    pub global_time: f64,
    pub volume_id: i32,
    pub replica: i32,
}

/// Rows of one event, flushed together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRows {
    pub event: i32,
    pub rows: Vec<StepRecord>,
}

/// When rows reach the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordMode {
    /// Each row as soon as it is produced.
    #[default]
    #[serde(alias = "stepwise")]
    StepWise,
    /// All rows of an event at once.
    #[serde(alias = "eventwise")]
    EventWise,
}

/// Destination of observation rows.
pub trait StepSink {
    fn write_row(&mut self, row: StepRecord);

    fn write_event(&mut self, rows: EventRows);
}

/// Sink that keeps everything in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySink {
    pub rows: Vec<StepRecord>,
    pub events: Vec<EventRows>,
}

impl StepSink for MemorySink {
    fn write_row(&mut self, row: StepRecord) {
        self.rows.push(row);
    }

    fn write_event(&mut self, rows: EventRows) {
        self.events.push(rows);
    }
}

/// Per-step facts decided by the stepping action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    pub event: i32,
    /// ID of the post-step volume.
    pub volume_id: i32,
    /// Total deposit of the step, including what the boundary left behind.
    pub energy_deposit: f64,
}

/// Turns steps into [`StepRecord`]s and hands them to a sink.
#[derive(Debug, Clone, Default)]
pub struct StepRecorder {
    mode: RecordMode,
    record_all_steps: bool,
    event: Option<i32>,
    rows_in_event: usize,
    pending: Vec<StepRecord>,
}

impl StepRecorder {
    #[must_use]
    pub fn new(mode: RecordMode, record_all_steps: bool) -> Self {
        Self {
            mode,
            record_all_steps,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn mode(&self) -> RecordMode {
        self.mode
    }

    #[must_use]
    pub fn record_all_steps(&self) -> bool {
        self.record_all_steps
    }

    /// Records `step` of `track`.
    ///
    /// A pre-step row opens each event's output, and each track's when
    /// every step is recorded. The post-step row is skipped for
    /// unrecorded volumes and, unless every step is recorded, for steps
    /// without deposit.
    pub fn record<G, S>(
        &mut self,
        context: StepContext,
        track: &Track,
        step: &Step,
        geometry: &G,
        sink: &mut S,
    ) where
        G: GeometryQuery + ?Sized,
        S: StepSink + ?Sized,
    {
        if self.event != Some(context.event) {
            self.flush(sink);
            self.event = Some(context.event);
        }

        if self.rows_in_event == 0 || (self.record_all_steps && track.step_number == 1) {
            let volume_id = if context.volume_id == UNRECORDED {
                0
            } else {
                context.volume_id
            };
            let row = StepRecord {
                step_number: 0,
                kinetic_energy: step.pre.kinetic_energy,
                energy_deposit: 0.0,
                ..Self::row(context.event, volume_id, track, &step.pre, geometry)
            };
            self.push(row, sink);
        }

        if context.volume_id == UNRECORDED {
            return;
        }
        if !self.record_all_steps && context.energy_deposit == 0.0 {
            return;
        }
        let row = StepRecord {
            step_number: track.step_number,
            kinetic_energy: track.kinetic_energy,
            energy_deposit: context.energy_deposit,
            ..Self::row(context.event, context.volume_id, track, &step.post, geometry)
        };
        self.push(row, sink);
    }

    /// Ends the current event, flushing buffered rows.
    pub fn finish<S: StepSink + ?Sized>(&mut self, sink: &mut S) {
        self.flush(sink);
        self.event = None;
    }

    fn flush<S: StepSink + ?Sized>(&mut self, sink: &mut S) {
        if let (Some(event), false) = (self.event, self.pending.is_empty()) {
            sink.write_event(EventRows {
                event,
                rows: std::mem::take(&mut self.pending),
            });
        }
        self.rows_in_event = 0;
    }

    fn push<S: StepSink + ?Sized>(&mut self, row: StepRecord, sink: &mut S) {
        self.rows_in_event += 1;
        match self.mode {
            RecordMode::StepWise => sink.write_row(row),
            RecordMode::EventWise => self.pending.push(row),
        }
    }

    fn row<G: GeometryQuery + ?Sized>(
        event: i32,
        volume_id: i32,
        track: &Track,
        point: &StepPoint,
        geometry: &G,
    ) -> StepRecord {
        let (local_position, replica) = match point.volume {
            Some(v) => (
                geometry.local_point(v, &point.position),
                geometry.replica_number(v),
            ),
            None => (point.position, 0),
        };
        StepRecord {
            event,
            pid: track.particle.pdg(),
            track_id: track.track_id,
            parent_id: track.parent_id,
            step_number: track.step_number,
            kinetic_energy: track.kinetic_energy,
            energy_deposit: 0.0,
            position: point.position,
            local_position,
            momentum_direction: point.momentum_direction,
            global_time: point.global_time,
            volume_id,
            replica,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{GeometryStore, PhysicalVolume, Shape};
    use crate::optics::Material;
    use crate::track::StepStatus;

    fn fixture() -> (GeometryStore, Step) {
        let mut g = GeometryStore::new();
        let lar = g.add_material(Material::opaque("LAr"));
        let world = g
            .add_volume(PhysicalVolume::new(
                "larVolume",
                lar,
                Shape::cuboid(10.0, 10.0, 10.0).unwrap(),
            ))
            .unwrap();
        let point = |x, t| StepPoint {
            position: Point3::new(x, 0.0, 0.0),
            momentum_direction: Vector3::x(),
            polarization: Vector3::zeros(),
            kinetic_energy: 2.0,
            global_time: t,
            volume: Some(world),
            status: StepStatus::AlongStepProcess,
        };
        let step = Step {
            pre: point(0.0, 1.0),
            post: point(1.0, 2.0),
            length: 1.0,
            energy_deposit: 0.5,
        };
        (g, step)
    }

    fn context(event: i32) -> StepContext {
        StepContext {
            event,
            volume_id: 4,
            energy_deposit: 0.5,
        }
    }

    #[test]
    fn stepwise_opens_each_event_with_a_pre_step_row() {
        let (g, step) = fixture();
        let track = Track::photon(1, Vector3::x(), Vector3::y(), 1.5);
        let mut recorder = StepRecorder::new(RecordMode::StepWise, false);
        let mut sink = MemorySink::default();

        recorder.record(context(0), &track, &step, &g, &mut sink);
        recorder.record(context(0), &track, &step, &g, &mut sink);
        recorder.record(context(1), &track, &step, &g, &mut sink);
        recorder.finish(&mut sink);

        let steps: Vec<_> = sink.rows.iter().map(|r| (r.event, r.step_number)).collect();
        assert_eq!(steps, vec![(0, 0), (0, 1), (0, 1), (1, 0), (1, 1)]);
        assert!(sink.events.is_empty());

        let pre = &sink.rows[0];
        assert_eq!(pre.kinetic_energy, 2.0);
        assert_eq!(pre.global_time, 1.0);
        assert_eq!(pre.energy_deposit, 0.0);
        let post = &sink.rows[1];
        assert_eq!(post.kinetic_energy, 1.5);
        assert_eq!(post.global_time, 2.0);
        assert_eq!(post.position, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn eventwise_finish_flushes_once() {
        let (g, step) = fixture();
        let track = Track::photon(1, Vector3::x(), Vector3::y(), 1.5);
        let mut recorder = StepRecorder::new(RecordMode::EventWise, false);
        let mut sink = MemorySink::default();

        recorder.record(context(7), &track, &step, &g, &mut sink);
        recorder.finish(&mut sink);
        recorder.finish(&mut sink);
        assert_eq!(sink.events.len(), 1);
        assert_eq!(sink.events[0].event, 7);
        assert_eq!(sink.events[0].rows.len(), 2);
    }

    #[test]
    fn rows_serialize_with_flat_vectors() {
        let (g, step) = fixture();
        let track = Track::photon(1, Vector3::x(), Vector3::y(), 1.5);
        let mut recorder = StepRecorder::new(RecordMode::EventWise, false);
        let mut sink = MemorySink::default();
        recorder.record(context(3), &track, &step, &g, &mut sink);
        recorder.finish(&mut sink);

        let json = serde_json::to_value(&sink.events[0]).unwrap();
        assert_eq!(json["event"], 3);
        let post = &json["rows"][1];
        assert_eq!(post["volume_id"], 4);
        assert_eq!(post["step_number"], 1);
        assert_eq!(post["energy_deposit"], 0.5);
        assert_eq!(post["position"], serde_json::json!([1.0, 0.0, 0.0]));
        assert_eq!(post["momentum_direction"], serde_json::json!([1.0, 0.0, 0.0]));
    }

    #[test]
    fn mode_names_deserialize() {
        let modes: Vec<RecordMode> =
            serde_json::from_str(r#"["step_wise", "eventwise", "event_wise"]"#).unwrap();
        assert_eq!(
            modes,
            vec![RecordMode::StepWise, RecordMode::EventWise, RecordMode::EventWise]
        );
    }
}
