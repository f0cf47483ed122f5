//! Track and step state handed to the transport core by the event loop.

use crate::geometry::VolumeId;
use crate::math::{Point3, Vector3};

/// PDG encoding used for optical photons.
pub const OPTICAL_PHOTON_PDG: i32 = -22;

/// Particle species as far as the core cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Particle {
    OpticalPhoton,
    /// Any other particle, by PDG code.
    Other(i32),
}

impl Particle {
    /// PDG encoding.
    #[must_use]
    pub fn pdg(self) -> i32 {
        match self {
            Self::OpticalPhoton => OPTICAL_PHOTON_PDG,
            Self::Other(code) => code,
        }
    }
}

/// What limited a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The step ended on a geometric boundary.
    GeomBoundary,
    /// The step left the world volume.
    WorldBoundary,
    /// A discrete process limited the step.
    PostStepProcess,
    /// A continuous process limited the step.
    AlongStepProcess,
    Undefined,
}

/// Kinematic state at one end of a step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPoint {
    pub position: Point3,
    pub momentum_direction: Vector3,
    pub polarization: Vector3,
    pub kinetic_energy: f64,
    pub global_time: f64,
    /// Volume the point lies in; `None` outside the world.
    pub volume: Option<VolumeId>,
    pub status: StepStatus,
}

/// A single transport step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub pre: StepPoint,
    pub post: StepPoint,
    pub length: f64,
    pub energy_deposit: f64,
}

impl Step {
    /// Returns `true` if the step ended on a geometric boundary.
    #[must_use]
    pub fn at_boundary(&self) -> bool {
        self.post.status == StepStatus::GeomBoundary
    }
}

/// Whether the event loop keeps transporting a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    Alive,
    StopAndKill,
}

/// A track as mutated by the core.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub track_id: i32,
    pub parent_id: i32,
    pub particle: Particle,
    /// 1-based number of the step currently being processed.
    pub step_number: u32,
    pub momentum_direction: Vector3,
    pub polarization: Vector3,
    pub kinetic_energy: f64,
    /// Speed in mm/ns.
    pub velocity: f64,
    pub status: TrackStatus,
    /// Energy deposited locally by the core (absorption).
    pub local_energy_deposit: f64,
}

impl Track {
    /// Creates a live optical photon track.
    #[must_use]
    pub fn photon(
        track_id: i32,
        momentum_direction: Vector3,
        polarization: Vector3,
        kinetic_energy: f64,
    ) -> Self {
        Self {
            track_id,
            parent_id: 0,
            particle: Particle::OpticalPhoton,
            step_number: 1,
            momentum_direction,
            polarization,
            kinetic_energy,
            velocity: crate::math::units::C_LIGHT,
            status: TrackStatus::Alive,
            local_energy_deposit: 0.0,
        }
    }

    /// Returns `true` if the track is an optical photon.
    #[must_use]
    pub fn is_optical_photon(&self) -> bool {
        self.particle == Particle::OpticalPhoton
    }

    /// Returns `true` while the track is still transported.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status == TrackStatus::Alive
    }

    /// Stops the track, depositing `deposit` locally.
    pub fn kill(&mut self, deposit: f64) {
        self.status = TrackStatus::StopAndKill;
        self.local_energy_deposit += deposit;
    }
}
