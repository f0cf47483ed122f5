//! Per-run hit bookkeeping.
//!
//! Every worker counts detected photons into its own [`HitAccumulator`];
//! [`RunAction`] owns the run-level counters, resets them when a run
//! begins and folds the workers' counters in when it ends.

mod hits;

pub use hits::HitAccumulator;

use tracing::info;

use crate::error::RunError;

/// Run lifecycle around a [`HitAccumulator`].
#[derive(Debug, Clone)]
pub struct RunAction {
    hits: HitAccumulator,
    run_number: u32,
}

impl RunAction {
    /// Creates the action with one counter per volume ID in
    /// `0..volume_count`.
    #[must_use]
    pub fn new(volume_count: usize) -> Self {
        Self {
            hits: HitAccumulator::new(volume_count),
            run_number: 0,
        }
    }

    /// Number of runs begun so far.
    #[must_use]
    pub fn run_number(&self) -> u32 {
        self.run_number
    }

    #[must_use]
    pub fn hits(&self) -> &HitAccumulator {
        &self.hits
    }

    pub fn hits_mut(&mut self) -> &mut HitAccumulator {
        &mut self.hits
    }

    /// Starts a run: zeroes the counters and returns the new run number.
    pub fn begin_run(&mut self) -> u32 {
        self.hits.reset();
        self.run_number += 1;
        info!(run = self.run_number, volumes = self.hits.len(), "run started");
        self.run_number
    }

    /// Folds per-worker counters into the run counters.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::SizeMismatch`] if a worker was created for a
    /// different number of volumes; the run counters are then unchanged.
    pub fn merge_workers<'a, I>(&mut self, workers: I) -> Result<(), RunError>
    where
        I: IntoIterator<Item = &'a HitAccumulator>,
    {
        let workers: Vec<&HitAccumulator> = workers.into_iter().collect();
        let len = self.hits.len();
        if let Some(bad) = workers.iter().find(|w| w.len() != len) {
            return Err(RunError::SizeMismatch {
                left: len,
                right: bad.len(),
            });
        }
        for worker in workers {
            self.hits.merge(worker)?;
        }
        Ok(())
    }

    /// Ends the run, logging one line per volume, and returns the report.
    pub fn end_run(&self) -> Vec<(usize, u64)> {
        let report = self.hits.report();
        for (volume, count) in &report {
            info!(run = self.run_number, "Vol {volume} --> {count} counts.");
        }
        report
    }
}
