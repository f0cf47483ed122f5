use std::fmt;

use tracing::error;

use crate::error::RunError;

/// Detected-photon counters, one per volume ID.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HitAccumulator {
    counts: Vec<u64>,
}

impl HitAccumulator {
    /// Creates `len` zeroed counters.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            counts: vec![0; len],
        }
    }

    /// Number of counters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    /// Counts one hit in volume `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::VolumeIdOutOfRange`] if `id` is negative or not
    /// below [`Self::len`]. The counters are left untouched.
    pub fn increment(&mut self, id: i32) -> Result<(), RunError> {
        let slot = usize::try_from(id)
            .ok()
            .and_then(|index| self.counts.get_mut(index));
        match slot {
            Some(count) => {
                *count += 1;
                Ok(())
            }
            None => {
                let len = self.counts.len();
                error!(id, len, "volume ID out of bounds");
                Err(RunError::VolumeIdOutOfRange { id, len })
            }
        }
    }

    /// Hits counted in volume `index`, 0 if there is no such counter.
    #[must_use]
    pub fn count(&self, index: usize) -> u64 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    /// `(index, count)` for every counter.
    #[must_use]
    pub fn report(&self) -> Vec<(usize, u64)> {
        self.counts.iter().copied().enumerate().collect()
    }

    /// Adds another accumulator's counts into this one.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::SizeMismatch`] if the sizes differ.
    pub fn merge(&mut self, other: &Self) -> Result<(), RunError> {
        if self.counts.len() != other.counts.len() {
            return Err(RunError::SizeMismatch {
                left: self.counts.len(),
                right: other.counts.len(),
            });
        }
        for (count, extra) in self.counts.iter_mut().zip(&other.counts) {
            *count += extra;
        }
        Ok(())
    }
}

impl fmt::Display for HitAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, count) in self.counts.iter().enumerate() {
            writeln!(f, "Vol {index} --> {count} counts.")?;
        }
        Ok(())
    }
}
