//! Seeding: the order in which a roster is paired into first-round matches.

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::sync::Mutex;

use crate::tournament::models::ParticipantId;

/// Permutation source for bracket generation
pub trait Seeder: Send + Sync {
    /// Reorder `participants` in place; consecutive pairs meet in round 1
    fn seed(&self, participants: &mut [ParticipantId]);
}

/// Uniformly random seeding
///
/// Production code seeds from OS entropy; tests pass a fixed seed to get a
/// reproducible permutation.
pub struct RandomSeeder {
    rng: Mutex<StdRng>,
}

impl RandomSeeder {
    /// Create a seeder backed by OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Create a deterministic seeder
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomSeeder {
    fn default() -> Self {
        Self::new()
    }
}

impl Seeder for RandomSeeder {
    fn seed(&self, participants: &mut [ParticipantId]) {
        // RNG state is valid even if a previous holder panicked
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        participants.shuffle(&mut *rng);
    }
}

/// Keeps registration order: first registrant meets the second, and so on
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationOrderSeeder;

impl Seeder for RegistrationOrderSeeder {
    fn seed(&self, _participants: &mut [ParticipantId]) {}
}
