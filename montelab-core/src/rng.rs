//! Deterministic RNG hierarchy.
//!
//! A master seed generates deterministic sub-seeds for each path index.
//! Sub-seeds are derived via BLAKE3 hashing, independently of evaluation
//! order, so simulation output is identical regardless of whether paths are
//! generated sequentially or fanned out across a rayon pool.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Deterministic RNG hierarchy for path simulation.
///
/// The master seed is expanded into per-path sub-seeds using BLAKE3. Because
/// derivation is hash-based (not order-dependent), the same master seed
/// produces identical paths regardless of the order or thread they are
/// generated on.
#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Draw a master seed from OS entropy.
    ///
    /// Used when the caller supplies no seed; the drawn value is recorded in
    /// the result so any run can be replayed.
    pub fn from_entropy() -> Self {
        use rand::RngCore;
        let master_seed = rand::rngs::OsRng.next_u64();
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for a specific path index.
    pub fn sub_seed(&self, path_index: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(&path_index.to_le_bytes());
        let hash = hasher.finalize();
        u64::from_le_bytes(hash.as_bytes()[..8].try_into().unwrap())
    }

    /// Create a seeded StdRng for a path.
    pub fn rng_for_path(&self, path_index: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(path_index))
    }
}
