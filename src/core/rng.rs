/// Random branch resolver — a seeded, reproducible stream used only to
/// break ties on weighted branch nodes.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::schema::node::BranchTarget;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("no entropy source available for default seed: {0}")]
    NoEntropy(getrandom::Error),
}

/// Weighted branch selection over a seeded PRNG. The same seed yields
/// the same selection sequence on every run.
#[derive(Debug)]
pub struct BranchResolver {
    rng: StdRng,
}

impl BranchResolver {
    /// Build from a caller seed. Seed 0 requests a non-deterministic
    /// seed from the platform entropy source; on platforms without one
    /// this is a construction failure, not a fallback.
    pub fn from_seed(seed: u64) -> Result<BranchResolver, SeedError> {
        let seed = if seed == 0 { entropy_seed()? } else { seed };
        Ok(BranchResolver {
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Pick one target index, proportionally to weight. Zero-weight
    /// targets are never picked. Targets must have a positive total
    /// weight, which document validation guarantees.
    pub fn pick(&mut self, targets: &[BranchTarget]) -> usize {
        let weights: Vec<u32> = targets.iter().map(|t| t.weight).collect();
        match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(&mut self.rng),
            // Unreachable after load validation; degrade to the first
            // target rather than unwinding across a step call.
            Err(_) => 0,
        }
    }
}

fn entropy_seed() -> Result<u64, SeedError> {
    let mut bytes = [0u8; 8];
    getrandom::getrandom(&mut bytes).map_err(SeedError::NoEntropy)?;
    Ok(u64::from_le_bytes(bytes))
}
