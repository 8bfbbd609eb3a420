//! Linde-Buzo-Gray codebook training.
//!
//! Training runs in two phases over the block vectors of one image:
//!
//! 1. **Splitting.** Start from the mean of all blocks. While there are
//!    fewer centroids than requested, replace every centroid `c` with
//!    `c + δ` and `c - δ`, assign each block to its nearest centroid among
//!    all of them, and move each centroid to the mean of its blocks. A
//!    centroid that attracts nothing keeps its perturbed value.
//! 2. **Relaxation.** Lloyd passes: assign, repair empty clusters by
//!    injecting a randomly chosen block, recompute means. Each pass builds a
//!    fresh centroid snapshot from the previous one.
//!
//! Because every split round doubles the count, the trained codebook holds
//! the next power of two `>= N` entries; `ceil(log2(N))`-bit indices address
//! all of them.
//!
//! ## Degenerate inputs
//!
//! A repair always counts as a change, so two centroids sitting on the same
//! point would keep the loop alive forever: the second one never wins a tie
//! and is repaired on every pass. With more entries than distinct blocks the
//! repaired slots keep jumping between block values while nothing else moves.
//! Training therefore also stops once [`LbgParams::stall_limit`] consecutive
//! passes repeat the previous block assignment and leave every centroid that
//! attracted blocks where it was, and never runs more than
//! [`LbgParams::max_iterations`] passes.

use crate::distance;
use crate::error::{Result, VqError};
use crate::partition::Block;
use crate::quantization::codebook::{index_bits_for, Codebook};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Largest codebook size accepted by [`LbgTrainer`].
pub const MAX_CODEBOOK_SIZE: usize = 1 << 16;

/// Tuning knobs for LBG training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LbgParams {
    /// Component-wise offset δ applied when splitting a centroid.
    pub perturbation: f64,
    /// Upper bound on relaxation passes.
    pub max_iterations: usize,
    /// Consecutive settled passes (same assignment, same occupied
    /// centroids) after which relaxation stops.
    pub stall_limit: usize,
    /// Seed for empty-cluster repair. `None` draws one from OS entropy.
    pub seed: Option<u64>,
}

impl Default for LbgParams {
    fn default() -> Self {
        Self {
            perturbation: 5.0,
            max_iterations: 100,
            stall_limit: 4,
            seed: None,
        }
    }
}

impl LbgParams {
    pub fn validate(&self) -> Result<()> {
        if !self.perturbation.is_finite() || self.perturbation <= 0.0 {
            return Err(VqError::InvalidParameter(format!(
                "perturbation must be finite and positive, got {}",
                self.perturbation
            )));
        }
        if self.max_iterations == 0 {
            return Err(VqError::InvalidParameter(
                "max_iterations must be greater than 0".to_string(),
            ));
        }
        if self.stall_limit == 0 {
            return Err(VqError::InvalidParameter(
                "stall_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Why relaxation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// A pass changed no centroid and repaired no cluster.
    Converged,
    /// Only repaired clusters moved for `stall_limit` passes.
    Stalled,
    /// `max_iterations` passes ran without settling.
    IterationLimit,
    /// There were no blocks to train on.
    EmptyInput,
}

/// Codebook plus bookkeeping from one training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub codebook: Codebook,
    pub split_rounds: usize,
    pub relaxation_passes: usize,
    /// Total empty-cluster repairs across all passes.
    pub repairs: usize,
    pub stop: StopReason,
    /// Mean squared distance from each block to its nearest final centroid.
    pub distortion: f64,
}

/// LBG trainer for a target codebook size.
#[derive(Debug, Clone)]
pub struct LbgTrainer {
    codebook_size: usize,
    params: LbgParams,
}

impl LbgTrainer {
    /// Trainer for `codebook_size` entries with default parameters.
    pub fn new(codebook_size: usize) -> Result<Self> {
        Self::with_params(codebook_size, LbgParams::default())
    }

    pub fn with_params(codebook_size: usize, params: LbgParams) -> Result<Self> {
        if codebook_size == 0 {
            return Err(VqError::InvalidParameter(
                "codebook size must be greater than 0".to_string(),
            ));
        }
        if codebook_size > MAX_CODEBOOK_SIZE {
            return Err(VqError::InvalidParameter(format!(
                "codebook size {codebook_size} exceeds {MAX_CODEBOOK_SIZE}"
            )));
        }
        params.validate()?;
        Ok(Self {
            codebook_size,
            params,
        })
    }

    /// Configure a deterministic seed for empty-cluster repair.
    ///
    /// When set, repeated `fit(...)` calls on the same blocks produce
    /// identical codebooks.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.seed = Some(seed);
        self
    }

    pub fn codebook_size(&self) -> usize {
        self.codebook_size
    }

    pub fn params(&self) -> &LbgParams {
        &self.params
    }

    /// Train a codebook on `blocks`.
    pub fn fit(&self, blocks: &[Block]) -> Result<Codebook> {
        // Use an explicit seed when configured; otherwise derive one from entropy.
        let seed = self.params.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);
        self.fit_with_rng(blocks, &mut rng)
    }

    /// Train a codebook drawing repair choices from `rng`.
    pub fn fit_with_rng<R: Rng + ?Sized>(
        &self,
        blocks: &[Block],
        rng: &mut R,
    ) -> Result<Codebook> {
        self.train(blocks, rng).map(|report| report.codebook)
    }

    /// Train and return the codebook together with run statistics.
    pub fn train<R: Rng + ?Sized>(
        &self,
        blocks: &[Block],
        rng: &mut R,
    ) -> Result<TrainingReport> {
        let index_bits = index_bits_for(self.codebook_size);

        let Some(first) = blocks.first() else {
            tracing::debug!("no training blocks; returning empty codebook");
            return Ok(TrainingReport {
                codebook: Codebook::empty(index_bits),
                split_rounds: 0,
                relaxation_passes: 0,
                repairs: 0,
                stop: StopReason::EmptyInput,
                distortion: 0.0,
            });
        };
        let dimension = first.len();
        if let Some(bad) = blocks.iter().find(|b| b.len() != dimension) {
            return Err(VqError::DimensionMismatch {
                expected: format!("block of {dimension} samples"),
                actual: format!("block of {} samples", bad.len()),
            });
        }

        // Split phase
        let mut centroids = vec![distance::mean(blocks)];
        let mut split_rounds = 0;
        while centroids.len() < self.codebook_size {
            let children = split(&centroids, self.params.perturbation);
            let assignments = assign(blocks, &children);
            centroids = update_centroids(blocks, &assignments, children);
            split_rounds += 1;
            tracing::debug!(
                round = split_rounds,
                centroids = centroids.len(),
                "split round complete"
            );
        }

        // Relaxation
        let mut passes = 0;
        let mut repairs = 0;
        let mut stalled = 0;
        let mut last_settled: Option<Settled> = None;
        let stop = loop {
            if passes == self.params.max_iterations {
                tracing::warn!(
                    passes,
                    "LBG relaxation hit the iteration limit before converging"
                );
                break StopReason::IterationLimit;
            }
            passes += 1;

            let next = relax(blocks, &centroids, rng);
            repairs += next.repairs;

            if !next.changed {
                break StopReason::Converged;
            }
            if last_settled.as_ref() == Some(&next.settled) {
                stalled += 1;
            } else {
                stalled = 0;
            }
            last_settled = Some(next.settled);
            centroids = next.centroids;
            if stalled >= self.params.stall_limit {
                break StopReason::Stalled;
            }
        };

        let distortion = blocks
            .iter()
            .filter_map(|b| distance::nearest(b, &centroids))
            .map(|(_, d)| d)
            .sum::<f64>()
            / blocks.len() as f64;

        tracing::debug!(
            entries = centroids.len(),
            requested = self.codebook_size,
            passes,
            repairs,
            ?stop,
            distortion,
            "LBG training finished"
        );

        Ok(TrainingReport {
            codebook: Codebook::new(index_bits, centroids)?,
            split_rounds,
            relaxation_passes: passes,
            repairs,
            stop,
            distortion,
        })
    }
}

/// Replace every centroid by its `+δ` and `-δ` children, in that order.
fn split(centroids: &[Vec<f64>], delta: f64) -> Vec<Vec<f64>> {
    let mut children = Vec::with_capacity(centroids.len() * 2);
    for c in centroids {
        children.push(c.iter().map(|v| v + delta).collect());
        children.push(c.iter().map(|v| v - delta).collect());
    }
    children
}

/// Nearest-centroid position for every block (lowest position wins ties).
fn assign(blocks: &[Block], centroids: &[Vec<f64>]) -> Vec<usize> {
    blocks
        .iter()
        .map(|b| distance::nearest(b, centroids).map_or(0, |(i, _)| i))
        .collect()
}

/// Per-cluster component sums and member counts.
fn accumulate(blocks: &[Block], assignments: &[usize], k: usize) -> (Vec<Vec<f64>>, Vec<usize>) {
    let dimension = blocks.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0f64; dimension]; k];
    let mut counts = vec![0usize; k];
    for (block, &cluster) in blocks.iter().zip(assignments) {
        add_block(&mut sums[cluster], block);
        counts[cluster] += 1;
    }
    (sums, counts)
}

#[inline]
fn add_block(sum: &mut [f64], block: &[u8]) {
    for (acc, &s) in sum.iter_mut().zip(block) {
        *acc += f64::from(s);
    }
}

/// Move each centroid to its cluster mean; empty clusters keep `previous`.
fn update_centroids(
    blocks: &[Block],
    assignments: &[usize],
    previous: Vec<Vec<f64>>,
) -> Vec<Vec<f64>> {
    let (sums, counts) = accumulate(blocks, assignments, previous.len());
    previous
        .into_iter()
        .zip(sums.into_iter().zip(counts))
        .map(|(prev, (sum, count))| {
            if count == 0 {
                prev
            } else {
                let n = count as f64;
                sum.into_iter().map(|s| s / n).collect()
            }
        })
        .collect()
}

/// Part of a pass that random repairs cannot touch.
#[derive(Debug, PartialEq)]
struct Settled {
    assignments: Vec<usize>,
    /// Updated centroids of clusters that attracted at least one block.
    occupied: Vec<Vec<f64>>,
}

/// Outcome of one relaxation pass.
struct Pass {
    centroids: Vec<Vec<f64>>,
    changed: bool,
    repairs: usize,
    settled: Settled,
}

/// One Lloyd pass with empty-cluster repair, computed from `previous`.
fn relax<R: Rng + ?Sized>(blocks: &[Block], previous: &[Vec<f64>], rng: &mut R) -> Pass {
    let assignments = assign(blocks, previous);
    let (mut sums, mut counts) = accumulate(blocks, &assignments, previous.len());
    let occupied: Vec<bool> = counts.iter().map(|&c| c > 0).collect();

    let mut repairs = 0;
    for (sum, count) in sums.iter_mut().zip(counts.iter_mut()) {
        if *count == 0 {
            let pick = rng.random_range(0..blocks.len());
            add_block(sum, &blocks[pick]);
            *count = 1;
            repairs += 1;
        }
    }

    let mut changed = repairs > 0;
    let centroids: Vec<Vec<f64>> = sums
        .into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), prev)| {
            let n = count as f64;
            let next: Vec<f64> = sum.into_iter().map(|s| s / n).collect();
            if next != *prev {
                changed = true;
            }
            next
        })
        .collect();

    let settled = Settled {
        occupied: centroids
            .iter()
            .zip(&occupied)
            .filter(|(_, won)| **won)
            .map(|(c, _)| c.clone())
            .collect(),
        assignments,
    };

    Pass {
        centroids,
        changed,
        repairs,
        settled,
    }
}
