//! Mutation and selection operators.
//!
//! # Mutation
//!
//! A mutation pass picks, for every agent except index 0, one weight and one
//! bias uniformly at random and adds a uniform offset from
//! `[-strength, strength]` to each. Several passes per generation widen the
//! distribution of step sizes without changing its shape.
//!
//! # Selection
//!
//! After evaluation the agents are ranked by descending score and the next
//! generation's slots are filled in three bands:
//!
//! ```text
//! slots:  [ elite ........ | runner-up ... | random ............ ]
//! size:     n·elite_frac     (n−elite)·ru    remainder
//! source:   top scorer       second scorer   uniform over 0..n
//! ```
//!
//! Setting `runner_up_fraction` to 0 gives the elite-only fill, and
//! `elite_fraction` of 1 copies the top scorer into every slot. The elite band
//! always holds at least one slot, so slot 0 carries the champion forward.

use std::{cmp::Ordering, iter};

use neuroswing_network::Genome;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::EvaluationResult;

/// Step sizes and repetitions of the single-gene mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MutationParams {
    /// Bound of the uniform offset added to one weight per pass.
    pub weight_strength: f64,
    /// Bound of the uniform offset added to one bias per pass.
    pub bias_strength: f64,
    /// Mutation passes per generation.
    pub passes: usize,
}

impl Default for MutationParams {
    fn default() -> Self {
        Self {
            weight_strength: 0.01,
            bias_strength: 0.005,
            passes: 3,
        }
    }
}

/// Proportions of the next generation's slot assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionParams {
    /// Leading fraction of slots receiving the top scorer's genome.
    pub elite_fraction: f64,
    /// Fraction of the remaining slots receiving the second scorer's genome.
    pub runner_up_fraction: f64,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            elite_fraction: 0.5,
            runner_up_fraction: 1.0 / 3.0,
        }
    }
}

/// Adds a uniform offset in `[-strength, strength]` to one random element.
///
/// Returns the index of the changed element, or `None` for an empty slice.
pub fn perturb_one<R>(values: &mut [f64], strength: f64, rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
{
    if values.is_empty() {
        return None;
    }
    let index = rng.random_range(0..values.len());
    let strength = strength.abs();
    values[index] += rng.random_range(-strength..=strength);
    Some(index)
}

/// Runs one mutation pass over every genome except the first.
pub fn mutate_once<R>(genomes: &mut [Genome], params: &MutationParams, rng: &mut R)
where
    R: Rng + ?Sized,
{
    for genome in genomes.iter_mut().skip(1) {
        perturb_one(&mut genome.weights, params.weight_strength, rng);
        perturb_one(&mut genome.biases, params.bias_strength, rng);
    }
}

/// Runs `params.passes` mutation passes.
pub fn mutate<R>(genomes: &mut [Genome], params: &MutationParams, rng: &mut R)
where
    R: Rng + ?Sized,
{
    for _ in 0..params.passes {
        mutate_once(genomes, params, rng);
    }
}

/// Sorts results by descending score.
///
/// Ties keep ascending agent index order; NaN scores rank last.
#[must_use]
pub fn rank(mut results: Vec<EvaluationResult>) -> Vec<EvaluationResult> {
    results.sort_by_key(|r| r.agent_index);
    results.sort_by(|a, b| compare_scores(b.score, a.score));
    results
}

fn compare_scores(a: f64, b: f64) -> Ordering {
    let key = |s: f64| if s.is_nan() { f64::NEG_INFINITY } else { s };
    key(a).total_cmp(&key(b))
}

/// Chooses the source agent of every slot in the next generation.
///
/// `ranked` must be sorted by [`rank`]. Returns one agent index per slot.
///
/// # Panics
///
/// Panics if `ranked` is empty.
#[must_use]
pub fn assign<R>(ranked: &[EvaluationResult], params: &SelectionParams, rng: &mut R) -> Vec<usize>
where
    R: Rng + ?Sized,
{
    let n = ranked.len();
    assert!(n > 0, "cannot select from an empty generation");

    let top = ranked[0].agent_index;
    let second = ranked.get(1).map_or(top, |r| r.agent_index);
    let elite = fraction_of(n, params.elite_fraction).clamp(1, n);
    let runner_up = fraction_of(n - elite, params.runner_up_fraction);

    let mut assignment = Vec::with_capacity(n);
    assignment.extend(iter::repeat_n(top, elite));
    assignment.extend(iter::repeat_n(second, runner_up));
    while assignment.len() < n {
        assignment.push(rng.random_range(0..n));
    }
    assignment
}

#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn fraction_of(n: usize, fraction: f64) -> usize {
    // tolerance keeps e.g. 6 * (1/3) at 2
    let count = (n as f64 * fraction.clamp(0.0, 1.0) + 1e-9).floor() as usize;
    count.min(n)
}
