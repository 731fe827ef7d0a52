//! Genetic operators over lookup policies.
//!
//! Every stage is a pure function of its inputs and the RNG it is handed,
//! so a generation is reproducible from `(population, fitness, seed)`.
//! Fitness may be negative infinity (a candidate that ran out of time);
//! ordering uses `f64::total_cmp` so such candidates sort last.

use crate::config::GaParams;
use lander_core::Policy;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub policy: Policy,
    #[serde(with = "crate::util::extended_f64")]
    pub fitness: f64,
}

pub fn random_policy<R: Rng + ?Sized>(rng: &mut R, lb: f64, ub: f64) -> Policy {
    Policy::from_fn(|_| rng.gen_range(lb..=ub))
}

/// Best of `k` uniformly drawn individuals; ties keep the earliest draw.
pub fn tournament_select<'a, R: Rng + ?Sized>(
    population: &'a [Individual],
    k: usize,
    rng: &mut R,
) -> Option<&'a Individual> {
    if population.is_empty() {
        return None;
    }
    let mut best = &population[rng.gen_range(0..population.len())];
    for _ in 1..k.max(1) {
        let candidate = &population[rng.gen_range(0..population.len())];
        if candidate.fitness > best.fitness {
            best = candidate;
        }
    }
    Some(best)
}

/// BLX-alpha: each child gene is drawn from the parents' interval widened by
/// `alpha` times its width on both sides, then clamped to `[lb, ub]`.
pub fn blend_crossover<R: Rng + ?Sized>(
    a: &Policy,
    b: &Policy,
    alpha: f64,
    lb: f64,
    ub: f64,
    rng: &mut R,
) -> (Policy, Policy) {
    let mut first = a.clone();
    let mut second = b.clone();
    let pairs = a.genes().iter().zip(b.genes().iter());
    for ((x, y), (c1, c2)) in pairs.zip(
        first
            .genes_mut()
            .iter_mut()
            .zip(second.genes_mut().iter_mut()),
    ) {
        let lo = x.min(*y);
        let hi = x.max(*y);
        let pad = alpha * (hi - lo);
        let (min, max) = (lo - pad, hi + pad);
        *c1 = rng.gen_range(min..=max).clamp(lb, ub);
        *c2 = rng.gen_range(min..=max).clamp(lb, ub);
    }
    (first, second)
}

/// Adds `N(0, sigma)` noise to each gene with probability `rate`. Returns the
/// number of genes touched. A negative or NaN `sigma` leaves the policy as is.
pub fn gaussian_mutation<R: Rng + ?Sized>(
    policy: &mut Policy,
    rate: f64,
    sigma: f64,
    lb: f64,
    ub: f64,
    rng: &mut R,
) -> usize {
    let Ok(noise) = Normal::new(0.0, sigma) else {
        return 0;
    };
    let mut mutated = 0;
    for gene in policy.genes_mut().iter_mut() {
        if rng.gen::<f64>() < rate {
            *gene = (*gene + noise.sample(rng)).clamp(lb, ub);
            mutated += 1;
        }
    }
    mutated
}

/// (mu + lambda) survivor selection: the `size` fittest of parents and
/// offspring, best first. Stable, so on ties parents outrank offspring.
pub fn select_survivors(
    parents: Vec<Individual>,
    offspring: Vec<Individual>,
    size: usize,
) -> Vec<Individual> {
    let mut pool = parents;
    pool.extend(offspring);
    rank(&mut pool);
    pool.truncate(size);
    pool
}

pub fn rank(population: &mut [Individual]) {
    population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
}

/// One offspring batch the size of the configured population: tournament
/// parents, BLX-alpha crossover with probability `crossover_rate` (clones
/// otherwise), then Gaussian mutation.
pub fn breed<R: Rng + ?Sized>(
    population: &[Individual],
    params: &GaParams,
    rng: &mut R,
) -> Vec<Policy> {
    let size = params.population_size;
    let mut offspring = Vec::with_capacity(size);

    while offspring.len() < size {
        let (Some(mother), Some(father)) = (
            tournament_select(population, params.tournament_size, rng),
            tournament_select(population, params.tournament_size, rng),
        ) else {
            break;
        };

        let (mut first, mut second) = if rng.gen::<f64>() < params.crossover_rate {
            blend_crossover(
                &mother.policy,
                &father.policy,
                params.blend_alpha,
                params.gene_lb,
                params.gene_ub,
                rng,
            )
        } else {
            (mother.policy.clone(), father.policy.clone())
        };

        for child in [&mut first, &mut second] {
            gaussian_mutation(
                child,
                params.mutation_rate,
                params.mutation_sigma,
                params.gene_lb,
                params.gene_ub,
                rng,
            );
        }

        offspring.push(first);
        if offspring.len() < size {
            offspring.push(second);
        }
    }

    offspring
}
