use crate::config::SearchConfig;
use crate::genetic::{breed, random_policy, rank, select_survivors, Individual};
use crate::store::save_policy;
use crate::util::{extended_f64, now_unix_s, seed_to_hex, write_json_pretty};
use anyhow::{anyhow, Context, Result};
use lander_core::{evaluate, EvalConfig, LunarLander, Policy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const BEST_POLICY_FILE: &str = "best-policy.json";
pub const SUMMARY_FILE: &str = "summary.json";
pub const GENERATIONS_FILE: &str = "generations.csv";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: u32,
    #[serde(with = "extended_f64")]
    pub best_fitness: f64,
    #[serde(with = "extended_f64")]
    pub median_fitness: f64,
    #[serde(with = "extended_f64")]
    pub worst_fitness: f64,
    /// Mean over candidates that never truncated.
    #[serde(with = "extended_f64")]
    pub finite_mean_fitness: f64,
    pub truncated_candidates: usize,
    #[serde(with = "extended_f64")]
    pub best_so_far: f64,
    pub evaluations: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchReport {
    pub generated_unix_s: u64,
    pub seed_hex: String,
    pub eval_seed_hex: String,
    pub config: SearchConfig,
    pub generations_run: u32,
    pub stopped_early: bool,
    pub evaluations: u64,
    pub history: Vec<GenerationStats>,
    pub best: Individual,
}

/// Average episode reward of `policy` on a fresh environment seeded with
/// `config.eval_seed`. Pure in the policy: the same policy always scores
/// the same.
pub fn policy_fitness(policy: &Policy, config: &SearchConfig) -> Result<f64> {
    let mut env = LunarLander::with_params(config.eval_seed, config.lander.clone());
    let report = evaluate(&mut env, policy, &EvalConfig::quiet(config.episodes_per_eval))
        .context("policy evaluation failed")?;
    Ok(report.fitness())
}

pub fn evaluate_population(
    pool: Option<&ThreadPool>,
    policies: Vec<Policy>,
    config: &SearchConfig,
) -> Result<Vec<Individual>> {
    let score = |policy: Policy| -> Result<Individual> {
        let fitness = policy_fitness(&policy, config)?;
        Ok(Individual { policy, fitness })
    };

    match pool {
        Some(pool) => pool.install(|| policies.into_par_iter().map(score).collect()),
        None => policies.into_par_iter().map(score).collect(),
    }
}

pub fn run_search(config: &SearchConfig) -> Result<SearchReport> {
    config.validate()?;
    if let Some(dir) = &config.out_dir {
        fs::create_dir_all(dir).with_context(|| format!("failed creating {}", dir.display()))?;
    }

    let pool = match config.jobs {
        Some(jobs) => Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .context("failed to build rayon threadpool")?,
        ),
        None => None,
    };

    let ga = &config.ga;
    let size = ga.population_size;
    let mut rng = StdRng::seed_from_u64(config.seed as u64);

    tracing::info!(
        population = size,
        generations = config.generations,
        episodes_per_eval = config.episodes_per_eval,
        seed = %seed_to_hex(config.seed),
        eval_seed = %seed_to_hex(config.eval_seed),
        "starting policy search"
    );

    let initial: Vec<Policy> = (0..size)
        .map(|_| random_policy(&mut rng, ga.gene_lb, ga.gene_ub))
        .collect();
    let mut population = evaluate_population(pool.as_ref(), initial, config)?;
    rank(&mut population);
    let mut evaluations = size as u64;

    let mut best = population
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("initial population is empty"))?;
    let mut history = vec![generation_stats(0, &population, best.fitness, evaluations)];
    log_generation(&history[0]);

    let mut generations_run = 0;
    let mut stopped_early = reached_target(config, best.fitness);

    if !stopped_early {
        for generation in 1..=config.generations {
            let children = breed(&population, ga, &mut rng);
            evaluations += children.len() as u64;
            let offspring = evaluate_population(pool.as_ref(), children, config)?;
            population = select_survivors(population, offspring, size);
            generations_run = generation;

            if let Some(leader) = population.first() {
                if leader.fitness > best.fitness {
                    tracing::info!(
                        generation,
                        previous = best.fitness,
                        fitness = leader.fitness,
                        "new best policy"
                    );
                    best = leader.clone();
                }
            }

            let stats = generation_stats(generation, &population, best.fitness, evaluations);
            log_generation(&stats);
            history.push(stats);

            if reached_target(config, best.fitness) {
                tracing::info!(generation, fitness = best.fitness, "target fitness reached");
                stopped_early = true;
                break;
            }
        }
    }

    let report = SearchReport {
        generated_unix_s: now_unix_s(),
        seed_hex: seed_to_hex(config.seed),
        eval_seed_hex: seed_to_hex(config.eval_seed),
        config: config.clone(),
        generations_run,
        stopped_early,
        evaluations,
        history,
        best,
    };

    if let Some(dir) = &config.out_dir {
        write_outputs(dir, &report)?;
    }

    Ok(report)
}

fn reached_target(config: &SearchConfig, best: f64) -> bool {
    config.target_fitness.is_some_and(|target| best >= target)
}

/// Expects `population` ranked best first.
fn generation_stats(
    generation: u32,
    population: &[Individual],
    best_so_far: f64,
    evaluations: u64,
) -> GenerationStats {
    let finite: Vec<f64> = population
        .iter()
        .map(|ind| ind.fitness)
        .filter(|fitness| fitness.is_finite())
        .collect();
    let finite_mean_fitness = if finite.is_empty() {
        f64::NEG_INFINITY
    } else {
        finite.iter().sum::<f64>() / finite.len() as f64
    };

    GenerationStats {
        generation,
        best_fitness: population.first().map_or(f64::NEG_INFINITY, |ind| ind.fitness),
        median_fitness: population
            .get(population.len() / 2)
            .map_or(f64::NEG_INFINITY, |ind| ind.fitness),
        worst_fitness: population.last().map_or(f64::NEG_INFINITY, |ind| ind.fitness),
        finite_mean_fitness,
        truncated_candidates: population.len() - finite.len(),
        best_so_far,
        evaluations,
    }
}

fn log_generation(stats: &GenerationStats) {
    tracing::info!(
        generation = stats.generation,
        best = stats.best_fitness,
        median = stats.median_fitness,
        worst = stats.worst_fitness,
        truncated = stats.truncated_candidates,
        "generation evaluated"
    );
}

fn write_outputs(dir: &Path, report: &SearchReport) -> Result<()> {
    save_policy(&dir.join(BEST_POLICY_FILE), &report.best.policy)?;
    write_generations_csv(&dir.join(GENERATIONS_FILE), &report.history)?;
    write_json_pretty(&dir.join(SUMMARY_FILE), report)
}

fn write_generations_csv(path: &Path, rows: &[GenerationStats]) -> Result<()> {
    let mut csv = String::from(
        "generation,best_fitness,median_fitness,worst_fitness,finite_mean_fitness,truncated_candidates,best_so_far,evaluations\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{:.4},{:.4},{:.4},{:.4},{},{:.4},{}\n",
            row.generation,
            row.best_fitness,
            row.median_fitness,
            row.worst_fitness,
            row.finite_mean_fitness,
            row.truncated_candidates,
            row.best_so_far,
            row.evaluations
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(values: &[f64]) -> Vec<Individual> {
        values
            .iter()
            .map(|&fitness| Individual {
                policy: Policy::zeros(),
                fitness,
            })
            .collect()
    }

    #[test]
    fn stats_separate_truncated_candidates() {
        let population = ranked(&[40.0, 20.0, 0.0, f64::NEG_INFINITY]);
        let stats = generation_stats(3, &population, 55.0, 200);
        assert_eq!(stats.best_fitness, 40.0);
        assert_eq!(stats.median_fitness, 0.0);
        assert_eq!(stats.worst_fitness, f64::NEG_INFINITY);
        assert_eq!(stats.finite_mean_fitness, 20.0);
        assert_eq!(stats.truncated_candidates, 1);
        assert_eq!(stats.best_so_far, 55.0);
    }

    #[test]
    fn all_truncated_population_has_no_finite_mean() {
        let population = ranked(&[f64::NEG_INFINITY, f64::NEG_INFINITY]);
        let stats = generation_stats(0, &population, f64::NEG_INFINITY, 2);
        assert_eq!(stats.finite_mean_fitness, f64::NEG_INFINITY);
        assert_eq!(stats.truncated_candidates, 2);
    }

    #[test]
    fn fitness_is_average_episode_reward() {
        let config = SearchConfig {
            episodes_per_eval: 3,
            jobs: None,
            ..SearchConfig::default()
        };
        let policy = Policy::zeros();
        let mut env = LunarLander::with_params(config.eval_seed, config.lander.clone());
        let report = evaluate(&mut env, &policy, &EvalConfig::quiet(3)).expect("evaluate");
        assert_eq!(
            policy_fitness(&policy, &config).expect("fitness"),
            report.total_reward / 3.0
        );
    }
}
