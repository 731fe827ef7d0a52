use anyhow::{anyhow, Context, Result};
use lander_core::constants::{EVAL_EPISODES_DEFAULT, THRUST_LB, THRUST_UB};
use lander_core::LanderParams;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SEARCH_SEED: u32 = 0x6A00_0001;
pub const DEFAULT_EVAL_SEED: u32 = 0x1A4D_0001;
pub const DEFAULT_GENERATIONS: u32 = 50;
pub const JOBS_ENV: &str = "LANDER_JOBS";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaParams {
    pub population_size: usize,
    pub crossover_rate: f64,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
    pub mutation_sigma: f64,
    /// BLX-alpha widening of the parents' interval.
    pub blend_alpha: f64,
    pub tournament_size: usize,
    pub gene_lb: f64,
    pub gene_ub: f64,
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            population_size: 50,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            mutation_sigma: 0.2,
            blend_alpha: 0.5,
            tournament_size: 2,
            gene_lb: THRUST_LB,
            gene_ub: THRUST_UB,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub ga: GaParams,
    pub generations: u32,
    pub episodes_per_eval: u32,
    /// Seeds the genetic operators.
    pub seed: u32,
    /// Seeds the environment every candidate is scored on.
    pub eval_seed: u32,
    pub lander: LanderParams,
    /// Stop once the best fitness reaches this value.
    #[serde(with = "crate::util::extended_f64::option")]
    pub target_fitness: Option<f64>,
    pub jobs: Option<usize>,
    pub out_dir: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ga: GaParams::default(),
            generations: DEFAULT_GENERATIONS,
            episodes_per_eval: EVAL_EPISODES_DEFAULT,
            seed: DEFAULT_SEARCH_SEED,
            eval_seed: DEFAULT_EVAL_SEED,
            lander: LanderParams::default(),
            target_fitness: None,
            jobs: read_env_optional_usize(JOBS_ENV),
            out_dir: None,
        }
    }
}

impl SearchConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("failed reading search config {}", path.display()))?;
        serde_json::from_slice(&data)
            .with_context(|| format!("invalid search config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let ga = &self.ga;
        if ga.population_size < 2 {
            return Err(anyhow!(
                "population_size must be >= 2 (got {})",
                ga.population_size
            ));
        }
        if ga.tournament_size == 0 {
            return Err(anyhow!("tournament_size must be >= 1"));
        }
        if !(0.0..=1.0).contains(&ga.crossover_rate) {
            return Err(anyhow!(
                "crossover_rate must be in [0, 1] (got {})",
                ga.crossover_rate
            ));
        }
        if !(0.0..=1.0).contains(&ga.mutation_rate) {
            return Err(anyhow!(
                "mutation_rate must be in [0, 1] (got {})",
                ga.mutation_rate
            ));
        }
        if !ga.mutation_sigma.is_finite() || ga.mutation_sigma < 0.0 {
            return Err(anyhow!("mutation_sigma must be finite and >= 0"));
        }
        if !ga.blend_alpha.is_finite() || ga.blend_alpha < 0.0 {
            return Err(anyhow!("blend_alpha must be finite and >= 0"));
        }
        if !(ga.gene_lb.is_finite() && ga.gene_ub.is_finite()) || ga.gene_lb >= ga.gene_ub {
            return Err(anyhow!(
                "gene bounds must be finite with gene_lb < gene_ub (got [{}, {}])",
                ga.gene_lb,
                ga.gene_ub
            ));
        }
        if self.episodes_per_eval == 0 {
            return Err(anyhow!("episodes_per_eval must be >= 1"));
        }
        if self.lander.max_episode_steps == 0 {
            return Err(anyhow!("lander.max_episode_steps must be >= 1"));
        }
        if let Some(jobs) = self.jobs {
            if jobs == 0 {
                return Err(anyhow!("jobs must be >= 1 when provided"));
            }
        }
        Ok(())
    }
}

pub fn read_env_optional_usize(name: &str) -> Option<usize> {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_parameters() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.ga.population_size, 50);
        assert_eq!(cfg.ga.crossover_rate, 0.9);
        assert_eq!(cfg.ga.mutation_rate, 0.1);
        assert_eq!(cfg.episodes_per_eval, 10);
        assert_eq!((cfg.ga.gene_lb, cfg.ga.gene_ub), (-1.0, 1.0));
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: SearchConfig =
            serde_json::from_str(r#"{"generations": 3, "ga": {"population_size": 8}}"#)
                .expect("parse");
        assert_eq!(cfg.generations, 3);
        assert_eq!(cfg.ga.population_size, 8);
        assert_eq!(cfg.ga.tournament_size, 2);
        assert_eq!(cfg.lander, LanderParams::default());
    }

    #[test]
    fn rejects_bad_parameters() {
        let mut cfg = SearchConfig::default();
        cfg.ga.population_size = 1;
        assert!(cfg.validate().is_err());

        let mut cfg = SearchConfig::default();
        cfg.ga.gene_lb = 1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = SearchConfig::default();
        cfg.ga.mutation_rate = 1.5;
        assert!(cfg.validate().is_err());

        let cfg = SearchConfig {
            episodes_per_eval: 0,
            ..SearchConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = SearchConfig {
            jobs: Some(0),
            ..SearchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
