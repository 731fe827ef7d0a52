//! Repeated-episode policy evaluation.

use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::constants::EVAL_EPISODES_DEFAULT;
use crate::env::{Environment, Outcome};
use crate::error::EnvError;
use crate::policy::{action_for, Action, Policy};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalConfig {
    pub episodes: u32,
    /// Render before every step.
    pub render: bool,
    /// Print per-episode progress on a single console line.
    pub verbose: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self::quiet(EVAL_EPISODES_DEFAULT)
    }
}

impl EvalConfig {
    pub fn quiet(episodes: u32) -> Self {
        Self {
            episodes,
            render: false,
            verbose: false,
        }
    }

    pub fn replay(episodes: u32) -> Self {
        Self {
            episodes,
            render: true,
            verbose: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode: u32,
    /// Cumulative reward, or negative infinity when the episode truncated.
    pub reward: f64,
    pub steps: u32,
    pub truncated: bool,
    pub outcome: Option<Outcome>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub total_reward: f64,
    pub episodes: Vec<EpisodeRecord>,
}

impl EvaluationReport {
    /// Average episode reward.
    pub fn fitness(&self) -> f64 {
        if self.episodes.is_empty() {
            return 0.0;
        }
        self.total_reward / self.episodes.len() as f64
    }

    pub fn truncated_count(&self) -> usize {
        self.episodes.iter().filter(|ep| ep.truncated).count()
    }

    pub fn total_steps(&self) -> u64 {
        self.episodes.iter().map(|ep| ep.steps as u64).sum()
    }
}

/// Total reward of `policy` over `config.episodes` episodes.
pub fn simulate<E: Environment + ?Sized>(
    env: &mut E,
    policy: &Policy,
    config: &EvalConfig,
) -> Result<f64, EnvError> {
    Ok(evaluate(env, policy, config)?.total_reward)
}

pub fn evaluate<E: Environment + ?Sized>(
    env: &mut E,
    policy: &Policy,
    config: &EvalConfig,
) -> Result<EvaluationReport, EnvError> {
    let mut total_reward = 0.0;
    let mut episodes = Vec::with_capacity(config.episodes as usize);

    for ep in 1..=config.episodes {
        let record = run_episode(env, policy, ep, config.render)?;
        total_reward += record.reward;

        tracing::debug!(
            episode = ep,
            reward = record.reward,
            steps = record.steps,
            truncated = record.truncated,
            "episode finished"
        );
        if config.verbose {
            print!("\r{}", progress_line(ep, record.reward));
            std::io::stdout().flush().ok();
        }
        episodes.push(record);
    }

    if config.verbose {
        print!("\r{:80}\r", "");
        std::io::stdout().flush().ok();
    }

    Ok(EvaluationReport {
        total_reward,
        episodes,
    })
}

/// Progress text shown on stdout, the same stream rendered frames go to.
fn progress_line(episode: u32, reward: f64) -> String {
    format!(">>> simulating ... [EP{episode:02}] reward: {reward:8.3}")
}

fn run_episode<E: Environment + ?Sized>(
    env: &mut E,
    policy: &Policy,
    episode: u32,
    render: bool,
) -> Result<EpisodeRecord, EnvError> {
    env.reset()?;
    let mut action = Action::IDLE;
    let mut reward = 0.0;
    let mut steps = 0u32;

    loop {
        if render {
            env.render()?;
        }

        let step = env.step(action)?;
        steps += 1;
        // Running out of time is scored as the worst possible outcome,
        // whatever was accumulated before.
        reward = if step.truncated {
            f64::NEG_INFINITY
        } else {
            reward + step.reward
        };

        if step.terminated || step.truncated {
            return Ok(EpisodeRecord {
                episode,
                reward,
                steps,
                truncated: step.truncated,
                outcome: step.info.outcome,
            });
        }
        action = action_for(&step.observation, policy);
    }
}
