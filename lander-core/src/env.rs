use serde::{Deserialize, Serialize};

use crate::error::EnvError;
use crate::policy::Action;
use crate::state::Observation;

/// Why an episode ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Landed,
    Crashed,
    OutOfBounds,
    TimeLimit,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub steps: u32,
    pub outcome: Option<Outcome>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub observation: Observation,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

/// A stateful, single-threaded control task. `truncated` means the episode
/// ran out of steps; `terminated` means it reached a natural end.
pub trait Environment {
    fn reset(&mut self) -> Result<Observation, EnvError>;

    fn step(&mut self, action: Action) -> Result<Step, EnvError>;

    fn render(&mut self) -> Result<(), EnvError> {
        Ok(())
    }
}

impl<E: Environment + ?Sized> Environment for &mut E {
    fn reset(&mut self) -> Result<Observation, EnvError> {
        (**self).reset()
    }

    fn step(&mut self, action: Action) -> Result<Step, EnvError> {
        (**self).step(action)
    }

    fn render(&mut self) -> Result<(), EnvError> {
        (**self).render()
    }
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn reset(&mut self) -> Result<Observation, EnvError> {
        (**self).reset()
    }

    fn step(&mut self, action: Action) -> Result<Step, EnvError> {
        (**self).step(action)
    }

    fn render(&mut self) -> Result<(), EnvError> {
        (**self).render()
    }
}
