//! Discretized lander control: observation encoding, lookup policies and
//! repeated-episode evaluation against a seeded environment.

pub mod constants;
pub mod env;
pub mod error;
pub mod evaluate;
pub mod policy;
pub mod rng;
pub mod sim;
pub mod state;

pub use env::{Environment, Outcome, Step, StepInfo};
pub use error::{EnvError, PolicyError};
pub use evaluate::{evaluate, simulate, EpisodeRecord, EvalConfig, EvaluationReport};
pub use policy::{action_for, Action, Policy};
pub use sim::{LanderParams, LunarLander};
pub use state::{encode, DiscreteState, Observation};
