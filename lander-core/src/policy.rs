use serde::{Deserialize, Serialize};

use crate::constants::{ENGINE_COUNT, ONE_LEG_MAIN_THRUST, ONE_LEG_SIDE_THRUST, POLICY_LEN};
use crate::error::PolicyError;
use crate::state::{encode, DiscreteState, Observation};

/// Engine command pair. Values are nominally in `[-1, 1]` but the policy
/// table output is passed through unclamped; the environment interprets
/// out-of-range throttle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub main: f64,
    pub side: f64,
}

impl Action {
    pub const IDLE: Self = Self {
        main: 0.0,
        side: 0.0,
    };

    pub const ONE_LEG_CORRECTION: Self = Self {
        main: ONE_LEG_MAIN_THRUST,
        side: ONE_LEG_SIDE_THRUST,
    };

    pub fn new(main: f64, side: f64) -> Self {
        Self { main, side }
    }

    pub fn is_finite(&self) -> bool {
        self.main.is_finite() && self.side.is_finite()
    }
}

/// Lookup table from each of the 27 discrete states to a thrust pair,
/// stored flat as `[main, side]` per state in row-major state order.
///
/// Serialized as a bare array of 54 numbers; any other length fails to load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Policy {
    genes: [f64; POLICY_LEN],
}

impl Policy {
    pub fn zeros() -> Self {
        Self {
            genes: [0.0; POLICY_LEN],
        }
    }

    pub fn from_fn(mut gene: impl FnMut(usize) -> f64) -> Self {
        let mut genes = [0.0; POLICY_LEN];
        for (idx, slot) in genes.iter_mut().enumerate() {
            *slot = gene(idx);
        }
        Self { genes }
    }

    pub fn from_slice(values: &[f64]) -> Result<Self, PolicyError> {
        if values.len() != POLICY_LEN {
            return Err(PolicyError::WrongLength {
                expected: POLICY_LEN,
                actual: values.len(),
            });
        }
        if let Some((index, value)) = values
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(PolicyError::NonFiniteGene {
                index,
                value: *value,
            });
        }
        let mut genes = [0.0; POLICY_LEN];
        genes.copy_from_slice(values);
        Ok(Self { genes })
    }

    pub fn genes(&self) -> &[f64; POLICY_LEN] {
        &self.genes
    }

    pub fn genes_mut(&mut self) -> &mut [f64; POLICY_LEN] {
        &mut self.genes
    }

    pub fn thrust(&self, state: DiscreteState) -> Action {
        let offset = gene_offset(state);
        Action {
            main: self.genes[offset],
            side: self.genes[offset + 1],
        }
    }

    pub fn set_thrust(&mut self, state: DiscreteState, action: Action) {
        let offset = gene_offset(state);
        self.genes[offset] = action.main;
        self.genes[offset + 1] = action.side;
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::zeros()
    }
}

impl TryFrom<Vec<f64>> for Policy {
    type Error = PolicyError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_slice(&values)
    }
}

impl From<Policy> for Vec<f64> {
    fn from(policy: Policy) -> Self {
        policy.genes.to_vec()
    }
}

/// Flat offset of the main-thrust gene for `state`; side thrust follows it.
pub fn gene_offset(state: DiscreteState) -> usize {
    state.index() * ENGINE_COUNT
}

/// Next action for an observation. With exactly one leg down the table is
/// bypassed for a fixed gentle burn.
pub fn action_for(obsv: &Observation, policy: &Policy) -> Action {
    if obsv.one_leg_contact() {
        return Action::ONE_LEG_CORRECTION;
    }
    policy.thrust(encode(obsv))
}
