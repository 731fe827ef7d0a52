//! Seeded planar lander.
//!
//! Engine semantics follow the continuous-control lander:
//! - main engine: off for `main <= 0`, throttle 50%..100% over `(0, 1]`;
//! - side engines: fire only for `|side| > 0.5`, left for negative and right
//!   for positive, throttle 50%..100%.
//!
//! World units are normalized: the helipad is centred at `x = 0`, the ground
//! is `y = 0` and the screen edge is `|x| = 1`. A fresh environment built
//! with the same seed replays identical episodes.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CRASH_REWARD, FPS, GRAVITY, GROUND_FRICTION, INITIAL_HEIGHT, INITIAL_SPEED_SPREAD,
    INITIAL_TILT_SPREAD, INITIAL_X_SPREAD, LANDED_REWARD, LEG_DROP, LEG_SPREAD,
    MAIN_ENGINE_ACCEL, MAIN_FUEL_COST, MAX_EPISODE_STEPS_DEFAULT, REST_SPEED,
    SAFE_LANDING_ANGLE, SAFE_LANDING_SPEED, SIDE_ENGINE_ACCEL, SIDE_ENGINE_TORQUE,
    SIDE_FUEL_COST, WORLD_HALF_WIDTH,
};
use crate::env::{Environment, Outcome, Step, StepInfo};
use crate::error::EnvError;
use crate::policy::Action;
use crate::rng::SeededRng;
use crate::state::Observation;

const CONTACT_EPS: f64 = 1e-3;
const SETTLE_GAIN: f64 = 20.0;
const SETTLE_DAMPING: f64 = 0.9;
const TRACK_WIDTH: usize = 41;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanderParams {
    pub gravity: f64,
    pub main_engine_accel: f64,
    pub side_engine_accel: f64,
    pub side_engine_torque: f64,
    pub max_episode_steps: u32,
    pub initial_height: f64,
    pub initial_x_spread: f64,
    pub initial_speed_spread: f64,
    pub initial_tilt_spread: f64,
    pub safe_landing_speed: f64,
    pub safe_landing_angle: f64,
}

impl Default for LanderParams {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            main_engine_accel: MAIN_ENGINE_ACCEL,
            side_engine_accel: SIDE_ENGINE_ACCEL,
            side_engine_torque: SIDE_ENGINE_TORQUE,
            max_episode_steps: MAX_EPISODE_STEPS_DEFAULT,
            initial_height: INITIAL_HEIGHT,
            initial_x_spread: INITIAL_X_SPREAD,
            initial_speed_spread: INITIAL_SPEED_SPREAD,
            initial_tilt_spread: INITIAL_TILT_SPREAD,
            safe_landing_speed: SAFE_LANDING_SPEED,
            safe_landing_angle: SAFE_LANDING_ANGLE,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Body {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    angle: f64,
    angular_velocity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Flying,
    Finished,
}

#[derive(Clone, Debug)]
pub struct LunarLander {
    params: LanderParams,
    rng: SeededRng,
    body: Body,
    legs: [bool; 2],
    steps: u32,
    prev_shaping: f64,
    phase: Phase,
}

impl LunarLander {
    pub fn new(seed: u32) -> Self {
        Self::with_params(seed, LanderParams::default())
    }

    pub fn with_params(seed: u32, params: LanderParams) -> Self {
        Self {
            params,
            rng: SeededRng::new(seed),
            body: Body::default(),
            legs: [false; 2],
            steps: 0,
            prev_shaping: 0.0,
            phase: Phase::Idle,
        }
    }

    pub fn observation(&self) -> Observation {
        let b = &self.body;
        Observation {
            x: b.x,
            y: b.y,
            vx: b.vx,
            vy: b.vy,
            angle: b.angle,
            angular_velocity: b.angular_velocity,
            leg_left_contact: contact_flag(self.legs[0]),
            leg_right_contact: contact_flag(self.legs[1]),
        }
    }

    /// One-line text frame: position on the pad track plus the raw state.
    pub fn frame_line(&self) -> String {
        let b = &self.body;
        let span = (TRACK_WIDTH - 1) as f64;
        let col = ((b.x + WORLD_HALF_WIDTH) / (2.0 * WORLD_HALF_WIDTH) * span)
            .round()
            .clamp(0.0, span) as usize;
        let track: String = (0..TRACK_WIDTH)
            .map(|idx| {
                if idx == col {
                    'A'
                } else if idx == TRACK_WIDTH / 2 {
                    '|'
                } else {
                    '.'
                }
            })
            .collect();
        format!(
            "[{track}] step={:04} y={:+.3} vx={:+.3} vy={:+.3} tilt={:+6.1}deg legs={}{}",
            self.steps,
            b.y,
            b.vx,
            b.vy,
            b.angle.to_degrees(),
            if self.legs[0] { 'L' } else { '-' },
            if self.legs[1] { 'R' } else { '-' },
        )
    }

    fn leg_tips_y(&self) -> [f64; 2] {
        let b = &self.body;
        let (sin, cos) = b.angle.sin_cos();
        let tip = |dx: f64| b.y + dx * sin - LEG_DROP * cos;
        [tip(-LEG_SPREAD), tip(LEG_SPREAD)]
    }

    fn shaping(&self) -> f64 {
        let b = &self.body;
        -100.0 * (b.x * b.x + b.y * b.y).sqrt()
            - 100.0 * (b.vx * b.vx + b.vy * b.vy).sqrt()
            - 100.0 * b.angle.abs()
            + 10.0 * contact_flag(self.legs[0])
            + 10.0 * contact_flag(self.legs[1])
    }

    fn integrate(&mut self, main_power: f64, side_dir: f64, side_power: f64) {
        let p = &self.params;
        let dt = 1.0 / FPS;
        let b = &mut self.body;
        let (sin, cos) = b.angle.sin_cos();
        let main = main_power * p.main_engine_accel;
        let side = side_dir * side_power * p.side_engine_accel;

        b.vx += (-sin * main + cos * side) * dt;
        b.vy += (cos * main + sin * side + p.gravity) * dt;
        b.angular_velocity += -side_dir * side_power * p.side_engine_torque * dt;

        b.x += b.vx * dt;
        b.y += b.vy * dt;
        b.angle += b.angular_velocity * dt;
    }

    /// Ground contact after integration. Returns the terminal outcome if the
    /// touchdown crashed or the lander came to rest on both legs.
    fn resolve_ground(&mut self) -> Option<Outcome> {
        let tips = self.leg_tips_y();
        let lowest = tips[0].min(tips[1]);
        if lowest > 0.0 {
            self.legs = [false; 2];
            return None;
        }

        let p = &self.params;
        let b = &mut self.body;
        let impact = (b.vx * b.vx + b.vy * b.vy).sqrt();
        if impact > p.safe_landing_speed || b.angle.abs() > p.safe_landing_angle {
            return Some(Outcome::Crashed);
        }

        b.y -= lowest;
        if b.vy < 0.0 {
            b.vy = 0.0;
        }
        b.vx *= GROUND_FRICTION;

        let tips = self.leg_tips_y();
        self.legs = [tips[0] <= CONTACT_EPS, tips[1] <= CONTACT_EPS];

        let b = &mut self.body;
        if self.legs == [true, true] {
            b.angular_velocity *= 0.5;
        } else {
            // pivot on the touching leg toward level
            b.angular_velocity -= b.angle * SETTLE_GAIN / FPS;
            b.angular_velocity *= SETTLE_DAMPING;
        }

        let at_rest = self.legs == [true, true]
            && b.vx.abs() < REST_SPEED
            && b.vy.abs() < REST_SPEED
            && b.angular_velocity.abs() < REST_SPEED;
        at_rest.then_some(Outcome::Landed)
    }
}

impl Environment for LunarLander {
    fn reset(&mut self) -> Result<Observation, EnvError> {
        let p = &self.params;
        let (spread, speed, tilt) = (
            p.initial_x_spread,
            p.initial_speed_spread,
            p.initial_tilt_spread,
        );
        let height = p.initial_height;
        self.body = Body {
            x: self.rng.next_range(-spread, spread),
            y: height,
            vx: self.rng.next_range(-speed, speed),
            vy: self.rng.next_range(-speed, 0.0),
            angle: self.rng.next_range(-tilt, tilt),
            angular_velocity: self.rng.next_range(-tilt, tilt),
        };
        self.legs = [false; 2];
        self.steps = 0;
        self.prev_shaping = self.shaping();
        self.phase = Phase::Flying;
        Ok(self.observation())
    }

    fn step(&mut self, action: Action) -> Result<Step, EnvError> {
        match self.phase {
            Phase::Idle => return Err(EnvError::NotReset),
            Phase::Finished => return Err(EnvError::EpisodeOver { steps: self.steps }),
            Phase::Flying => {}
        }
        if !action.is_finite() {
            return Err(EnvError::NonFiniteAction {
                main: action.main,
                side: action.side,
            });
        }

        let main_power = main_throttle(action.main);
        let (side_dir, side_power) = side_throttle(action.side);
        self.integrate(main_power, side_dir, side_power);
        self.steps += 1;

        let mut outcome = self.resolve_ground();
        if outcome.is_none() && self.body.x.abs() >= WORLD_HALF_WIDTH {
            outcome = Some(Outcome::OutOfBounds);
        }

        let shaping = self.shaping();
        let mut reward = shaping - self.prev_shaping;
        self.prev_shaping = shaping;
        reward -= main_power * MAIN_FUEL_COST;
        reward -= side_power * SIDE_FUEL_COST;
        match outcome {
            Some(Outcome::Crashed) | Some(Outcome::OutOfBounds) => reward = CRASH_REWARD,
            Some(Outcome::Landed) => reward = LANDED_REWARD,
            Some(Outcome::TimeLimit) | None => {}
        }

        let terminated = outcome.is_some();
        let truncated = !terminated && self.steps >= self.params.max_episode_steps;
        if truncated {
            outcome = Some(Outcome::TimeLimit);
        }
        if terminated || truncated {
            self.phase = Phase::Finished;
        }

        Ok(Step {
            observation: self.observation(),
            reward,
            terminated,
            truncated,
            info: StepInfo {
                steps: self.steps,
                outcome,
            },
        })
    }

    fn render(&mut self) -> Result<(), EnvError> {
        if self.phase == Phase::Idle {
            return Err(EnvError::NotReset);
        }
        println!("{}", self.frame_line());
        Ok(())
    }
}

fn contact_flag(contact: bool) -> f64 {
    if contact {
        1.0
    } else {
        0.0
    }
}

fn main_throttle(main: f64) -> f64 {
    if main > 0.0 {
        (main.clamp(0.0, 1.0) + 1.0) * 0.5
    } else {
        0.0
    }
}

fn side_throttle(side: f64) -> (f64, f64) {
    if side.abs() > 0.5 {
        (side.signum(), side.abs().clamp(0.5, 1.0))
    } else {
        (0.0, 0.0)
    }
}
