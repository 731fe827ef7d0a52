//! Lookup-table geometry, encoder thresholds and lander defaults.

// Discrete state space: centering x descent x tilt
pub const CENTERING_BUCKETS: usize = 3;
pub const DESCENT_BUCKETS: usize = 3;
pub const TILT_BUCKETS: usize = 3;
pub const STATE_COUNT: usize = CENTERING_BUCKETS * DESCENT_BUCKETS * TILT_BUCKETS; // 27

// Thrust pair per state: (main, side)
pub const ENGINE_COUNT: usize = 2;
pub const POLICY_LEN: usize = STATE_COUNT * ENGINE_COUNT; // 54

pub const THRUST_LB: f64 = -1.0;
pub const THRUST_UB: f64 = 1.0;

// Encoder thresholds. Comparisons are strict; boundary values fall to bucket 0.
pub const CENTER_BAND: f64 = 0.1;
pub const DESCENT_SLOW: f64 = 0.1;
pub const DESCENT_FAST: f64 = 0.25;
pub const TILT_THRESHOLD_DEG: f64 = 3.0;

// Fixed action while exactly one leg touches the ground.
pub const ONE_LEG_MAIN_THRUST: f64 = 0.05;
pub const ONE_LEG_SIDE_THRUST: f64 = 0.0;

// Episode bookkeeping
pub const EVAL_EPISODES_DEFAULT: u32 = 10;
pub const REPLAY_EPISODES_DEFAULT: u32 = 30;
pub const MAX_EPISODE_STEPS_DEFAULT: u32 = 1_000;

// Lander simulation, normalized world units (helipad at x = 0, ground at y = 0)
pub const FPS: f64 = 50.0;
pub const GRAVITY: f64 = -0.5;
pub const MAIN_ENGINE_ACCEL: f64 = 0.9; // half throttle cannot hover
pub const SIDE_ENGINE_ACCEL: f64 = 0.3;
pub const SIDE_ENGINE_TORQUE: f64 = 1.6;
pub const LEG_SPREAD: f64 = 0.06;
pub const LEG_DROP: f64 = 0.04;
pub const WORLD_HALF_WIDTH: f64 = 1.0;
pub const INITIAL_HEIGHT: f64 = 1.4;
pub const INITIAL_X_SPREAD: f64 = 0.3;
pub const INITIAL_SPEED_SPREAD: f64 = 0.2;
pub const INITIAL_TILT_SPREAD: f64 = 0.05;
pub const SAFE_LANDING_SPEED: f64 = 0.5;
pub const SAFE_LANDING_ANGLE: f64 = 0.4; // ~23 degrees
pub const REST_SPEED: f64 = 0.01;
pub const GROUND_FRICTION: f64 = 0.8;

// Reward shaping
pub const CRASH_REWARD: f64 = -100.0;
pub const LANDED_REWARD: f64 = 100.0;
pub const MAIN_FUEL_COST: f64 = 0.30;
pub const SIDE_FUEL_COST: f64 = 0.03;
