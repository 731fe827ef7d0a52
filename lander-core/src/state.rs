//! Observation model and the encoder that quantizes it into one of 27 states.
//!
//! The bucket numbering is part of the policy storage layout: a saved
//! policy is only meaningful under the exact thresholds and tie-breaks
//! below, so they must not drift.

use core::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CENTERING_BUCKETS, CENTER_BAND, DESCENT_BUCKETS, DESCENT_FAST, DESCENT_SLOW,
    TILT_BUCKETS, TILT_THRESHOLD_DEG,
};

/// One environment reading, in the order the lander reports it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Radians, counter-clockwise positive.
    pub angle: f64,
    pub angular_velocity: f64,
    /// 1.0 while the leg touches the ground, 0.0 otherwise.
    pub leg_left_contact: f64,
    pub leg_right_contact: f64,
}

impl Observation {
    /// Exactly one leg is on the ground.
    pub fn one_leg_contact(&self) -> bool {
        self.leg_left_contact != self.leg_right_contact
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Centering {
    Centered = 0,
    Left = 1,
    Right = 2,
}

/// Buckets of `v = -vy`. Anything under 0.1, climbing included, is bucket 0;
/// the closed band `[0.1, 0.25]` is bucket 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Descent {
    Slow = 0,
    Moderate = 1,
    Fast = 2,
}

/// There is no negative-angle branch: every tilt under 3 degrees, including
/// all negative angles, is `Left`; only exactly 3 degrees is `Level`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tilt {
    Level = 0,
    Left = 1,
    Right = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscreteState {
    pub centering: Centering,
    pub descent: Descent,
    pub tilt: Tilt,
}

impl DiscreteState {
    pub fn new(centering: Centering, descent: Descent, tilt: Tilt) -> Self {
        Self {
            centering,
            descent,
            tilt,
        }
    }

    /// Row-major index over (centering, descent, tilt), in `0..27`.
    pub fn index(&self) -> usize {
        ((self.centering as usize) * DESCENT_BUCKETS + self.descent as usize) * TILT_BUCKETS
            + self.tilt as usize
    }

    pub fn as_triple(&self) -> [u8; 3] {
        [self.centering as u8, self.descent as u8, self.tilt as u8]
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index >= CENTERING_BUCKETS * DESCENT_BUCKETS * TILT_BUCKETS {
            return None;
        }
        let tilt = index % TILT_BUCKETS;
        let descent = (index / TILT_BUCKETS) % DESCENT_BUCKETS;
        let centering = index / (TILT_BUCKETS * DESCENT_BUCKETS);
        Some(Self::new(
            CENTERINGS[centering],
            DESCENTS[descent],
            TILTS[tilt],
        ))
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (0..CENTERING_BUCKETS * DESCENT_BUCKETS * TILT_BUCKETS).filter_map(Self::from_index)
    }
}

const CENTERINGS: [Centering; CENTERING_BUCKETS] =
    [Centering::Centered, Centering::Left, Centering::Right];
const DESCENTS: [Descent; DESCENT_BUCKETS] = [Descent::Slow, Descent::Moderate, Descent::Fast];
const TILTS: [Tilt; TILT_BUCKETS] = [Tilt::Level, Tilt::Left, Tilt::Right];

pub fn encode(obsv: &Observation) -> DiscreteState {
    DiscreteState {
        centering: centering_bucket(obsv.x),
        descent: descent_bucket(obsv.vy),
        tilt: tilt_bucket(obsv.angle),
    }
}

pub fn centering_bucket(x: f64) -> Centering {
    if x < -CENTER_BAND {
        Centering::Left
    } else if x > CENTER_BAND {
        Centering::Right
    } else {
        Centering::Centered
    }
}

pub fn descent_bucket(vy: f64) -> Descent {
    let v = -vy;
    if v < DESCENT_SLOW {
        Descent::Slow
    } else if v > DESCENT_FAST {
        Descent::Fast
    } else {
        Descent::Moderate
    }
}

pub fn tilt_bucket(angle: f64) -> Tilt {
    tilt_bucket_degrees(angle / PI * 180.0)
}

pub fn tilt_bucket_degrees(degrees: f64) -> Tilt {
    if degrees < TILT_THRESHOLD_DEG {
        Tilt::Left
    } else if degrees > TILT_THRESHOLD_DEG {
        Tilt::Right
    } else {
        Tilt::Level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obsv(x: f64, vy: f64, angle: f64) -> Observation {
        Observation {
            x,
            vy,
            angle,
            ..Observation::default()
        }
    }

    #[test]
    fn centering_boundaries_fall_to_centered() {
        assert_eq!(centering_bucket(-0.1), Centering::Centered);
        assert_eq!(centering_bucket(0.1), Centering::Centered);
        assert_eq!(centering_bucket(0.0), Centering::Centered);
        assert_eq!(centering_bucket(-0.0999), Centering::Centered);
        assert_eq!(centering_bucket(-0.1001), Centering::Left);
        assert_eq!(centering_bucket(-3.0), Centering::Left);
        assert_eq!(centering_bucket(0.1001), Centering::Right);
        assert_eq!(centering_bucket(0.9), Centering::Right);
    }

    #[test]
    fn descent_band_is_bucket_one() {
        assert_eq!(descent_bucket(-0.05) as u8, 0);
        assert_eq!(descent_bucket(-0.2) as u8, 1);
        assert_eq!(descent_bucket(-0.3) as u8, 2);
        // climbing is slow descent
        assert_eq!(descent_bucket(0.4), Descent::Slow);
        assert_eq!(descent_bucket(-0.1), Descent::Moderate);
        assert_eq!(descent_bucket(-0.25), Descent::Moderate);
    }

    #[test]
    fn tilt_has_no_negative_branch() {
        assert_eq!(tilt_bucket_degrees(2.0) as u8, 1);
        assert_eq!(tilt_bucket_degrees(4.0) as u8, 2);
        assert_eq!(tilt_bucket_degrees(3.0) as u8, 0);
        assert_eq!(tilt_bucket_degrees(-5.0) as u8, 1);
        assert_eq!(tilt_bucket(0.0), Tilt::Left);
        assert_eq!(tilt_bucket(-0.5), Tilt::Left);
        assert_eq!(tilt_bucket(0.1), Tilt::Right);
    }

    #[test]
    fn encode_reads_x_vy_and_angle_only() {
        let mut o = obsv(-0.5, -0.3, 0.2);
        assert_eq!(encode(&o).as_triple(), [1, 2, 2]);
        o.y = 9.0;
        o.vx = -4.0;
        o.angular_velocity = 3.0;
        o.leg_left_contact = 1.0;
        assert_eq!(encode(&o).as_triple(), [1, 2, 2]);
        assert_eq!(encode(&obsv(0.0, -0.05, 0.0)).as_triple(), [0, 0, 1]);
    }

    #[test]
    fn index_covers_every_state_once() {
        let indices: Vec<usize> = DiscreteState::all().map(|s| s.index()).collect();
        assert_eq!(indices, (0..27).collect::<Vec<_>>());
        let s = DiscreteState::new(Centering::Right, Descent::Moderate, Tilt::Left);
        assert_eq!(s.index(), 2 * 9 + 3 + 1);
        assert_eq!(DiscreteState::from_index(s.index()), Some(s));
        assert_eq!(DiscreteState::from_index(27), None);
    }
}
