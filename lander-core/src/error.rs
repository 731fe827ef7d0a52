use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EnvError {
    NotReset,
    EpisodeOver { steps: u32 },
    NonFiniteAction { main: f64, side: f64 },
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReset => write!(f, "environment stepped before reset"),
            Self::EpisodeOver { steps } => write!(
                f,
                "episode already finished after {steps} steps; reset before stepping"
            ),
            Self::NonFiniteAction { main, side } => {
                write!(f, "non-finite action: main={main}, side={side}")
            }
        }
    }
}

impl std::error::Error for EnvError {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PolicyError {
    WrongLength { expected: usize, actual: usize },
    NonFiniteGene { index: usize, value: f64 },
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLength { expected, actual } => write!(
                f,
                "policy length mismatch: expected {expected} genes, got {actual}"
            ),
            Self::NonFiniteGene { index, value } => {
                write!(f, "policy gene {index} is not finite: {value}")
            }
        }
    }
}

impl std::error::Error for PolicyError {}
