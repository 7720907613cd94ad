use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How an action is picked from the policy's probabilities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSelection {
    /// With two actions, action 0 only when its probability is strictly
    /// above one half. With more, the most probable action, ties going to
    /// the higher index.
    #[default]
    Deterministic,
    /// Sample from the distribution.
    Stochastic,
}

impl ActionSelection {
    /// Pick an action index from `probs`. Returns 0 for an empty slice.
    #[must_use]
    pub fn select(self, probs: &[f32], rng: &mut fastrand::Rng) -> usize {
        match self {
            ActionSelection::Deterministic => threshold(probs),
            ActionSelection::Stochastic => sample(probs, rng.f32()),
        }
    }
}

fn threshold(probs: &[f32]) -> usize {
    match probs {
        [p0, _] => usize::from(*p0 <= 0.5),
        _ => probs
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, &p)| match best {
                Some((_, bp)) if p < bp => best,
                _ => Some((i, p)),
            })
            .map_or(0, |(i, _)| i),
    }
}

fn sample(probs: &[f32], u: f32) -> usize {
    let mut cumulative = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return i;
        }
    }
    probs.len().saturating_sub(1)
}

impl fmt::Display for ActionSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSelection::Deterministic => write!(f, "deterministic"),
            ActionSelection::Stochastic => write!(f, "stochastic"),
        }
    }
}

impl FromStr for ActionSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deterministic" => Ok(ActionSelection::Deterministic),
            "stochastic" => Ok(ActionSelection::Stochastic),
            other => Err(format!("unknown action selection '{other}'")),
        }
    }
}
