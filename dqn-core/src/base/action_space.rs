//! Action space.
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The set of legal actions of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ActionSpace {
    /// Actions are the integers `0..n`.
    Discrete(usize),
}

impl ActionSpace {
    /// Returns the number of actions.
    pub fn n_actions(&self) -> usize {
        match self {
            Self::Discrete(n) => *n,
        }
    }

    /// Draws an action uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        match self {
            Self::Discrete(n) => rng.gen_range(0..*n),
        }
    }

    /// Returns `true` if `act` is a legal action.
    pub fn contains(&self, act: usize) -> bool {
        act < self.n_actions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_sample_is_legal() {
        let space = ActionSpace::Discrete(4);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; 4];

        for _ in 0..200 {
            let a = space.sample(&mut rng);
            assert!(space.contains(a));
            seen[a] = true;
        }

        assert!(seen.iter().all(|&s| s));
        assert!(!space.contains(4));
    }
}
