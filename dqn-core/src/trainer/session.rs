use rand::{rngs::StdRng, SeedableRng};

/// Phase of the training loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingPhase {
    /// Actions are drawn uniformly at random to fill the replay memory.
    Warmup,

    /// Actions are selected epsilon-greedily and epsilon decays per decision.
    Exploring,
}

impl TrainingPhase {
    /// Returns the phase at `total_steps`.
    ///
    /// A resumed run never enters the warmup phase.
    pub fn at(total_steps: usize, warmup_steps: usize, resumed: bool) -> Self {
        if !resumed && total_steps < warmup_steps {
            Self::Warmup
        } else {
            Self::Exploring
        }
    }
}

/// Mutable state of one training run.
#[derive(Debug)]
pub struct TrainingSession {
    /// Environment steps taken so far.
    pub total_steps: usize,

    /// Index of the current episode.
    pub episode: usize,

    /// Epsilon at the end of the last episode.
    pub epsilon: f32,

    /// Best evaluation score so far.
    pub best_eval_reward: f32,

    /// Exponential moving average of episode rewards.
    pub ewma_reward: f32,

    pub(super) rng: StdRng,
}

impl TrainingSession {
    /// Starts a session at `start_episode`.
    pub fn new(start_episode: usize, seed: u64) -> Self {
        Self {
            total_steps: 0,
            episode: start_episode,
            epsilon: 1.0,
            best_eval_reward: f32::NEG_INFINITY,
            ewma_reward: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Folds an episode reward into the moving average and returns it.
    pub fn update_ewma(&mut self, episode_reward: f32, smoothing: f32) -> f32 {
        self.ewma_reward = smoothing * episode_reward + (1.0 - smoothing) * self.ewma_reward;
        self.ewma_reward
    }
}
