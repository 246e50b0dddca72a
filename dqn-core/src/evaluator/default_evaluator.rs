//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{ActionSpace, Env, Policy};
use anyhow::Result;
use log::info;

/// Runs a fixed number of episodes with a fixed epsilon and returns the mean
/// total reward.
///
/// The environment is built once and reset with the episode index before each
/// episode. The policy is only queried through [`Policy::select_action`].
///
/// # Examples
///
/// ```ignore
/// let config = BreakoutEnvConfig::default().eval();
/// let mut evaluator = DefaultEvaluator::<BreakoutEnv>::new(&config, 42, 10, 0.01)?;
/// let mean_reward = evaluator.evaluate(&mut agent)?;
/// ```
pub struct DefaultEvaluator<E: Env> {
    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// Exploration rate used for every decision.
    epsilon: f32,

    /// The environment instance used for evaluation.
    env: E,

    action_space: ActionSpace,
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// * `config` - Configuration for the environment
    /// * `seed` - Random seed for environment initialization
    /// * `n_episodes` - Number of episodes to run during evaluation
    /// * `epsilon` - Exploration rate during evaluation
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize, epsilon: f32) -> Result<Self> {
        let env = E::build(config, seed)?;
        let action_space = env.action_space();
        Ok(Self {
            n_episodes,
            epsilon,
            env,
            action_space,
        })
    }

    /// Runs the episodes and returns the total reward of each.
    pub fn episode_rewards<P: Policy<E>>(&mut self, policy: &mut P) -> Result<Vec<f32>> {
        let mut rewards = Vec::with_capacity(self.n_episodes);

        for ix in 0..self.n_episodes {
            let mut obs = self.env.reset_with_index(ix)?;
            let mut r_total = 0f32;

            loop {
                let act = policy.select_action(&obs, self.epsilon, &self.action_space)?;
                let (step, _) = self.env.step(act);
                r_total += step.reward;
                if step.is_done() {
                    break;
                }
                obs = step.obs;
            }

            info!("Evaluation episode {}: {:.2}", ix + 1, r_total);
            rewards.push(r_total);
        }

        Ok(rewards)
    }
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<f32> {
        let rewards = self.episode_rewards(policy)?;
        let mean = match rewards.len() {
            0 => 0.0,
            n => rewards.iter().sum::<f32>() / n as f32,
        };
        info!("Average reward: {:.2}", mean);
        Ok(mean)
    }
}
