//! Train [`Agent`].
mod config;
mod session;
use crate::{
    record::{Record, RecordValue::Scalar, Recorder},
    ActionSpace, Agent, Env, Evaluator, Transition,
};
use anyhow::{bail, Result};
pub use config::TrainerConfig;
use log::{debug, info, warn};
pub use session::{TrainingPhase, TrainingSession};
use std::path::{Path, PathBuf};

// Resets tried when the fire action keeps ending the episode.
const MAX_FIRE_RESETS: usize = 10;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the episode-driven training loop.
///
/// # Training loop
///
/// 0. Given an agent implementing [`Agent`], a recorder implementing [`Recorder`]
///    and an evaluator implementing [`Evaluator`].
/// 1. Build the training [`Env`] and a [`TrainingSession`] with
///    `total_steps = 0`.
/// 2. For each episode in `start_episode..n_episodes`:
///     1. Reset [`Env`] and, if `fire_action` is set, take that action once.
///        The resulting transition is neither stored nor rewarded.
///     2. Choose an action. In [`TrainingPhase::Warmup`] it is uniformly random;
///        in [`TrainingPhase::Exploring`] it comes from [`Policy::select_action`]
///        with the agent's epsilon, after which the exploration schedule advances.
///     3. Step [`Env`] and hand the transition to [`Agent::observe`].
///     4. If `total_steps >= warmup_steps`, call [`Agent::step`] with `total_steps`.
///     5. `total_steps += 1`. Back to 2.2 until the episode ends.
///     6. Update the moving average of episode rewards and write a record.
///     7. If `episode % eval_interval == 0` and `episode != 0`, evaluate the agent.
///        A new best score saves the model in `(model_dir)/best`; the model is
///        always saved in `(model_dir)/(episode)`.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|action|B[Env]
///     B -->|"Step&lt;E: Env&gt;"|T[Trainer]
///     T -->|Transition|R[ReplayMemory]
///     R -->|TransitionBatch|A
/// ```
///
/// The replay memory is owned by the agent, so the trainer only sees it through
/// [`Agent::observe`] and [`Agent::step`].
///
/// [`Policy::select_action`]: crate::Policy::select_action
pub struct Trainer<E: Env> {
    /// Configuration of the environment for training.
    env_config: E::Config,

    /// Where to save the trained model.
    model_dir: Option<String>,

    /// The number of episodes.
    n_episodes: usize,

    /// Warmup period, for filling replay memory, in environment steps.
    warmup_steps: usize,

    /// Interval of evaluation in episodes.
    eval_interval: usize,

    fire_action: Option<usize>,

    start_episode: usize,

    full_checkpoints: bool,

    ewma_smoothing: f32,

    seed: i64,
}

impl<E: Env> Trainer<E> {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig, env_config: E::Config) -> Self {
        Self {
            env_config,
            model_dir: config.model_dir,
            n_episodes: config.n_episodes,
            warmup_steps: config.warmup_steps,
            eval_interval: config.eval_interval,
            fire_action: config.fire_action,
            start_episode: config.start_episode,
            full_checkpoints: config.full_checkpoints,
            ewma_smoothing: config.ewma_smoothing,
            seed: config.seed,
        }
    }

    fn save_model<A: Agent<E>>(agent: &A, model_dir: &Path, checkpoint: bool) -> Result<()> {
        agent.save_params(model_dir, checkpoint)?;
        info!("Saved the model in {:?}.", model_dir);
        Ok(())
    }

    fn save_best_model<A: Agent<E>>(&self, agent: &A) -> Result<()> {
        match &self.model_dir {
            Some(model_dir) => Self::save_model(agent, &PathBuf::from(model_dir).join("best"), false),
            None => Ok(()),
        }
    }

    fn save_model_with_episode<A: Agent<E>>(&self, agent: &A, episode: usize) -> Result<()> {
        match &self.model_dir {
            Some(model_dir) => {
                let path = PathBuf::from(model_dir).join(format!("{}", episode));
                Self::save_model(agent, &path, self.full_checkpoints)
            }
            None => Ok(()),
        }
    }

    /// Resets the environment and takes the fire action, if any.
    ///
    /// If the fire action ends the episode, the environment is reset and the
    /// action is taken again.
    fn reset_and_fire(&self, env: &mut E) -> Result<E::Obs> {
        let act = match self.fire_action {
            None => return env.reset(),
            Some(act) => act,
        };

        for _ in 0..MAX_FIRE_RESETS {
            env.reset()?;
            let (step, _) = env.step(act);
            if !step.is_done() {
                return Ok(step.obs);
            }
            warn!("Episode ended with the fire action, reset again");
        }
        bail!(
            "Episode ended with the fire action {} times in a row",
            MAX_FIRE_RESETS
        )
    }

    /// Runs one training episode and returns its record.
    pub fn train_episode<A: Agent<E>>(
        &self,
        env: &mut E,
        agent: &mut A,
        action_space: &ActionSpace,
        session: &mut TrainingSession,
    ) -> Result<Record> {
        let resumed = self.start_episode != 0;
        let mut obs = self.reset_and_fire(env)?;
        let mut total_reward = 0f32;
        let mut length = 0usize;
        let mut record_agent = None;

        loop {
            let act = match TrainingPhase::at(session.total_steps, self.warmup_steps, resumed) {
                TrainingPhase::Warmup => action_space.sample(&mut session.rng),
                TrainingPhase::Exploring => {
                    let epsilon = agent.epsilon();
                    let act = agent.select_action(&obs, epsilon, action_space)?;
                    agent.advance_exploration();
                    act
                }
            };

            let (step, _) = env.step(act);
            let is_done = step.is_done();
            let reward = step.reward;
            let next_obs = step.obs;
            agent.observe(Transition::new(
                obs,
                act,
                reward,
                next_obs.clone(),
                step.is_terminated,
            ));

            if session.total_steps >= self.warmup_steps {
                if let Some(record) = agent.step(session.total_steps)? {
                    record_agent = Some(record);
                }
            }

            session.total_steps += 1;
            total_reward += reward;
            length += 1;

            if is_done {
                break;
            }
            obs = next_obs;
        }

        session.epsilon = agent.epsilon();
        let ewma_reward = session.update_ewma(total_reward, self.ewma_smoothing);
        debug!(
            "Step: {}\tEpisode: {}\tLength: {:3}\tTotal reward: {:.2}\tEwma reward: {:.2}\tEpsilon: {:.3}",
            session.total_steps, session.episode, length, total_reward, ewma_reward, session.epsilon
        );

        let record = Record::from_slice(&[
            ("episode", Scalar(session.episode as f32)),
            ("Train/Episode Reward", Scalar(total_reward)),
            ("Train/Ewma Reward", Scalar(ewma_reward)),
            ("Train/epsilon", Scalar(session.epsilon)),
            ("Train/Episode Length", Scalar(length as f32)),
            ("Train/Total Steps", Scalar(session.total_steps as f32)),
        ]);

        Ok(match record_agent {
            Some(r) => record.merge(r),
            None => record,
        })
    }

    /// Train the agent.
    ///
    /// Returns the state of the session at the end of training.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn Recorder,
        evaluator: &mut D,
    ) -> Result<TrainingSession>
    where
        A: Agent<E>,
        D: Evaluator<E>,
    {
        let mut env = E::build(&self.env_config, self.seed)?;
        let action_space = env.action_space();
        let mut session = TrainingSession::new(self.start_episode, self.seed as u64);
        session.epsilon = agent.epsilon();
        info!(
            "Start training from episode {} with epsilon {:.3}",
            self.start_episode, session.epsilon
        );

        for episode in self.start_episode..self.n_episodes {
            session.episode = episode;
            let mut record = self.train_episode(&mut env, agent, &action_space, &mut session)?;

            // Evaluation
            if self.eval_interval > 0 && episode % self.eval_interval == 0 && episode != 0 {
                info!("Starts evaluation of the trained model");
                let eval_reward = evaluator.evaluate(agent)?;

                // Save the best model up to the current episode
                if eval_reward > session.best_eval_reward {
                    session.best_eval_reward = eval_reward;
                    self.save_best_model(agent)?;
                }
                self.save_model_with_episode(agent, episode)?;
                record.insert("Val score", Scalar(eval_reward));
            }

            recorder.write(record);
        }

        recorder.flush(session.episode as _);
        info!("Finished training after {} steps", session.total_steps);

        Ok(session)
    }
}
