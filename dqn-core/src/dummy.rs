//! Deterministic environment, policy and agent used in tests.
use crate::{
    record::Record, ActionSpace, Agent, Env, ExplorationSchedule, ExplorationScheduleConfig,
    Policy, Step, Transition,
};
use anyhow::Result;
use std::{fs, path::Path};

/// Observation of [`DummyEnv`]: the number of steps taken in the episode.
#[derive(Clone, Debug, PartialEq)]
pub struct DummyObs(pub usize);

impl crate::Obs for DummyObs {}

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Steps until the episode terminates.
    pub episode_len: usize,

    /// The number of actions.
    pub n_actions: usize,

    /// Length of the first episode after the environment is built, if it
    /// differs from `episode_len`.
    pub first_episode_len: Option<usize>,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            episode_len: 10,
            n_actions: 4,
            first_episode_len: None,
        }
    }
}

impl DummyEnvConfig {
    /// Sets the episode length.
    pub fn episode_len(mut self, v: usize) -> Self {
        self.episode_len = v;
        self
    }

    /// Sets the length of the first episode.
    pub fn first_episode_len(mut self, v: Option<usize>) -> Self {
        self.first_episode_len = v;
        self
    }
}

/// An environment that gives reward 1 per step and terminates after a fixed
/// number of steps.
pub struct DummyEnv {
    config: DummyEnvConfig,
    t: usize,
    n_resets: usize,
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Obs = DummyObs;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            t: 0,
            n_resets: 0,
        })
    }

    fn step(&mut self, act: usize) -> (Step<Self>, Record) {
        self.t += 1;
        let episode_len = match (self.n_resets, self.config.first_episode_len) {
            (1, Some(len)) => len,
            _ => self.config.episode_len,
        };
        let is_terminated = self.t >= episode_len;
        let step = Step::new(DummyObs(self.t), act, 1.0, is_terminated, false, ());
        (step, Record::empty())
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.t = 0;
        self.n_resets += 1;
        Ok(DummyObs(0))
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
        self.reset()
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(self.config.n_actions)
    }
}

/// A policy that always returns action 0 and remembers the epsilons it was given.
#[derive(Default)]
pub struct DummyPolicy {
    /// The number of calls of [`Policy::select_action`].
    pub n_calls: usize,

    /// Epsilon passed at every call.
    pub epsilons: Vec<f32>,
}

impl Policy<DummyEnv> for DummyPolicy {
    fn select_action(
        &mut self,
        _obs: &DummyObs,
        epsilon: f32,
        _action_space: &ActionSpace,
    ) -> Result<usize> {
        self.n_calls += 1;
        self.epsilons.push(epsilon);
        Ok(0)
    }
}

/// An agent that records every interaction instead of learning.
pub struct DummyAgent {
    /// Exploration schedule.
    pub schedule: ExplorationSchedule,

    /// Transitions given to [`Agent::observe`].
    pub observed: Vec<Transition<DummyObs>>,

    /// Arguments of [`Agent::step`].
    pub steps: Vec<usize>,

    /// The number of greedy-or-random decisions.
    pub n_decisions: usize,
}

impl DummyAgent {
    /// Constructs the agent with the given exploration schedule.
    pub fn new(config: &ExplorationScheduleConfig) -> Self {
        Self {
            schedule: ExplorationSchedule::new(config),
            observed: vec![],
            steps: vec![],
            n_decisions: 0,
        }
    }
}

impl Policy<DummyEnv> for DummyAgent {
    fn select_action(
        &mut self,
        _obs: &DummyObs,
        _epsilon: f32,
        _action_space: &ActionSpace,
    ) -> Result<usize> {
        self.n_decisions += 1;
        Ok(1)
    }
}

impl Agent<DummyEnv> for DummyAgent {
    fn epsilon(&self) -> f32 {
        self.schedule.value()
    }

    fn advance_exploration(&mut self) {
        self.schedule.advance();
    }

    fn observe(&mut self, transition: Transition<DummyObs>) {
        self.observed.push(transition);
    }

    fn step(&mut self, total_steps: usize) -> Result<Option<Record>> {
        self.steps.push(total_steps);
        Ok(Some(Record::from_scalar("loss", 0.0)))
    }

    fn save_params(&self, path: &Path, checkpoint: bool) -> Result<()> {
        fs::create_dir_all(path)?;
        let name = if checkpoint { "checkpoint" } else { "params" };
        fs::write(path.join(name), format!("{}", self.observed.len()))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path, checkpoint: bool) -> Result<()> {
        let name = if checkpoint { "checkpoint" } else { "params" };
        fs::read_to_string(path.join(name))?;
        Ok(())
    }
}
