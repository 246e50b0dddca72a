use super::{config::DqnConfig, model::DqnModel};
use crate::{
    model::SubModel,
    opt::Adam,
    stack_obs,
    util::{clip_grad_norm, grad_norm, OutDim},
    ObsTensor,
};
use anyhow::{bail, Result};
use candle_core::{shape::D, Device, Tensor};
use candle_nn::loss::mse;
use dqn_core::{
    error::DqnError,
    record::{Record, RecordValue},
    ActionSpace, Agent, Configurable, Env, ExplorationSchedule, Policy, ReplayMemory, Transition,
};
use log::{debug, info};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, fs, marker::PhantomData, path::Path};

/// Threshold of the global L2 norm of the gradients applied in a learning update.
pub const GRAD_CLIP_NORM: f64 = 5.0;

const QNET_FILE: &str = "qnet.safetensors";
const QNET_TGT_FILE: &str = "qnet_tgt.safetensors";
const OPT_FILE: &str = "opt.safetensors";

#[cfg_attr(doc, aquamarine::aquamarine)]
/// DQN agent implemented with candle.
///
/// The agent owns the behavior network, the target network, the replay memory
/// and the exploration schedule.
///
/// ```mermaid
/// graph LR
///     T[Trainer]-->|observe|R[ReplayMemory]
///     R-->|TransitionBatch|Q[qnet]
///     Q-->|load_parameters_from|G[qnet_tgt]
///     G-->|bootstrap target|Q
/// ```
///
/// A learning update samples `batch_size` transitions and minimizes the mean
/// squared error between `Q(s, a)` and `r + gamma * max_a' Q_tgt(s', a') * (1 - done)`.
/// The target is detached from the computation graph and the global norm of the
/// gradients is clipped to [`GRAD_CLIP_NORM`] before the optimizer step.
#[allow(clippy::upper_case_acronyms)]
pub struct Dqn<E, Q>
where
    E: Env,
    E::Obs: ObsTensor,
    Q: SubModel<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    pub(in crate::dqn) qnet: DqnModel<Q>,
    pub(in crate::dqn) qnet_tgt: DqnModel<Q>,
    pub(in crate::dqn) opt: Adam,
    pub(in crate::dqn) memory: ReplayMemory<E::Obs>,
    pub(in crate::dqn) explorer: ExplorationSchedule,
    pub(in crate::dqn) batch_size: usize,
    pub(in crate::dqn) discount_factor: f64,
    pub(in crate::dqn) learn_interval: usize,
    pub(in crate::dqn) target_sync_interval: usize,
    pub(in crate::dqn) device: Device,
    pub(in crate::dqn) n_opts: usize,
    rng: SmallRng,
    phantom: PhantomData<E>,
}

impl<E, Q> Dqn<E, Q>
where
    E: Env,
    E::Obs: ObsTensor,
    Q: SubModel<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    /// Computes the regression target of a batch, detached from the graph.
    ///
    /// `is_not_done` is 0 for terminal transitions, which zeroes the bootstrap term.
    pub fn bootstrap_target(
        &self,
        reward: &Tensor,
        next_obs: &Tensor,
        is_not_done: &Tensor,
    ) -> Result<Tensor> {
        let q_next = self.qnet_tgt.forward(next_obs)?.max(D::Minus1)?;
        let tgt = (reward + ((q_next * is_not_done)? * self.discount_factor)?)?;
        Ok(tgt.detach())
    }

    fn learn(&mut self) -> Result<Record> {
        let batch = self.memory.sample(self.batch_size)?;
        let (obs, act, reward, next_obs, is_done) = batch.unpack();
        let n = act.len();

        let obs = stack_obs(&obs, &self.device)?;
        let next_obs = stack_obs(&next_obs, &self.device)?;
        let act = {
            let act = act.into_iter().map(|a| a as u32).collect::<Vec<_>>();
            Tensor::from_vec(act, n, &self.device)?
        };
        let reward = Tensor::from_vec(reward, n, &self.device)?;
        let is_not_done = {
            let is_not_done = is_done
                .into_iter()
                .map(|d| if d { 0f32 } else { 1f32 })
                .collect::<Vec<_>>();
            Tensor::from_vec(is_not_done, n, &self.device)?
        };

        let pred = self
            .qnet
            .forward(&obs)?
            .gather(&act.unsqueeze(1)?, 1)?
            .squeeze(1)?;
        let tgt = self.bootstrap_target(&reward, &next_obs, &is_not_done)?;
        let loss = mse(&pred, &tgt)?;

        let loss_value = loss.to_scalar::<f32>()?;
        if !loss_value.is_finite() {
            return Err(DqnError::NumericInstability(format!("loss is {}", loss_value)).into());
        }

        let mut grads = loss.backward()?;
        let vars = self.qnet.vars()?;
        let norm = clip_grad_norm(&mut grads, &vars, GRAD_CLIP_NORM)?;
        if !norm.is_finite() {
            return Err(
                DqnError::NumericInstability(format!("gradient norm is {}", norm)).into(),
            );
        }
        let norm_clipped = grad_norm(&grads, &vars)?;

        self.opt.step(&grads)?;
        self.n_opts += 1;

        Ok(Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss_value)),
            ("grad_norm", RecordValue::Scalar(norm)),
            ("grad_norm_clipped", RecordValue::Scalar(norm_clipped)),
        ]))
    }

    fn sync_target(&mut self) -> Result<()> {
        self.qnet_tgt.load_parameters_from(&self.qnet)?;
        debug!("Synchronized the target network after {} updates", self.n_opts);
        Ok(())
    }

    /// Returns the replay memory.
    pub fn memory(&self) -> &ReplayMemory<E::Obs> {
        &self.memory
    }

    /// Returns the number of learning updates so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Returns the behavior network.
    pub fn qnet(&self) -> &DqnModel<Q> {
        &self.qnet
    }
}

impl<E, Q> Configurable for Dqn<E, Q>
where
    E: Env,
    E::Obs: ObsTensor,
    Q: SubModel<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    type Config = DqnConfig<Q::Config>;

    /// Constructs DQN agent.
    ///
    /// The target network starts as a copy of the behavior network.
    fn build(config: Self::Config) -> Result<Self> {
        if config.learn_interval == 0 {
            bail!("learn_interval must be positive");
        }
        if config.target_sync_interval == 0 {
            bail!("target_sync_interval must be positive");
        }

        let device: Device = config.device.unwrap_or(crate::Device::Cpu).try_into()?;
        let qnet = DqnModel::<Q>::build(config.model_config.clone(), device.clone())?;
        let mut qnet_tgt = DqnModel::<Q>::build(config.model_config, device.clone())?;
        qnet_tgt.load_parameters_from(&qnet)?;
        let opt = config.opt_config.build(qnet.parameters()?)?;
        let memory = ReplayMemory::build(&config.memory_config)?;
        let explorer = match config.resume {
            false => ExplorationSchedule::new(&config.exploration_config),
            true => ExplorationSchedule::resumed(&config.exploration_config),
        };

        Ok(Dqn {
            qnet,
            qnet_tgt,
            opt,
            memory,
            explorer,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            learn_interval: config.learn_interval,
            target_sync_interval: config.target_sync_interval,
            device,
            n_opts: 0,
            rng: SmallRng::seed_from_u64(config.seed),
            phantom: PhantomData,
        })
    }
}

impl<E, Q> Policy<E> for Dqn<E, Q>
where
    E: Env,
    E::Obs: ObsTensor,
    Q: SubModel<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    fn select_action(
        &mut self,
        obs: &E::Obs,
        epsilon: f32,
        action_space: &ActionSpace,
    ) -> Result<usize> {
        if self.rng.gen::<f32>() < epsilon {
            return Ok(action_space.sample(&mut self.rng));
        }

        let xs = obs.to_tensor(&self.device)?.unsqueeze(0)?;
        let a = self
            .qnet
            .forward(&xs)?
            .argmax(D::Minus1)?
            .squeeze(0)?
            .to_scalar::<u32>()? as usize;

        if !action_space.contains(a) {
            bail!(
                "Action {} is out of the action space of {} actions",
                a,
                action_space.n_actions()
            );
        }
        Ok(a)
    }
}

impl<E, Q> Agent<E> for Dqn<E, Q>
where
    E: Env,
    E::Obs: ObsTensor,
    Q: SubModel<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    fn epsilon(&self) -> f32 {
        self.explorer.value()
    }

    fn advance_exploration(&mut self) {
        self.explorer.advance();
    }

    fn observe(&mut self, transition: Transition<E::Obs>) {
        self.memory.push(transition);
    }

    fn step(&mut self, total_steps: usize) -> Result<Option<Record>> {
        let record = match total_steps % self.learn_interval {
            0 => Some(self.learn()?),
            _ => None,
        };

        if total_steps % self.target_sync_interval == 0 {
            self.sync_target()?;
        }

        Ok(record)
    }

    fn save_params(&self, path: &Path, checkpoint: bool) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| DqnError::checkpoint_io(path, e))?;

        let file = path.join(QNET_FILE);
        self.qnet
            .save(&file)
            .map_err(|e| DqnError::checkpoint_io(&file, e))?;

        if checkpoint {
            let file = path.join(QNET_TGT_FILE);
            self.qnet_tgt
                .save(&file)
                .map_err(|e| DqnError::checkpoint_io(&file, e))?;
            let file = path.join(OPT_FILE);
            self.opt
                .save(&file)
                .map_err(|e| DqnError::checkpoint_io(&file, e))?;
        }

        Ok(())
    }

    fn load_params(&mut self, path: &Path, checkpoint: bool) -> Result<()> {
        let file = path.join(QNET_FILE);
        self.qnet
            .load(&file)
            .map_err(|e| DqnError::checkpoint_io(&file, e))?;

        if checkpoint {
            let file = path.join(QNET_TGT_FILE);
            self.qnet_tgt
                .load(&file)
                .map_err(|e| DqnError::checkpoint_io(&file, e))?;
            let file = path.join(OPT_FILE);
            self.opt
                .load(&file)
                .map_err(|e| DqnError::checkpoint_io(&file, e))?;
        } else {
            self.sync_target()?;
        }

        info!("Loaded the agent from {:?}", path);
        Ok(())
    }
}
