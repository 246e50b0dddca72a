use crate::{
    model::SubModel,
    util::{hard_update, OutDim},
};
use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

/// Action-value network with its own [`VarMap`].
///
/// The behavior and the target networks of [`Dqn`](super::Dqn) are two
/// instances built from the same configuration.
pub struct DqnModel<Q>
where
    Q: SubModel<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    varmap: VarMap,

    // Action-value function
    q: Q,
}

impl<Q> DqnModel<Q>
where
    Q: SubModel<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`DqnModel`] with freshly initialized parameters.
    pub fn build(q_config: Option<Q::Config>, device: Device) -> Result<Self> {
        let q_config = q_config.context("model_config is not set.")?;
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            Q::build(vb, q_config)?
        };

        Ok(Self { varmap, q })
    }

    /// Outputs the action-values of a batch of observations.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        self.q.forward(obs)
    }

    /// Returns the trainable variables with their names, sorted by name.
    pub fn parameters(&self) -> Result<Vec<(String, Var)>> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|_| anyhow!("Failed to lock the variables"))?;
        let mut vars = data
            .iter()
            .map(|(name, var)| (name.clone(), var.clone()))
            .collect::<Vec<_>>();
        vars.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(vars)
    }

    /// Returns the trainable variables sorted by name.
    pub fn vars(&self) -> Result<Vec<Var>> {
        Ok(self.parameters()?.into_iter().map(|(_, v)| v).collect())
    }

    /// Copies the parameter values of `src` into this network.
    pub fn load_parameters_from(&mut self, src: &Self) -> Result<()> {
        hard_update(&self.varmap, &src.varmap)
    }

    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save dqnmodel to {:?}", path.as_ref());
        Ok(())
    }

    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load dqnmodel from {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::{Mlp, MlpConfig};

    fn model() -> Result<DqnModel<Mlp>> {
        DqnModel::<Mlp>::build(Some(MlpConfig::new(3, vec![8], 2, false)), Device::Cpu)
    }

    #[test]
    fn test_build_requires_model_config() {
        assert!(DqnModel::<Mlp>::build(None, Device::Cpu).is_err());
    }

    #[test]
    fn test_load_parameters_from() -> Result<()> {
        let src = model()?;
        let mut dest = model()?;
        let xs = Tensor::new(&[[0.5f32, -1.0, 2.0]], &Device::Cpu)?;

        dest.load_parameters_from(&src)?;
        assert_eq!(
            dest.forward(&xs)?.to_vec2::<f32>()?,
            src.forward(&xs)?.to_vec2::<f32>()?
        );

        // Parameters are copied, not shared.
        for (_, var) in src.parameters()? {
            var.set(&var.as_tensor().zeros_like()?)?;
        }
        assert_ne!(
            dest.forward(&xs)?.to_vec2::<f32>()?,
            src.forward(&xs)?.to_vec2::<f32>()?
        );
        Ok(())
    }
}
