//! Optimizers.
use anyhow::{anyhow, Context, Result};
use candle_core::{backprop::GradStore, safetensors, DType, Device, Tensor, Var};
use log::info;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};

/// Configuration of optimizer for training neural networks in an RL agent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
        #[serde(default = "default_beta1")]
        /// Decay rate of the first moment.
        beta1: f64,
        #[serde(default = "default_beta2")]
        /// Decay rate of the second moment.
        beta2: f64,
        #[serde(default = "default_eps")]
        /// Term added to the denominator.
        eps: f64,
    },
}

fn default_beta1() -> f64 {
    0.9
}

fn default_beta2() -> f64 {
    0.999
}

fn default_eps() -> f64 {
    1.5e-4
}

impl OptimizerConfig {
    /// Constructs the optimizer over named variables.
    pub fn build(&self, vars: Vec<(String, Var)>) -> Result<Adam> {
        match &self {
            OptimizerConfig::Adam {
                lr,
                beta1,
                beta2,
                eps,
            } => {
                let params = ParamsAdam {
                    lr: *lr,
                    beta1: *beta1,
                    beta2: *beta2,
                    eps: *eps,
                };
                Adam::new(vars, params)
            }
        }
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::Adam {
                lr: _,
                beta1,
                beta2,
                eps,
            } => Self::Adam {
                lr,
                beta1,
                beta2,
                eps,
            },
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam {
            lr: 0.0000625,
            beta1: default_beta1(),
            beta2: default_beta2(),
            eps: default_eps(),
        }
    }
}

/// Parameters of [`Adam`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamsAdam {
    /// Learning rate.
    pub lr: f64,

    /// Decay rate of the first moment.
    pub beta1: f64,

    /// Decay rate of the second moment.
    pub beta2: f64,

    /// Term added to the denominator.
    pub eps: f64,
}

/// Adam optimizer whose moment estimates can be saved and restored.
///
/// Variables are identified by name, so the state of one agent can be loaded
/// into another agent built from the same model configuration.
pub struct Adam {
    vars: Vec<(String, Var)>,
    first_moments: Vec<Tensor>,
    second_moments: Vec<Tensor>,
    step_t: usize,
    params: ParamsAdam,
}

impl Adam {
    /// Creates the optimizer with zero moments.
    pub fn new(vars: Vec<(String, Var)>, params: ParamsAdam) -> Result<Self> {
        let vars = vars
            .into_iter()
            .filter(|(_, var)| var.dtype().is_float())
            .collect::<Vec<_>>();
        let first_moments = vars
            .iter()
            .map(|(_, var)| var.as_tensor().zeros_like())
            .collect::<candle_core::Result<Vec<_>>>()?;
        let second_moments = vars
            .iter()
            .map(|(_, var)| var.as_tensor().zeros_like())
            .collect::<candle_core::Result<Vec<_>>>()?;

        Ok(Self {
            vars,
            first_moments,
            second_moments,
            step_t: 0,
            params,
        })
    }

    /// Returns the number of steps taken.
    pub fn step_count(&self) -> usize {
        self.step_t
    }

    /// Updates the variables with the given gradients.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        self.step_t += 1;
        let ParamsAdam {
            lr,
            beta1,
            beta2,
            eps,
        } = self.params;
        let scale_m = 1f64 / (1f64 - beta1.powi(self.step_t as i32));
        let scale_v = 1f64 / (1f64 - beta2.powi(self.step_t as i32));

        for (((_, var), m), v) in self
            .vars
            .iter()
            .zip(self.first_moments.iter_mut())
            .zip(self.second_moments.iter_mut())
        {
            let theta = var.as_tensor();
            if let Some(g) = grads.get(theta) {
                let next_m = ((&*m * beta1)? + (g * (1.0 - beta1))?)?;
                let next_v = ((&*v * beta2)? + (g.sqr()? * (1.0 - beta2))?)?;
                let m_hat = (&next_m * scale_m)?;
                let v_hat = (&next_v * scale_v)?;
                let delta = (m_hat * lr)?.div(&(v_hat.sqrt()? + eps)?)?;
                var.set(&theta.sub(&delta)?)?;
                *m = next_m;
                *v = next_v;
            }
        }

        Ok(())
    }

    /// Saves the moments and the step count as safetensors.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let mut tensors = HashMap::new();
        for (((name, _), m), v) in self
            .vars
            .iter()
            .zip(self.first_moments.iter())
            .zip(self.second_moments.iter())
        {
            tensors.insert(format!("m.{}", name), m.clone());
            tensors.insert(format!("v.{}", name), v.clone());
        }
        tensors.insert(
            "step".to_string(),
            Tensor::new(&[self.step_t as u32], &Device::Cpu)?,
        );
        safetensors::save(&tensors, path.as_ref())?;
        info!("Save optimizer state to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the moments and the step count saved with [`Adam::save`].
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        let mut tensors = safetensors::load(path.as_ref(), &Device::Cpu)?;

        for (((name, var), m), v) in self
            .vars
            .iter()
            .zip(self.first_moments.iter_mut())
            .zip(self.second_moments.iter_mut())
        {
            let mut take = |key: String| -> Result<Tensor> {
                let t = tensors
                    .remove(&key)
                    .with_context(|| format!("{} is missing in the optimizer state", key))?;
                if t.dims() != var.dims() {
                    return Err(anyhow!(
                        "Shape mismatch of {}: {:?} != {:?}",
                        key,
                        t.dims(),
                        var.dims()
                    ));
                }
                Ok(t.to_dtype(var.dtype())?.to_device(var.device())?)
            };
            *m = take(format!("m.{}", name))?;
            *v = take(format!("v.{}", name))?;
        }

        let step = tensors
            .get("step")
            .context("step is missing in the optimizer state")?
            .to_dtype(DType::U32)?
            .to_vec1::<u32>()?;
        self.step_t = *step.first().context("step is empty")? as usize;
        info!("Load optimizer state from {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn quadratic_loss(x: &Var) -> Result<Tensor> {
        // (x - 3)^2 summed
        Ok(x.as_tensor().affine(1.0, -3.0)?.sqr()?.sum_all()?)
    }

    #[test]
    fn test_adam_minimizes_quadratic() -> Result<()> {
        let x = Var::from_slice(&[0f32, 10.0], (2,), &Device::Cpu)?;
        let config = OptimizerConfig::default().learning_rate(0.1);
        let mut opt = config.build(vec![("x".to_string(), x.clone())])?;
        let loss0 = quadratic_loss(&x)?.to_scalar::<f32>()?;

        for _ in 0..200 {
            let grads = quadratic_loss(&x)?.backward()?;
            opt.step(&grads)?;
        }

        let loss = quadratic_loss(&x)?.to_scalar::<f32>()?;
        assert!(loss < loss0 * 0.01);
        assert_eq!(opt.step_count(), 200);
        Ok(())
    }

    #[test]
    fn test_first_step_moves_by_lr() -> Result<()> {
        // With bias correction, the first update is lr * g / (|g| + eps).
        let x = Var::from_slice(&[1f32], (1,), &Device::Cpu)?;
        let mut opt = OptimizerConfig::default()
            .learning_rate(0.01)
            .build(vec![("x".to_string(), x.clone())])?;
        let grads = quadratic_loss(&x)?.backward()?;
        opt.step(&grads)?;

        let x1 = x.as_tensor().to_vec1::<f32>()?[0];
        assert!((x1 - 1.01).abs() < 1e-4);
        Ok(())
    }

    #[test]
    fn test_save_and_load_state() -> Result<()> {
        let dir = TempDir::new("adam_state")?;
        let path = dir.path().join("opt.safetensors");
        let x = Var::from_slice(&[0f32, 10.0], (2,), &Device::Cpu)?;
        let mut opt = OptimizerConfig::default().build(vec![("x".to_string(), x.clone())])?;
        for _ in 0..3 {
            let grads = quadratic_loss(&x)?.backward()?;
            opt.step(&grads)?;
        }
        opt.save(&path)?;

        let y = Var::from_slice(&[0f32, 10.0], (2,), &Device::Cpu)?;
        let mut opt2 = OptimizerConfig::default().build(vec![("x".to_string(), y)])?;
        opt2.load(&path)?;

        assert_eq!(opt2.step_count(), 3);
        assert_eq!(
            opt2.first_moments[0].to_vec1::<f32>()?,
            opt.first_moments[0].to_vec1::<f32>()?
        );
        assert_eq!(
            opt2.second_moments[0].to_vec1::<f32>()?,
            opt.second_moments[0].to_vec1::<f32>()?
        );
        Ok(())
    }

    #[test]
    fn test_load_rejects_other_variables() -> Result<()> {
        let dir = TempDir::new("adam_state_mismatch")?;
        let path = dir.path().join("opt.safetensors");
        let x = Var::from_slice(&[0f32, 10.0], (2,), &Device::Cpu)?;
        OptimizerConfig::default()
            .build(vec![("x".to_string(), x)])?
            .save(&path)?;

        let y = Var::from_slice(&[0f32], (1,), &Device::Cpu)?;
        let mut opt = OptimizerConfig::default().build(vec![("y".to_string(), y)])?;
        assert!(opt.load(&path).is_err());
        Ok(())
    }
}
