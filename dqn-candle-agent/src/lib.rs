//! DQN agent implemented with [candle](https://crates.io/crates/candle-core).
pub mod cnn;
pub mod dqn;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod util;
use anyhow::Result;
use candle_core::Tensor;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Device {
    /// Returns the first CUDA device if available, otherwise the CPU.
    pub fn cuda_if_available() -> Self {
        match candle_core::utils::cuda_is_available() {
            true => Self::Cuda(0),
            false => Self::Cpu,
        }
    }
}

impl TryFrom<Device> for candle_core::Device {
    type Error = anyhow::Error;

    fn try_from(device: Device) -> Result<Self> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}

/// Conversion of an observation into a tensor.
///
/// The agent stacks the tensors of several observations along a new leading
/// dimension to form a batch.
pub trait ObsTensor {
    /// Creates a tensor of the observation on `device`.
    fn to_tensor(&self, device: &candle_core::Device) -> Result<Tensor>;
}

/// Stacks observations into a batch tensor.
pub fn stack_obs<O: ObsTensor>(obs: &[O], device: &candle_core::Device) -> Result<Tensor> {
    let xs = obs
        .iter()
        .map(|o| o.to_tensor(device))
        .collect::<Result<Vec<_>>>()?;
    Ok(Tensor::stack(&xs, 0)?)
}
