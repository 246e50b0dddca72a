use super::CnnConfig;
use crate::model::SubModel;
use anyhow::{bail, Result};
use candle_core::{DType::F32, Device, Tensor};
use candle_nn::{
    conv::Conv2dConfig,
    sequential::{seq, Sequential},
    Conv2d, Init, Linear, Module, VarBuilder,
};

/// He initialization in fan-out mode for layers followed by ReLU.
fn kaiming_normal(fan_out: usize) -> Init {
    Init::Randn {
        mean: 0.0,
        stdev: (2.0 / fan_out as f64).sqrt(),
    }
}

// Conv2d with He-initialized weights and zero biases.
fn conv2d(
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    config: Conv2dConfig,
    vb: VarBuilder,
) -> Result<Conv2d> {
    let ws = vb.get_with_hints(
        (out_channels, in_channels, kernel_size, kernel_size),
        "weight",
        kaiming_normal(out_channels * kernel_size * kernel_size),
    )?;
    let bs = vb.get_with_hints(out_channels, "bias", Init::Const(0.0))?;
    Ok(Conv2d::new(ws, Some(bs), config))
}

// Linear layer with He-initialized weights and zero biases.
fn linear(in_dim: usize, out_dim: usize, vb: VarBuilder) -> Result<Linear> {
    let ws = vb.get_with_hints((out_dim, in_dim), "weight", kaiming_normal(out_dim))?;
    let bs = vb.get_with_hints(out_dim, "bias", Init::Const(0.0))?;
    Ok(Linear::new(ws, Some(bs)))
}

#[allow(clippy::upper_case_acronyms)]
/// Convolutional neural network, which has the same architecture of the DQN paper.
///
/// The input is a batch of stacked frames `[N, H, W, n_stack]` of byte
/// intensities. It is moved to channels-first order and scaled to `[0, 1]`
/// inside the network.
pub struct Cnn {
    n_stack: i64,
    device: Device,
    seq: Sequential,
}

impl Cnn {
    fn stride(s: i64) -> Conv2dConfig {
        Conv2dConfig {
            stride: s as _,
            ..Default::default()
        }
    }

    fn create_net(vb: &VarBuilder, config: &CnnConfig) -> Result<Sequential> {
        let seq = seq()
            .add_fn(|xs| {
                xs.to_dtype(F32)?
                    .permute((0, 3, 1, 2))?
                    .contiguous()?
                    .affine(1.0 / 255.0, 0.0)
            })
            .add(conv2d(
                config.n_stack as _,
                32,
                8,
                Self::stride(4),
                vb.pp("c1"),
            )?)
            .add_fn(|xs| xs.relu())
            .add(conv2d(32, 64, 4, Self::stride(2), vb.pp("c2"))?)
            .add_fn(|xs| xs.relu())
            .add(conv2d(64, 64, 3, Self::stride(1), vb.pp("c3"))?)
            .add_fn(|xs| xs.relu()?.flatten_from(1))
            .add(linear(config.flattened_dim() as _, 512, vb.pp("l1"))?)
            .add_fn(|xs| xs.relu())
            .add(linear(512, config.out_dim as _, vb.pp("l2"))?);

        Ok(seq)
    }
}

impl SubModel for Cnn {
    type Config = CnnConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        if xs.rank() != 4 || xs.dims()[3] != self.n_stack as usize {
            bail!(
                "Expected input of shape [N, H, W, {}], got {:?}",
                self.n_stack,
                xs.dims()
            );
        }
        Ok(self.seq.forward(&xs.to_device(&self.device)?)?)
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vb.device().clone();
        let seq = Self::create_net(&vb, &config)?;

        Ok(Self {
            n_stack: config.n_stack,
            device,
            seq,
        })
    }
}
