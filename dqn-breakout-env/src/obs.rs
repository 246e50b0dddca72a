//! Observation of [`BreakoutEnv`](crate::BreakoutEnv).
use dqn_core::Obs;

/// Height and width of a preprocessed frame.
pub const FRAME_SIZE: usize = 84;

/// The number of stacked frames.
pub const N_STACK: usize = 4;

/// The last [`N_STACK`] grayscale frames, laid out as `[height, width, frame]`.
///
/// The last channel is the most recent frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutObs {
    // FRAME_SIZE * FRAME_SIZE * N_STACK
    frames: Vec<u8>,
}

impl BreakoutObs {
    /// Returns the raw bytes.
    pub fn frames(&self) -> &[u8] {
        &self.frames
    }

    /// Returns the `i`-th stacked frame, where `N_STACK - 1` is the most recent.
    pub fn frame(&self, i: usize) -> Vec<u8> {
        self.frames.iter().skip(i).step_by(N_STACK).cloned().collect()
    }
}

impl From<Vec<u8>> for BreakoutObs {
    fn from(frames: Vec<u8>) -> Self {
        Self { frames }
    }
}

impl Obs for BreakoutObs {}

#[cfg(feature = "candle")]
impl dqn_candle_agent::ObsTensor for BreakoutObs {
    fn to_tensor(&self, device: &candle_core::Device) -> anyhow::Result<candle_core::Tensor> {
        let shape = (FRAME_SIZE, FRAME_SIZE, N_STACK);
        Ok(candle_core::Tensor::from_slice(&self.frames, shape, device)?)
    }
}
