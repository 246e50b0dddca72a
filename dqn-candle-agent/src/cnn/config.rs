use crate::util::OutDim;
use serde::{Deserialize, Serialize};

fn default_frame_size() -> i64 {
    84
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Cnn`](super::Cnn).
pub struct CnnConfig {
    /// The number of stacked frames, the channels of the input.
    pub n_stack: i64,

    /// The number of actions.
    pub out_dim: i64,

    /// Height of a frame.
    #[serde(default = "default_frame_size")]
    pub height: i64,

    /// Width of a frame.
    #[serde(default = "default_frame_size")]
    pub width: i64,
}

impl CnnConfig {
    /// Constructs [`CnnConfig`] for 84x84 frames.
    pub fn new(n_stack: i64, out_dim: i64) -> Self {
        Self {
            n_stack,
            out_dim,
            height: default_frame_size(),
            width: default_frame_size(),
        }
    }

    /// Sets the frame size.
    pub fn frame_size(mut self, height: i64, width: i64) -> Self {
        self.height = height;
        self.width = width;
        self
    }

    /// Returns the number of features after the convolutional layers.
    pub(super) fn flattened_dim(&self) -> i64 {
        let out = |x: i64, kernel: i64, stride: i64| (x - kernel) / stride + 1;
        let h = out(out(out(self.height, 8, 4), 4, 2), 3, 1);
        let w = out(out(out(self.width, 8, 4), 4, 2), 3, 1);
        64 * h * w
    }
}

impl OutDim for CnnConfig {
    fn get_out_dim(&self) -> i64 {
        self.out_dim
    }

    fn set_out_dim(&mut self, v: i64) {
        self.out_dim = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattened_dim() {
        assert_eq!(CnnConfig::new(4, 4).flattened_dim(), 3136);
        assert_eq!(CnnConfig::new(4, 4).frame_size(36, 36).flattened_dim(), 64);
    }
}
