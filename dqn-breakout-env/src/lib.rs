//! A brick-breaking game for pixel-based reinforcement learning.
//!
//! [`Breakout`] is a small emulator of the classic game: a paddle at the bottom,
//! six rows of bricks and five lives, rendered as a 160x210 RGB frame.
//! [`BreakoutEnv`] wraps it with the preprocessing of
//! [`atari_wrappers.py`](https://github.com/openai/baselines/blob/master/baselines/common/atari_wrappers.py):
//!
//! * action repeat with max pooling of the last two frames,
//! * end of episode at life loss in training mode,
//! * sign-clipped rewards in training mode,
//! * 84x84 grayscale frames, four of which are stacked along the last axis,
//! * the ball served with [`BreakoutAction::Fire`] at the start of every life
//!   (`fire_on_reset`).
//!
//! ```
//! use anyhow::Result;
//! use dqn_breakout_env::{BreakoutAction, BreakoutEnv, BreakoutEnvConfig};
//! use dqn_core::Env as _;
//!
//! fn main() -> Result<()> {
//!     let config = BreakoutEnvConfig::default();
//!     let mut env = BreakoutEnv::build(&config, 42)?;
//!     let _obs = env.reset()?;
//!     let (step, _) = env.step(BreakoutAction::Fire as usize);
//!     assert_eq!(step.obs.frames().len(), 84 * 84 * 4);
//!     Ok(())
//! }
//! ```
mod env;
mod game;
mod obs;
pub use env::{BreakoutEnv, BreakoutEnvConfig, BreakoutInfo};
pub use game::{Breakout, BreakoutAction, HEIGHT, WIDTH};
pub use obs::{BreakoutObs, FRAME_SIZE, N_STACK};
