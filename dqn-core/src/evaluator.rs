//! Evaluate a [`Policy`].
use crate::{Env, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluate a [`Policy`].
pub trait Evaluator<E: Env> {
    /// Runs the policy and returns its score.
    ///
    /// Evaluation must not change the policy: no transitions are stored and no
    /// learning or exploration decay happens.
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<f32>;
}
