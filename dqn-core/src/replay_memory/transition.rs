/// One environment step `(o_t, a_t, r_t, o_t+1, done_t+1)`.
///
/// Observations are owned, so mutating the source observation after the push
/// cannot alter stored history.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<O> {
    /// Observation before the action.
    pub obs: O,

    /// Index of the action taken.
    pub act: usize,

    /// Reward, as emitted by the environment.
    pub reward: f32,

    /// Observation after the action.
    pub next_obs: O,

    /// `true` if the episode terminated with this step.
    pub is_done: bool,
}

impl<O> Transition<O> {
    /// Constructs a transition.
    pub fn new(obs: O, act: usize, reward: f32, next_obs: O, is_done: bool) -> Self {
        Self {
            obs,
            act,
            reward,
            next_obs,
            is_done,
        }
    }
}
