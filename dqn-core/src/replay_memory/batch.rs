use super::Transition;

/// A minibatch of transitions in columnar layout.
///
/// Row `i` of every column belongs to the same transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch<O> {
    /// Observations.
    pub obs: Vec<O>,

    /// Action indices.
    pub act: Vec<usize>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Next observations.
    pub next_obs: Vec<O>,

    /// Termination flags.
    pub is_done: Vec<bool>,
}

impl<O> TransitionBatch<O> {
    /// Creates an empty batch with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: Vec::with_capacity(capacity),
            act: Vec::with_capacity(capacity),
            reward: Vec::with_capacity(capacity),
            next_obs: Vec::with_capacity(capacity),
            is_done: Vec::with_capacity(capacity),
        }
    }

    /// Appends a transition as a new row.
    pub fn push(&mut self, transition: Transition<O>) {
        self.obs.push(transition.obs);
        self.act.push(transition.act);
        self.reward.push(transition.reward);
        self.next_obs.push(transition.next_obs);
        self.is_done.push(transition.is_done);
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.act.len()
    }

    /// Returns `true` if the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.act.is_empty()
    }

    /// Unpacks the batch into `(obs, act, reward, next_obs, is_done)`.
    pub fn unpack(self) -> (Vec<O>, Vec<usize>, Vec<f32>, Vec<O>, Vec<bool>) {
        (self.obs, self.act, self.reward, self.next_obs, self.is_done)
    }
}

impl<O> FromIterator<Transition<O>> for TransitionBatch<O> {
    fn from_iter<I: IntoIterator<Item = Transition<O>>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut batch = Self::with_capacity(iter.size_hint().0);
        for t in iter {
            batch.push(t);
        }
        batch
    }
}
