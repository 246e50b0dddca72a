use super::{ReplayMemoryConfig, Transition, TransitionBatch};
use crate::error::DqnError;
use anyhow::{bail, Result};
use log::trace;
use rand::{rngs::StdRng, seq::index, SeedableRng};
use std::collections::{vec_deque, VecDeque};

/// A bounded FIFO buffer of transitions with uniform random sampling.
///
/// # Examples
///
/// ```rust
/// use dqn_core::{ReplayMemory, ReplayMemoryConfig, Transition};
///
/// let config = ReplayMemoryConfig::default().capacity(2);
/// let mut memory = ReplayMemory::<u8>::build(&config).unwrap();
///
/// memory.push(Transition::new(0, 0, 0.0, 1, false));
/// memory.push(Transition::new(1, 1, 0.0, 2, false));
/// memory.push(Transition::new(2, 0, 1.0, 3, true));
///
/// // The oldest transition was evicted.
/// assert_eq!(memory.len(), 2);
/// assert_eq!(memory.iter().next().unwrap().obs, 1);
///
/// let batch = memory.sample(2).unwrap();
/// assert_eq!(batch.len(), 2);
/// ```
pub struct ReplayMemory<O> {
    capacity: usize,
    buffer: VecDeque<Transition<O>>,
    rng: StdRng,
}

impl<O: Clone> ReplayMemory<O> {
    /// Builds an empty replay memory.
    ///
    /// Fails if the capacity is zero.
    pub fn build(config: &ReplayMemoryConfig) -> Result<Self> {
        if config.capacity == 0 {
            bail!("The capacity of the replay memory must be positive");
        }

        Ok(Self {
            capacity: config.capacity,
            buffer: VecDeque::with_capacity(config.capacity),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Appends a transition, evicting the oldest one when the memory is full.
    pub fn push(&mut self, transition: Transition<O>) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Samples `batch_size` distinct transitions uniformly at random.
    ///
    /// The transitions stay in the memory. Fails with
    /// [`DqnError::InsufficientData`] if fewer than `batch_size` are stored.
    pub fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch<O>> {
        let available = self.buffer.len();
        if batch_size > available {
            return Err(DqnError::InsufficientData {
                requested: batch_size,
                available,
            }
            .into());
        }

        trace!("Sample {} of {} transitions", batch_size, available);
        let ixs = index::sample(&mut self.rng, available, batch_size);
        Ok(ixs.into_iter().map(|i| self.buffer[i].clone()).collect())
    }

    /// Returns the number of stored transitions.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the maximum number of stored transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over stored transitions from the oldest to the newest.
    pub fn iter(&self) -> vec_deque::Iter<'_, Transition<O>> {
        self.buffer.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn transition(i: usize) -> Transition<usize> {
        Transition::new(i, i % 4, i as f32, i + 1, i % 3 == 0)
    }

    fn memory(capacity: usize) -> ReplayMemory<usize> {
        let config = ReplayMemoryConfig::default().capacity(capacity).seed(0);
        ReplayMemory::build(&config).unwrap()
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let config = ReplayMemoryConfig::default().capacity(0);
        assert!(ReplayMemory::<usize>::build(&config).is_err());
    }

    #[test]
    fn test_len_never_exceeds_capacity() {
        let mut memory = memory(5);
        for i in 0..12 {
            memory.push(transition(i));
            assert_eq!(memory.len(), (i + 1).min(5));
        }
    }

    #[test]
    fn test_fifo_eviction() {
        let mut memory = memory(4);
        for i in 1..=7 {
            memory.push(transition(i));
        }

        let stored = memory.iter().map(|t| t.obs).collect::<Vec<_>>();
        assert_eq!(stored, vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_fifth_push_evicts_first() {
        let mut memory = memory(4);
        for i in 1..=5 {
            memory.push(transition(i));
        }

        assert_eq!(memory.len(), 4);
        assert!(memory.iter().all(|t| t.obs != 1));
    }

    #[test]
    fn test_sample_is_distinct_and_row_aligned() -> Result<()> {
        let mut memory = memory(100);
        for i in 0..50 {
            memory.push(transition(i));
        }

        for _ in 0..20 {
            let batch = memory.sample(32)?;
            assert_eq!(batch.len(), 32);

            let (obs, act, reward, next_obs, is_done) = batch.unpack();
            let unique = obs.iter().collect::<HashSet<_>>();
            assert_eq!(unique.len(), 32);

            for i in 0..32 {
                let t = transition(obs[i]);
                assert_eq!(act[i], t.act);
                assert_eq!(reward[i], t.reward);
                assert_eq!(next_obs[i], t.next_obs);
                assert_eq!(is_done[i], t.is_done);
            }
        }

        // Sampling does not remove elements.
        assert_eq!(memory.len(), 50);
        Ok(())
    }

    #[test]
    fn test_sample_whole_memory() -> Result<()> {
        let mut memory = memory(10);
        for i in 0..10 {
            memory.push(transition(i));
        }

        let mut obs = memory.sample(10)?.obs;
        obs.sort();
        assert_eq!(obs, (0..10).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_insufficient_data() {
        let mut memory = memory(10);
        for i in 0..3 {
            memory.push(transition(i));
        }

        let err = memory.sample(4).unwrap_err();
        match err.downcast_ref::<DqnError>() {
            Some(DqnError::InsufficientData {
                requested,
                available,
            }) => {
                assert_eq!(*requested, 4);
                assert_eq!(*available, 3);
            }
            _ => panic!("unexpected error: {:?}", err),
        }
    }

    #[test]
    fn test_stored_transition_is_independent_of_source() {
        let mut memory = ReplayMemory::<Vec<u8>>::build(&ReplayMemoryConfig::default()).unwrap();
        let mut obs = vec![1u8, 2, 3];
        memory.push(Transition::new(obs.clone(), 0, 0.0, obs.clone(), false));
        obs[0] = 9;

        assert_eq!(memory.iter().next().unwrap().obs, vec![1, 2, 3]);
    }
}
