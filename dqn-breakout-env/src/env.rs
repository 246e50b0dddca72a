mod config;
use super::{
    game::{Breakout, BreakoutAction, HEIGHT, WIDTH},
    obs::{BreakoutObs, FRAME_SIZE, N_STACK},
};
use anyhow::Result;
pub use config::BreakoutEnvConfig;
use dqn_core::{record::Record, ActionSpace, Env, Info, Step};
use image::{
    imageops::{grayscale, resize, FilterType::Triangle},
    Rgb, RgbImage,
};
use log::warn;

/// Lives left after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakoutInfo {
    /// Remaining lives.
    pub lives: usize,
}

impl Info for BreakoutInfo {}

/// [`Breakout`] with the DeepMind preprocessing.
///
/// Preprocessing is the same in the link:
/// https://stable-baselines3.readthedocs.io/en/master/common/atari_wrappers.html#stable_baselines3.common.atari_wrappers.AtariWrapper.
pub struct BreakoutEnv {
    // True for training mode, it affects preprocessing at every steps.
    train: bool,

    frame_skip: usize,

    max_episode_steps: Option<usize>,

    fire_on_reset: bool,

    game: Breakout,

    seed: u64,

    // Observation buffer for frame skipping
    obs_buffer: [Vec<u8>; 2],

    // Lives in the game
    lives: usize,

    // If the game was over at the last step.
    was_real_done: bool,

    // Buffer for stacking frames
    frames: Vec<u8>,

    n_steps: usize,
}

impl BreakoutEnv {
    /// Returns the underlying game.
    pub fn game(&self) -> &Breakout {
        &self.game
    }

    fn render(&self) -> Vec<u8> {
        let mut obs = vec![0u8; WIDTH * HEIGHT * 3];
        self.game.render_rgb24(&mut obs);
        obs
    }

    fn episodic_life_env_step(&mut self, a: BreakoutAction) -> (f32, bool) {
        let mut reward = self.game.act(a) as f32;
        let mut done = self.game.is_game_over();
        self.was_real_done = done;
        let lives = self.game.lives();

        if lives < self.lives && lives > 0 {
            if self.train {
                done = true;
            } else if self.fire_on_reset {
                // The next life of the full game starts in play.
                reward += self.game.act(BreakoutAction::Fire) as f32;
            }
        }
        self.lives = lives;

        (reward, done)
    }

    fn skip_and_max(&mut self, a: BreakoutAction) -> (Vec<u8>, f32, bool) {
        let mut total_reward = 0f32;
        let mut done = false;

        for _ in 0..self.frame_skip.max(1) {
            let (reward, done_) = self.episodic_life_env_step(a);
            total_reward += reward;
            done = done_;
            self.obs_buffer.swap(0, 1);
            self.obs_buffer[1] = self.render();
            if done {
                break;
            }
        }

        // Max pooling
        let obs = self.obs_buffer[0]
            .iter()
            .zip(self.obs_buffer[1].iter())
            .map(|(&a, &b)| a.max(b))
            .collect::<Vec<_>>();

        (obs, total_reward, done)
    }

    fn clip_reward(&self, r: f32) -> f32 {
        match self.train {
            false => r,
            true if r > 0.0 => 1.0,
            true if r < 0.0 => -1.0,
            true => 0.0,
        }
    }

    fn warp_and_grayscale(obs: &[u8]) -> Vec<u8> {
        let img = RgbImage::from_fn(WIDTH as u32, HEIGHT as u32, |x, y| {
            let i = (y as usize * WIDTH + x as usize) * 3;
            Rgb([obs[i], obs[i + 1], obs[i + 2]])
        });
        let img = grayscale(&img);
        let img = resize(&img, FRAME_SIZE as u32, FRAME_SIZE as u32, Triangle);
        img.into_raw()
    }

    fn stack_frame(&mut self, frame: &[u8]) {
        for (px, &v) in self.frames.chunks_exact_mut(N_STACK).zip(frame.iter()) {
            px.copy_within(1.., 0);
            px[N_STACK - 1] = v;
        }
    }
}

impl Env for BreakoutEnv {
    type Config = BreakoutEnvConfig;
    type Obs = BreakoutObs;
    type Info = BreakoutInfo;

    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized,
    {
        let seed = seed as u64;
        Ok(Self {
            train: config.train,
            frame_skip: config.frame_skip,
            max_episode_steps: config.max_episode_steps,
            fire_on_reset: config.fire_on_reset,
            game: Breakout::new(seed),
            seed,
            obs_buffer: [vec![], vec![]],
            lives: 0,
            was_real_done: true,
            frames: vec![0; FRAME_SIZE * FRAME_SIZE * N_STACK],
            n_steps: 0,
        })
    }

    /// Starts a new game, or only a new life after a life loss in training mode.
    ///
    /// With `fire_on_reset`, the ball is in play in the returned observation.
    fn reset(&mut self) -> Result<Self::Obs> {
        if self.was_real_done {
            self.game.reset();
        } else {
            // no-op step to advance from lost life state
            self.game.act(BreakoutAction::Noop);
        }
        if self.fire_on_reset {
            self.game.act(BreakoutAction::Fire);
        }

        self.was_real_done = false;
        self.lives = self.game.lives();
        self.n_steps = 0;

        let obs = self.render();
        let frame = Self::warp_and_grayscale(&obs);
        self.obs_buffer = [obs.clone(), obs];

        for (px, &v) in self.frames.chunks_exact_mut(N_STACK).zip(frame.iter()) {
            px.iter_mut().for_each(|p| *p = v);
        }

        Ok(self.frames.clone().into())
    }

    /// Starts a new game whose serves are determined by `ix`.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.game.reseed(self.seed.wrapping_add(ix as u64));
        self.was_real_done = true;
        self.reset()
    }

    fn step(&mut self, act: usize) -> (Step<Self>, Record)
    where
        Self: Sized,
    {
        let a = BreakoutAction::from_index(act).unwrap_or_else(|| {
            warn!("Invalid action {}, taking NOOP", act);
            BreakoutAction::Noop
        });
        let (obs, reward, is_terminated) = self.skip_and_max(a);
        let frame = Self::warp_and_grayscale(&obs);
        let reward = self.clip_reward(reward);
        self.stack_frame(&frame);

        self.n_steps += 1;
        let is_truncated = !is_terminated
            && self
                .max_episode_steps
                .map_or(false, |max| self.n_steps >= max);
        if is_truncated {
            self.was_real_done = true;
        }

        let step = Step::new(
            self.frames.clone().into(),
            act,
            reward,
            is_terminated,
            is_truncated,
            BreakoutInfo { lives: self.lives },
        );

        (step, Record::empty())
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(BreakoutAction::COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    // Moves the paddle away from the ball until a life is lost.
    fn lose_ball(env: &mut BreakoutEnv) -> Step<BreakoutEnv> {
        let lives = env.game().lives();
        let (mut step, _) = env.step(BreakoutAction::Fire as usize);
        for _ in 0..10_000 {
            if step.is_done() || step.info.lives < lives {
                break;
            }
            let act = match env.game().ball_position() {
                Some((x, _)) if x < WIDTH as f32 / 2.0 => BreakoutAction::Right,
                Some(_) => BreakoutAction::Left,
                None => BreakoutAction::Noop,
            };
            step = env.step(act as usize).0;
        }
        step
    }

    #[test]
    fn test_reset_stacks_identical_frames() -> Result<()> {
        let mut env = BreakoutEnv::build(&BreakoutEnvConfig::default(), 0)?;
        let obs = env.reset()?;
        assert_eq!(obs.frames().len(), FRAME_SIZE * FRAME_SIZE * N_STACK);

        let first = obs.frame(0);
        assert_eq!(first.len(), FRAME_SIZE * FRAME_SIZE);
        for i in 1..N_STACK {
            assert_eq!(obs.frame(i), first);
        }
        assert!(first.iter().any(|&v| v > 0));
        Ok(())
    }

    #[test]
    fn test_step_shifts_frames() -> Result<()> {
        let mut env = BreakoutEnv::build(&BreakoutEnvConfig::default(), 0)?;
        let obs0 = env.reset()?;
        let (step1, _) = env.step(BreakoutAction::Fire as usize);
        let (step2, _) = env.step(BreakoutAction::Noop as usize);

        assert_eq!(step1.obs.frame(N_STACK - 2), obs0.frame(N_STACK - 1));
        assert_eq!(step2.obs.frame(N_STACK - 2), step1.obs.frame(N_STACK - 1));
        // The ball moved between the two steps.
        assert_ne!(step2.obs.frame(N_STACK - 1), step1.obs.frame(N_STACK - 1));
        Ok(())
    }

    #[test]
    fn test_episodic_life_in_training() -> Result<()> {
        let mut env = BreakoutEnv::build(&BreakoutEnvConfig::default(), 1)?;
        env.reset()?;
        let step = lose_ball(&mut env);

        assert!(step.is_terminated);
        assert_eq!(step.info.lives, 4);
        assert!(!env.game().is_game_over());

        // The next reset keeps the game going.
        env.reset()?;
        assert_eq!(env.game().lives(), 4);
        Ok(())
    }

    #[test]
    fn test_full_game_in_evaluation() -> Result<()> {
        let config = BreakoutEnvConfig::default().eval();
        let mut env = BreakoutEnv::build(&config, 1)?;
        env.reset()?;

        for lives in (0..5).rev() {
            let step = lose_ball(&mut env);
            assert_eq!(step.info.lives, lives);
            assert_eq!(step.is_terminated, lives == 0);
        }

        env.reset()?;
        assert_eq!(env.game().lives(), 5);
        Ok(())
    }

    #[test]
    fn test_reward_clipping() -> Result<()> {
        let env = BreakoutEnv::build(&BreakoutEnvConfig::default(), 0)?;
        assert_eq!(env.clip_reward(7.0), 1.0);
        assert_eq!(env.clip_reward(0.0), 0.0);
        assert_eq!(env.clip_reward(-3.0), -1.0);

        let env = BreakoutEnv::build(&BreakoutEnvConfig::default().eval(), 0)?;
        assert_eq!(env.clip_reward(7.0), 7.0);
        Ok(())
    }

    #[test]
    fn test_truncation() -> Result<()> {
        let config = BreakoutEnvConfig::default().max_episode_steps(Some(3));
        let mut env = BreakoutEnv::build(&config, 0)?;
        env.reset()?;

        let (step, _) = env.step(BreakoutAction::Noop as usize);
        assert!(!step.is_done());
        env.step(BreakoutAction::Noop as usize);
        let (step, _) = env.step(BreakoutAction::Noop as usize);
        assert!(step.is_truncated);
        assert!(!step.is_terminated);
        Ok(())
    }

    #[test]
    fn test_same_seed_same_episode() -> Result<()> {
        let config = BreakoutEnvConfig::default();
        let mut env1 = BreakoutEnv::build(&config, 3)?;
        let mut env2 = BreakoutEnv::build(&config, 3)?;
        env1.reset()?;
        env2.reset()?;

        for act in [1, 2, 2, 0, 3, 3, 0, 0] {
            let (s1, _) = env1.step(act);
            let (s2, _) = env2.step(act);
            assert_eq!(s1.obs, s2.obs);
            assert_eq!(s1.reward, s2.reward);
        }
        Ok(())
    }

    #[test]
    fn test_reset_with_index_is_reproducible() -> Result<()> {
        let config = BreakoutEnvConfig::default().eval();
        let mut env = BreakoutEnv::build(&config, 3)?;

        env.reset_with_index(2)?;
        let (s1, _) = env.step(BreakoutAction::Fire as usize);
        env.reset_with_index(2)?;
        let (s2, _) = env.step(BreakoutAction::Fire as usize);
        assert_eq!(s1.obs, s2.obs);
        Ok(())
    }

    #[test]
    fn test_ball_in_play_after_evaluation_reset() -> Result<()> {
        let config = BreakoutEnvConfig::default().eval();
        let mut env = BreakoutEnv::build(&config, 0)?;
        env.reset_with_index(0)?;
        assert!(env.game().ball_position().is_some());

        // Only paddle moves: a lost ball is served again without FIRE.
        let lives = env.game().lives();
        for _ in 0..1_000 {
            if env.game().lives() < lives {
                break;
            }
            let act = match env.game().ball_position() {
                Some((x, _)) if x < WIDTH as f32 / 2.0 => BreakoutAction::Right,
                _ => BreakoutAction::Left,
            };
            let (step, _) = env.step(act as usize);
            assert!(!step.is_done());
        }
        assert_eq!(env.game().lives(), lives - 1);
        assert!(env.game().ball_position().is_some());
        Ok(())
    }

    #[test]
    fn test_ball_in_play_after_training_reset() -> Result<()> {
        let mut env = BreakoutEnv::build(&BreakoutEnvConfig::default(), 1)?;
        env.reset()?;
        assert!(env.game().ball_position().is_some());

        let step = lose_ball(&mut env);
        assert!(step.is_terminated);
        env.reset()?;
        assert!(env.game().ball_position().is_some());
        Ok(())
    }

    #[test]
    fn test_no_serve_without_fire_on_reset() -> Result<()> {
        let config = BreakoutEnvConfig::default().fire_on_reset(false);
        let mut env = BreakoutEnv::build(&config, 0)?;
        env.reset()?;
        assert!(env.game().ball_position().is_none());
        Ok(())
    }

    #[test]
    fn test_invalid_action_is_noop() -> Result<()> {
        let config = BreakoutEnvConfig::default().fire_on_reset(false);
        let mut env = BreakoutEnv::build(&config, 0)?;
        env.reset()?;
        let x = env.game().paddle_x();
        let (step, _) = env.step(9);
        assert_eq!(step.act, 9);
        assert_eq!(env.game().paddle_x(), x);
        assert!(env.game().ball_position().is_none());
        Ok(())
    }

    #[test]
    fn test_serde_env_config() -> Result<()> {
        let config = BreakoutEnvConfig::default()
            .eval()
            .frame_skip(2)
            .fire_on_reset(false);
        let dir = TempDir::new("env_config")?;
        let path = dir.path().join("env.yaml");

        config.save(&path)?;
        assert_eq!(config, BreakoutEnvConfig::load(&path)?);
        Ok(())
    }
}
