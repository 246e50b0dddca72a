use anyhow::Result;
use clap::Parser;
use dqn_breakout::{run, test, train, Args};
use std::path::Path;
use tempdir::TempDir;

fn args(dir: &Path, n_episodes: usize, extra: &[&str]) -> Args {
    let logdir = dir.join("log");
    let model = dir.join("model");
    let mut argv = vec![
        "dqn-breakout".to_string(),
        "--device".to_string(),
        "cpu".to_string(),
        "--logdir".to_string(),
        logdir.to_string_lossy().into_owned(),
        "--model".to_string(),
        model.to_string_lossy().into_owned(),
        "--episode".to_string(),
        n_episodes.to_string(),
    ];
    let small = [
        "--warmup", "8", "--capacity", "100", "--batch-size", "4",
        "--eps-decay", "20", "--freq", "4", "--target-freq", "16", "--eval-freq", "2",
        "--test-episode", "1", "--max-episode-steps", "40",
    ];
    argv.extend(small.iter().chain(extra.iter()).map(|s| s.to_string()));
    Args::try_parse_from(argv).unwrap()
}

#[test]
fn test_train_resume_and_test() -> Result<()> {
    let dir = TempDir::new("dqn_breakout")?;
    let logdir = dir.path().join("log");

    let session = train(&args(dir.path(), 3, &["--full-checkpoints"]))?;
    assert_eq!(session.episode, 2);
    assert!(session.total_steps > 0);
    assert!(session.best_eval_reward.is_finite());

    assert!(logdir.join("config.yaml").exists());
    assert!(logdir.join("best/qnet.safetensors").exists());
    assert!(!logdir.join("best/opt.safetensors").exists());
    assert!(logdir.join("2/qnet.safetensors").exists());
    assert!(logdir.join("2/qnet_tgt.safetensors").exists());
    assert!(logdir.join("2/opt.safetensors").exists());
    assert!(dir.path().join("model/qnet.safetensors").exists());

    // Resumes at episode 2 and evaluates again at episode 4.
    let session = train(&args(dir.path(), 5, &["--full-checkpoints", "--resume", "2"]))?;
    assert_eq!(session.episode, 4);
    assert!(logdir.join("4/opt.safetensors").exists());

    let score = test(&args(dir.path(), 3, &["--test-only"]))?;
    assert!(score >= 0.0);
    Ok(())
}

#[test]
fn test_test_only_without_model_fails() -> Result<()> {
    let dir = TempDir::new("dqn_breakout_missing")?;
    assert!(run(&args(dir.path(), 3, &["--test-only"])).is_err());
    Ok(())
}

#[test]
fn test_show_config_does_not_train() -> Result<()> {
    let dir = TempDir::new("dqn_breakout_config")?;
    run(&args(dir.path(), 3, &["--show-config"]))?;
    assert!(!dir.path().join("log").exists());
    assert!(!dir.path().join("model").exists());
    Ok(())
}

#[test]
fn test_warmup_shorter_than_batch_fails_before_training() -> Result<()> {
    let dir = TempDir::new("dqn_breakout_warmup")?;
    let logdir = dir.path().join("log");
    let args = Args::try_parse_from([
        "dqn-breakout",
        "--device",
        "cpu",
        "--logdir",
        logdir.to_str().unwrap(),
        "--warmup",
        "0",
        "--batch-size",
        "32",
    ])?;

    assert!(train(&args).is_err());
    assert!(!logdir.exists());
    Ok(())
}
