mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::{stub_config, stub_env};
use ml::{PolicyConfig, PolicyNetwork};
use polecam::app::{episode_line, init_checkpoint, load_policy, run_episodes};
use polecam::logger::{RewardRecord, MODELS_DIR, REWARDS_FILE};
use polecam::RunConfig;
use rl::{EpisodeReport, StubSimulator};

fn output_lines(out: &[u8]) -> Vec<String> {
    String::from_utf8(out.to_vec()).unwrap().lines().map(str::to_string).collect()
}

#[test]
fn episode_line_format() {
    let report = EpisodeReport { episode: 4, steps: 17, total_reward: 17.0 };
    assert_eq!(episode_line(&report), "[EPISODE: 4] [STEP: 17.0]");
}

#[test]
fn prints_one_line_per_episode() {
    let config = stub_config();
    let sim = StubSimulator::new(40, 50).done_after(1);
    let closes = sim.close_counter();
    let mut env = stub_env(&config, sim);
    let policy = load_policy(&config).unwrap();

    let mut out = Vec::new();
    let summary = run_episodes(&config, &mut env, &policy, None, &mut out).unwrap();
    assert_eq!(summary.episodes, 3);
    assert!(!summary.interrupted);
    assert_eq!(
        output_lines(&out),
        vec!["[EPISODE: 0] [STEP: 1.0]", "[EPISODE: 1] [STEP: 1.0]", "[EPISODE: 2] [STEP: 1.0]"]
    );

    drop(env);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn raised_stop_flag_prints_nothing() {
    let config = RunConfig { episodes: None, ..stub_config() };
    let mut env = stub_env(&config, StubSimulator::new(40, 50));
    let policy = load_policy(&config).unwrap();

    let mut out = Vec::new();
    let stop = Arc::new(AtomicBool::new(true));
    let summary = run_episodes(&config, &mut env, &policy, Some(stop), &mut out).unwrap();
    assert!(summary.interrupted);
    assert!(out.is_empty());
}

#[test]
fn screen_and_policy_shapes_must_agree() {
    let mut config = stub_config();
    config.policy.input_width = 20;
    let mut env = stub_env(&config, StubSimulator::new(40, 50));
    let policy = PolicyNetwork::new(config.policy.clone(), 0).unwrap();

    let err = run_episodes(&config, &mut env, &policy, None, &mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("policy expects 15x20"), "got {err}");
}

#[test]
fn rewards_and_final_policy_are_logged() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig {
        log_dir: Some(dir.path().to_path_buf()),
        model_name: "stub".into(),
        ..stub_config()
    };
    let mut env = stub_env(&config, StubSimulator::new(40, 50).done_after(2).with_reward(0.5));
    let policy = load_policy(&config).unwrap();
    run_episodes(&config, &mut env, &policy, None, &mut Vec::new()).unwrap();

    let runs: Vec<_> = std::fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(runs.len(), 1);
    let run_dir = &runs[0];
    assert!(run_dir.file_name().unwrap().to_string_lossy().starts_with("stub "));

    let text = std::fs::read_to_string(run_dir.join(REWARDS_FILE)).unwrap();
    let records: Vec<RewardRecord> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2], RewardRecord { episode: 2, reward: 1.0, steps: 2 });

    let saved = run_dir.join(MODELS_DIR).join("policy_epoch_3.json");
    let reloaded = PolicyNetwork::load(PolicyConfig { checkpoint_path: Some(saved), ..config.policy.clone() });
    assert!(reloaded.is_ok());
}

#[test]
fn first_frames_are_dumped() {
    let dir = tempfile::tempdir().unwrap();
    let frames = dir.path().join("frames");
    let config = RunConfig { dump_frames: Some(frames.clone()), episodes: Some(2), ..stub_config() };
    let mut env = stub_env(&config, StubSimulator::new(40, 50));
    let policy = load_policy(&config).unwrap();
    run_episodes(&config, &mut env, &policy, None, &mut Vec::new()).unwrap();

    let raw = image::open(frames.join("episode_00001_raw.png")).unwrap();
    assert_eq!((raw.width(), raw.height()), (40, 50));
    let screen = image::open(frames.join("episode_00001_screen.png")).unwrap();
    assert_eq!((screen.width(), screen.height()), (30, 15));
}

#[test]
fn initialized_checkpoint_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("init.json");
    let config = stub_config();
    init_checkpoint(&config, &out).unwrap();

    let loaded = load_policy(&RunConfig {
        policy: PolicyConfig { checkpoint_path: Some(out), ..config.policy.clone() },
        ..config.clone()
    })
    .unwrap();
    let fresh = PolicyNetwork::new(config.policy.clone(), 1).unwrap();
    assert_eq!(loaded.state_dict(), fresh.state_dict());
}

#[test]
fn unreadable_checkpoint_is_fatal() {
    let mut config = stub_config();
    config.policy.checkpoint_path = Some("/nonexistent/policy.json".into());
    let err = load_policy(&config).err().unwrap();
    assert!(format!("{err:#}").contains("failed to load policy"));
}
