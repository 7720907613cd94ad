use std::path::PathBuf;

use polecam::{RunArgs, RunConfig};
use rl::ActionSelection;

#[test]
fn defaults_match_the_pretrained_setup() {
    let config = RunConfig::default();
    assert_eq!(config.policy.input_channels, 2);
    assert_eq!((config.policy.input_height, config.policy.input_width), (40, 150));
    assert_eq!(config.screen.resize_pixels, 40);
    assert_eq!((config.view.width, config.view.height), (600, 400));
    assert_eq!(config.action_selection, ActionSelection::Deterministic);
    assert_eq!(config.episodes, None);
    assert_eq!(config.policy.checkpoint_path, None);
}

#[test]
fn partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    std::fs::write(
        &path,
        r#"{"episodes": 5, "action_selection": "stochastic", "policy": {"hidden_units": 64}}"#,
    )
    .unwrap();

    let config = RunConfig::from_json_file(&path).unwrap();
    assert_eq!(config.episodes, Some(5));
    assert_eq!(config.action_selection, ActionSelection::Stochastic);
    assert_eq!(config.policy.hidden_units, 64);
    assert_eq!(config.policy.hidden_channels, vec![32, 32, 32]);
    assert_eq!(config.cartpole, physics::CartPoleConfig::default());
}

#[test]
fn flags_override_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    std::fs::write(&path, r#"{"episodes": 5, "model_name": "from-file"}"#).unwrap();

    let args = RunArgs {
        config: Some(path),
        checkpoint: Some(PathBuf::from("policy.json")),
        episodes: Some(2),
        action_selection: Some(ActionSelection::Stochastic),
        ..RunArgs::default()
    };
    let config = RunConfig::resolve(&args).unwrap();
    assert_eq!(config.episodes, Some(2));
    assert_eq!(config.model_name, "from-file");
    assert_eq!(config.policy.checkpoint_path, Some(PathBuf::from("policy.json")));
    assert_eq!(config.action_selection, ActionSelection::Stochastic);
}

#[test]
fn config_round_trips_through_json() {
    let config = RunConfig { seed: Some(9), ..RunConfig::default() };
    let text = serde_json::to_string(&config).unwrap();
    let back: RunConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, config);
}

#[test]
fn missing_or_invalid_file_is_an_error() {
    assert!(RunConfig::from_json_file(std::path::Path::new("/nonexistent/run.json")).is_err());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"episodes": "many"}"#).unwrap();
    assert!(RunConfig::from_json_file(&path).is_err());
}
