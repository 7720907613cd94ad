//! Wiring between configuration, simulator, policy and process output.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use ml::PolicyNetwork;
use rl::{CartPoleSimulator, Environment, EpisodeReport, EpisodeRunner, RunSummary, Simulator};

use crate::config::RunConfig;
use crate::frames::FrameDumper;
use crate::logger::RewardLogger;

/// The per-episode line printed on stdout.
#[must_use]
pub fn episode_line(report: &EpisodeReport) -> String {
    format!("[EPISODE: {}] [STEP: {:?}]", report.episode, report.total_reward)
}

/// Load the configured checkpoint, or fall back to random weights.
///
/// # Errors
///
/// Fails if the checkpoint cannot be read or does not fit the architecture.
pub fn load_policy(config: &RunConfig) -> Result<PolicyNetwork> {
    match &config.policy.checkpoint_path {
        Some(path) => {
            let policy = PolicyNetwork::load(config.policy.clone())
                .with_context(|| format!("failed to load policy from {}", path.display()))?;
            tracing::info!(path = %path.display(), "policy loaded");
            Ok(policy)
        }
        None => {
            tracing::warn!("no checkpoint configured, running with random weights");
            Ok(PolicyNetwork::new(config.policy.clone(), config.seed.unwrap_or(0))?)
        }
    }
}

/// Write a freshly initialized checkpoint for the configured architecture.
///
/// # Errors
///
/// Fails on an impossible architecture or I/O errors.
pub fn init_checkpoint(config: &RunConfig, out: &Path) -> Result<()> {
    let policy = PolicyNetwork::new(config.policy.clone(), config.seed.unwrap_or(0))?;
    policy
        .state_dict()
        .save(out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(path = %out.display(), params = policy.named_params().len(), "checkpoint written");
    Ok(())
}

/// Run episodes on an already built environment, printing one line per
/// episode to `out`.
///
/// # Errors
///
/// Fails if the policy input does not match the screen shape, or on any
/// environment, policy, logging or output error.
pub fn run_episodes<S: Simulator, W: Write>(
    config: &RunConfig,
    env: &mut Environment<S>,
    policy: &PolicyNetwork,
    stop: Option<Arc<AtomicBool>>,
    out: &mut W,
) -> Result<RunSummary> {
    let screen = env.screen_shape()?;
    let expected = (config.policy.input_height, config.policy.input_width);
    ensure!(
        screen == expected,
        "screen is {}x{} but the policy expects {}x{}",
        screen.0,
        screen.1,
        expected.0,
        expected.1
    );

    let mut logger = match &config.log_dir {
        Some(dir) => Some(RewardLogger::create(dir, &config.model_name)?),
        None => None,
    };
    let dumper = config.dump_frames.clone().map(FrameDumper::new).transpose()?;

    let mut runner = EpisodeRunner::new(env, policy, config.action_selection)?;
    if let Some(seed) = config.seed {
        runner = runner.with_seed(seed);
    }
    if let Some(stop) = stop {
        runner = runner.with_stop_flag(stop);
    }
    if let Some(dumper) = dumper {
        runner = runner.with_episode_start(move |episode, env| {
            if let Err(e) = dumper.dump(episode, env) {
                tracing::warn!(episode, "frame dump failed: {e:#}");
            }
        });
    }

    tracing::info!(selection = %config.action_selection, episodes = ?config.episodes, "starting run");
    let summary = runner.run::<anyhow::Error, _>(config.episodes, |report| {
        writeln!(out, "{}", episode_line(report))?;
        out.flush()?;
        if let Some(logger) = logger.as_mut() {
            logger.log_reward(report)?;
        }
        Ok(())
    })?;

    if let Some(logger) = &logger {
        let path = logger.save_checkpoint(policy, summary.episodes)?;
        tracing::info!(path = %path.display(), "policy saved");
    }
    tracing::info!(episodes = summary.episodes, interrupted = summary.interrupted, "run finished");
    Ok(summary)
}

/// Build the CartPole environment and policy, then run to completion.
///
/// The environment is closed when this returns, whatever the outcome.
///
/// # Errors
///
/// As [`load_policy`] and [`run_episodes`], plus simulator start-up errors.
pub fn run_blocking(config: &RunConfig, stop: Option<Arc<AtomicBool>>) -> Result<RunSummary> {
    let sim = CartPoleSimulator::new(config.cartpole.clone(), config.view.clone(), config.seed);
    let mut env = Environment::new(sim, config.screen.clone()).context("failed to start the simulator")?;
    let policy = load_policy(config)?;
    let stdout = std::io::stdout();
    let summary = run_episodes(config, &mut env, &policy, stop, &mut stdout.lock());
    env.close();
    summary
}

/// Run on a blocking thread until done or until Ctrl-C, which raises the
/// stop flag so the loop returns at the next step boundary.
///
/// # Errors
///
/// As [`run_blocking`], or if the episode thread panicked.
pub async fn run(config: RunConfig) -> Result<RunSummary> {
    let stop = Arc::new(AtomicBool::new(false));
    let worker_stop = Arc::clone(&stop);
    let mut worker = tokio::task::spawn_blocking(move || run_blocking(&config, Some(worker_stop)));

    tokio::select! {
        joined = &mut worker => joined.context("episode loop panicked")?,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    tracing::warn!("interrupt received, stopping");
                    stop.store(true, Ordering::SeqCst);
                }
                Err(e) => tracing::warn!("cannot listen for Ctrl-C: {e}"),
            }
            worker.await.context("episode loop panicked")?
        }
    }
}
