//! Per-run reward log and checkpoint directory.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ml::PolicyNetwork;
use rl::EpisodeReport;
use serde::{Deserialize, Serialize};

pub const REWARDS_FILE: &str = "rewards.jsonl";
pub const MODELS_DIR: &str = "models";

/// One line of `rewards.jsonl`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub episode: usize,
    pub reward: f32,
    pub steps: usize,
}

impl From<&EpisodeReport> for RewardRecord {
    fn from(report: &EpisodeReport) -> Self {
        Self { episode: report.episode, reward: report.total_reward, steps: report.steps }
    }
}

/// Writes episode rewards as JSON lines into a run directory named after
/// the model and the start time.
pub struct RewardLogger {
    run_dir: PathBuf,
    rewards: BufWriter<File>,
}

impl RewardLogger {
    /// Create `<log_dir>/<model_name> <dd-mm HH:MM>/`.
    ///
    /// # Errors
    ///
    /// Fails if the directory or the reward file cannot be created.
    pub fn create(log_dir: &Path, model_name: &str) -> Result<Self> {
        let stamp = chrono::Local::now().format("%d-%m %H:%M");
        Self::create_at(log_dir.join(format!("{model_name} {stamp}")))
    }

    /// Use `run_dir` as is. Existing reward logs are appended to.
    ///
    /// # Errors
    ///
    /// Fails if the directory or the reward file cannot be created.
    pub fn create_at(run_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&run_dir)
            .with_context(|| format!("failed to create log directory {}", run_dir.display()))?;
        let path = run_dir.join(REWARDS_FILE);
        let file = File::options()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        tracing::info!(dir = %run_dir.display(), "logging rewards");
        Ok(Self { run_dir, rewards: BufWriter::new(file) })
    }

    #[must_use]
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Append one episode and flush, so the log survives an interrupt.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors.
    pub fn log_reward(&mut self, report: &EpisodeReport) -> Result<()> {
        serde_json::to_writer(&mut self.rewards, &RewardRecord::from(report))?;
        self.rewards.write_all(b"\n")?;
        self.rewards.flush().context("failed to flush reward log")
    }

    /// Save `network` as `models/policy_epoch_{epoch}.json` and return the path.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors.
    pub fn save_checkpoint(&self, network: &PolicyNetwork, epoch: usize) -> Result<PathBuf> {
        let dir = self.run_dir.join(MODELS_DIR);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("policy_epoch_{epoch}.json"));
        network
            .state_dict()
            .save(&path)
            .with_context(|| format!("failed to save checkpoint {}", path.display()))?;
        Ok(path)
    }
}
