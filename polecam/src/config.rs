//! Run configuration: JSON file first, command-line flags on top.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use ml::PolicyConfig;
use physics::CartPoleConfig;
use render::ViewConfig;
use rl::{ActionSelection, ScreenConfig};
use serde::{Deserialize, Serialize};

/// Everything a run needs. Every field has a default, so a config file only
/// lists what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub policy: PolicyConfig,
    pub screen: ScreenConfig,
    pub cartpole: CartPoleConfig,
    pub view: ViewConfig,
    pub action_selection: ActionSelection,
    /// Stop after this many episodes; run until interrupted when unset.
    pub episodes: Option<usize>,
    /// Seeds resets, stochastic selection and random initialization.
    pub seed: Option<u64>,
    /// Parent directory for reward logs; no logging when unset.
    pub log_dir: Option<PathBuf>,
    pub model_name: String,
    /// Directory receiving PNGs of each episode's first frame.
    pub dump_frames: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            screen: ScreenConfig::default(),
            cartpole: CartPoleConfig::default(),
            view: ViewConfig::default(),
            action_selection: ActionSelection::default(),
            episodes: None,
            seed: None,
            log_dir: None,
            model_name: "policy".to_string(),
            dump_frames: None,
        }
    }
}

impl RunConfig {
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid configuration.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Load the file named by `args.config` (defaults otherwise) and apply
    /// the flag overrides.
    ///
    /// # Errors
    ///
    /// As [`RunConfig::from_json_file`].
    pub fn resolve(args: &RunArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        args.apply(&mut config);
        Ok(config)
    }
}

/// Flags shared by the subcommands.
#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// JSON configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Policy checkpoint (JSON state dictionary).
    #[arg(long, value_name = "PATH")]
    pub checkpoint: Option<PathBuf>,

    /// Number of episodes to run.
    #[arg(long)]
    pub episodes: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// `deterministic` or `stochastic`.
    #[arg(long)]
    pub action_selection: Option<ActionSelection>,

    /// Write per-episode rewards under this directory.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[arg(long)]
    pub model_name: Option<String>,

    /// Save the first frame of every episode as PNG here.
    #[arg(long, value_name = "DIR")]
    pub dump_frames: Option<PathBuf>,
}

impl RunArgs {
    /// Overwrite the fields of `config` that were given on the command line.
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(path) = &self.checkpoint {
            config.policy.checkpoint_path = Some(path.clone());
        }
        if let Some(n) = self.episodes {
            config.episodes = Some(n);
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(selection) = self.action_selection {
            config.action_selection = selection;
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir = Some(dir.clone());
        }
        if let Some(name) = &self.model_name {
            config.model_name.clone_from(name);
        }
        if let Some(dir) = &self.dump_frames {
            config.dump_frames = Some(dir.clone());
        }
    }
}
