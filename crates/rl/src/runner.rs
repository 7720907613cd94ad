use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ml::{MlError, PolicyNetwork, Tensor};

use crate::{ActionSelection, Environment, RunError, Simulator};

/// Outcome of one finished episode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeReport {
    pub episode: usize,
    pub steps: usize,
    pub total_reward: f32,
}

/// Outcome of [`EpisodeRunner::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of episodes that ran to termination.
    pub episodes: usize,
    /// Whether the stop flag ended the run.
    pub interrupted: bool,
}

/// Called after each reset with the episode index and the environment.
pub type EpisodeStartHook<'a, S> = Box<dyn FnMut(usize, &Environment<S>) + 'a>;

/// Drives a policy through episodes of an [`Environment`].
///
/// Every step the previous and current screens are stacked along the
/// channel axis and fed to the policy; at the first step of an episode
/// both are the post-reset screen.
pub struct EpisodeRunner<'a, S: Simulator> {
    env: &'a mut Environment<S>,
    policy: &'a PolicyNetwork,
    selection: ActionSelection,
    rng: fastrand::Rng,
    stop: Option<Arc<AtomicBool>>,
    on_start: Option<EpisodeStartHook<'a, S>>,
}

impl<'a, S: Simulator> EpisodeRunner<'a, S> {
    /// # Errors
    ///
    /// Returns [`MlError::ShapeMismatch`] (as [`RunError::Policy`]) when the
    /// policy does not take two stacked screens of the environment's shape
    /// or does not output one probability per simulator action.
    pub fn new(
        env: &'a mut Environment<S>,
        policy: &'a PolicyNetwork,
        selection: ActionSelection,
    ) -> Result<Self, RunError> {
        let cfg = policy.config();
        let (h, w) = env.screen_shape()?;
        let expected = [1, 2, h, w];
        let configured = cfg.input_shape();
        if configured != expected {
            return Err(MlError::ShapeMismatch {
                context: "policy input vs screen".into(),
                expected: expected.to_vec(),
                found: configured.to_vec(),
            }
            .into());
        }
        if cfg.action_count != env.action_count() {
            return Err(MlError::ShapeMismatch {
                context: "policy actions vs simulator".into(),
                expected: vec![env.action_count()],
                found: vec![cfg.action_count],
            }
            .into());
        }
        Ok(Self { env, policy, selection, rng: fastrand::Rng::new(), stop: None, on_start: None })
    }

    /// Seed the generator used by stochastic selection.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    /// Stop at the next step boundary once `flag` is set.
    #[must_use]
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    /// Observe the environment right after every reset.
    #[must_use]
    pub fn with_episode_start(mut self, hook: impl FnMut(usize, &Environment<S>) + 'a) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    fn stopped(&self) -> bool {
        self.stop.as_ref().is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Play one episode to termination.
    ///
    /// Returns `Ok(None)` if the stop flag was raised before the episode
    /// finished.
    ///
    /// # Errors
    ///
    /// Propagates environment and policy failures.
    pub fn run_episode(&mut self, episode: usize) -> Result<Option<EpisodeReport>, RunError> {
        self.env.reset()?;
        if let Some(hook) = self.on_start.as_mut() {
            hook(episode, self.env);
        }
        let mut prev = self.env.get_screen()?;
        let mut total_reward = 0.0;
        let mut steps = 0;

        loop {
            if self.stopped() {
                tracing::info!(episode, steps, "episode interrupted");
                return Ok(None);
            }
            steps += 1;
            let screen = self.env.get_screen()?;
            let x = Tensor::cat(&[&prev, &screen], 0)?.unsqueeze(0)?;
            let probs = self.policy.action_probabilities(&x)?;
            let action = self.selection.select(&probs, &mut self.rng);

            let outcome = self.env.step(action)?;
            total_reward += outcome.reward;
            tracing::debug!(episode, step = steps, action, ?probs, reward = outcome.reward, "step");
            prev = screen;

            if outcome.done {
                tracing::info!(episode, steps, total_reward, "episode finished");
                return Ok(Some(EpisodeReport { episode, steps, total_reward }));
            }
        }
    }

    /// Play episodes until `max_episodes` is reached (forever when `None`)
    /// or the stop flag is raised, calling `on_episode` after each one.
    ///
    /// # Errors
    ///
    /// The first error from an episode or from `on_episode`.
    pub fn run<E, F>(&mut self, max_episodes: Option<usize>, mut on_episode: F) -> Result<RunSummary, E>
    where
        E: From<RunError>,
        F: FnMut(&EpisodeReport) -> Result<(), E>,
    {
        let mut episodes = 0;
        while max_episodes.map_or(true, |max| episodes < max) {
            if self.stopped() {
                return Ok(RunSummary { episodes, interrupted: true });
            }
            match self.run_episode(episodes)? {
                Some(report) => on_episode(&report)?,
                None => return Ok(RunSummary { episodes, interrupted: true }),
            }
            episodes += 1;
        }
        Ok(RunSummary { episodes, interrupted: false })
    }
}
