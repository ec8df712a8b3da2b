//! Experiment driver glue.
//!
//! The arm-choosing agent (usually a language model) stays outside the crate behind
//! [`ArmChooser`]. This module owns the loop that wires a [`Rotator`] to an
//! [`Environment`]:
//!
//! 1. For each original arm configuration, build a fresh environment and rotator.
//! 2. For each rotation block, install the rotated means (clearing history).
//! 3. For each `(template, substituted hint)` pair, play `ntrials` games of
//!    `n_iters` trials and emit one [`TrialRecord`] per game.
//!
//! Choices are **1-indexed**, the way they are presented to the agent. An answer
//! outside `1..=arm_count` is recorded as `None` and the pulled arm is drawn
//! uniformly at random.

use rand::Rng;
use tracing::{debug, warn};

use crate::{BanditKind, ContextSchedule, Environment, ExperimentConfig, Result, Rotator};

/// What the agent sees before each trial.
#[derive(Debug, Clone, Copy)]
pub struct TrialView<'a> {
    /// Substituted hint for this game.
    pub hint: &'a str,
    /// 0-based trial index within the game.
    pub trial: usize,
    pub arm_count: usize,
    /// Earlier trials of this game, oldest first.
    pub steps: &'a [GameStep],
}

/// The external agent.
pub trait ArmChooser {
    /// Return a 1-indexed arm, or anything else (including `None`) for "no valid answer".
    fn choose(&mut self, view: &TrialView<'_>) -> Option<usize>;
}

impl<F> ArmChooser for F
where
    F: FnMut(&TrialView<'_>) -> Option<usize>,
{
    fn choose(&mut self, view: &TrialView<'_>) -> Option<usize> {
        self(view)
    }
}

/// One played trial.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameStep {
    /// The agent's answer if it named a valid arm (1-indexed).
    pub choice: Option<usize>,
    /// The arm actually pulled (0-indexed).
    pub arm: usize,
    pub context: Option<usize>,
    pub reward: f64,
}

/// Everything that happened in one game.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameLog {
    pub steps: Vec<GameStep>,
    /// Pulls per arm (0-indexed).
    pub arm_counts: Vec<u64>,
    /// Reward sum per arm (0-indexed).
    pub arm_rewards: Vec<f64>,
}

impl GameLog {
    /// The agent's answers in trial order.
    pub fn choices(&self) -> Vec<Option<usize>> {
        self.steps.iter().map(|s| s.choice).collect()
    }

    pub fn total_reward(&self) -> f64 {
        self.steps.iter().map(|s| s.reward).sum()
    }
}

/// Play `n_iters` trials against `env` with a fixed hint.
pub fn run_game<C, R>(
    env: &mut Environment,
    chooser: &mut C,
    hint: &str,
    n_iters: usize,
    contexts: &ContextSchedule,
    rng: &mut R,
) -> Result<GameLog>
where
    C: ArmChooser + ?Sized,
    R: Rng + ?Sized,
{
    let arm_count = env.arm_count().ok_or(crate::Error::UnconfiguredEnvironment)?;
    let mut log = GameLog {
        steps: Vec::with_capacity(n_iters),
        arm_counts: vec![0; arm_count],
        arm_rewards: vec![0.0; arm_count],
    };

    for trial in 0..n_iters {
        let view = TrialView {
            hint,
            trial,
            arm_count,
            steps: &log.steps,
        };
        let answer = chooser.choose(&view);
        let (choice, arm) = match answer {
            Some(c) if (1..=arm_count).contains(&c) => (Some(c), c - 1),
            other => {
                let arm = rng.random_range(0..arm_count);
                warn!(trial, answer = ?other, fallback = arm + 1, "agent answer out of range");
                (None, arm)
            }
        };
        let context = contexts.context_for(trial);
        let reward = env.reward(arm, context, rng)?;

        log.arm_counts[arm] += 1;
        log.arm_rewards[arm] += reward;
        log.steps.push(GameStep {
            choice,
            arm,
            context,
            reward,
        });
    }

    debug!(
        hint,
        counts = ?log.arm_counts,
        means = ?env.means(),
        "game finished"
    );
    Ok(log)
}

/// One game's worth of output, keyed the way result tables are.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialRecord {
    pub bandit: BanditKind,
    /// The arm configuration before rotation.
    pub og_arms: Vec<f64>,
    /// The hint template before substitution.
    pub og_hints: String,
    /// The rotated arm means for this block.
    pub arms: Vec<f64>,
    /// The fully substituted hint.
    pub hint: String,
    /// The agent's answers, in trial order.
    pub history: Vec<Option<usize>>,
}

impl TrialRecord {
    /// Per trial: did the agent name the highest-mean arm of this block?
    pub fn optimal_choices(&self) -> Vec<bool> {
        let best = optimal_arm(&self.arms);
        self.history
            .iter()
            .map(|c| c.is_some() && *c == best)
            .collect()
    }

    /// Cumulative proportion of optimal choices after each trial.
    pub fn optimal_proportion(&self) -> Vec<f64> {
        let mut hits = 0u64;
        self.optimal_choices()
            .into_iter()
            .enumerate()
            .map(|(t, hit)| {
                hits += u64::from(hit);
                hits as f64 / (t + 1) as f64
            })
            .collect()
    }
}

/// 1-indexed position of the highest mean (first one on ties); `None` if empty.
pub fn optimal_arm(means: &[f64]) -> Option<usize> {
    means
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &m)| match best {
            Some((_, b)) if m <= b => best,
            _ => Some((i, m)),
        })
        .map(|(i, _)| i + 1)
}

/// Run every arm configuration × rotation block × hint × `ntrials` game in `cfg`.
pub fn run_experiment<C, R>(
    cfg: &ExperimentConfig,
    chooser: &mut C,
    rng: &mut R,
) -> Result<Vec<TrialRecord>>
where
    C: ArmChooser + ?Sized,
    R: Rng + ?Sized,
{
    cfg.validate()?;
    let mut records = Vec::new();

    for og_arms in &cfg.arm_means {
        debug!(bandit = %cfg.bandit, ?og_arms, "starting arm configuration");
        let mut env = cfg.environment()?;
        let mut rotator = Rotator::new(og_arms.clone(), &cfg.hints)?;

        while !rotator.cycle_complete() {
            let block = rotator.advance();
            env.install_means(&block.arms)?;
            for (template, hint) in cfg.hints.iter().zip(&block.hints) {
                for _ in 0..cfg.ntrials {
                    let log = run_game(&mut env, chooser, hint, cfg.n_iters, &cfg.contexts, rng)?;
                    records.push(TrialRecord {
                        bandit: cfg.bandit,
                        og_arms: og_arms.clone(),
                        og_hints: template.clone(),
                        arms: block.arms.clone(),
                        hint: hint.clone(),
                        history: log.choices(),
                    });
                }
            }
        }
    }

    Ok(records)
}
