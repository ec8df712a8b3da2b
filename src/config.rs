//! Experiment configuration.
//!
//! Field names follow the JSON experiment configs (`bandit`, `narms`, `arm_means`,
//! `arm_stds`, `hints`, `ntrials`, `temperature`, `model_name`). `temperature` and
//! `model_name` belong to the external model driver and are carried through untouched.

use crate::{
    placeholder_schema, BanditKind, Dynamics, Environment, Error, HintTemplate, Result,
    DEFAULT_CHANGE_STEP, DEFAULT_DELAY, DEFAULT_DRIFT_RATE,
};

/// Trials per game when a config does not say otherwise.
pub const DEFAULT_N_ITERS: usize = 20;

/// Which context (if any) each trial of a game passes to the environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ContextSchedule {
    /// No context; only valid for non-contextual bandits.
    #[default]
    None,
    /// The same context on every trial.
    Fixed(usize),
    /// Trial `t` uses `contexts[t % len]`.
    Cycle(Vec<usize>),
}

impl ContextSchedule {
    pub fn context_for(&self, trial: usize) -> Option<usize> {
        match self {
            ContextSchedule::None => None,
            ContextSchedule::Fixed(c) => Some(*c),
            ContextSchedule::Cycle(cs) if cs.is_empty() => None,
            ContextSchedule::Cycle(cs) => Some(cs[trial % cs.len()]),
        }
    }

    fn values(&self) -> &[usize] {
        match self {
            ContextSchedule::None => &[],
            ContextSchedule::Fixed(c) => std::slice::from_ref(c),
            ContextSchedule::Cycle(cs) => cs,
        }
    }
}

/// One experiment condition: a bandit variant, arm configurations, and hints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentConfig {
    pub bandit: BanditKind,
    pub narms: usize,
    /// Each entry is one original arm-mean configuration (rotated in its own block set).
    pub arm_means: Vec<Vec<f64>>,
    pub arm_stds: Vec<f64>,
    pub hints: Vec<String>,
    /// Games per hint per rotation step.
    pub ntrials: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_n_iters"))]
    pub n_iters: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub temperature: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub model_name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub drift_rate: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub change_step: Option<u64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub delay: Option<usize>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub contexts: ContextSchedule,
}

#[cfg(feature = "serde")]
fn default_n_iters() -> usize {
    DEFAULT_N_ITERS
}

impl ExperimentConfig {
    /// A config with default dynamics parameters, 20 trials per game, and no contexts.
    pub fn new(
        bandit: BanditKind,
        arm_means: Vec<Vec<f64>>,
        arm_stds: Vec<f64>,
        hints: Vec<String>,
        ntrials: usize,
    ) -> Self {
        Self {
            bandit,
            narms: arm_stds.len(),
            arm_means,
            arm_stds,
            hints,
            ntrials,
            n_iters: DEFAULT_N_ITERS,
            temperature: None,
            model_name: None,
            drift_rate: None,
            change_step: None,
            delay: None,
            contexts: ContextSchedule::None,
        }
    }

    /// Parse and validate a JSON config.
    #[cfg(feature = "serde")]
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check shapes, placeholder schemas, dynamics parameters, and the context schedule.
    pub fn validate(&self) -> Result<()> {
        let schema = placeholder_schema(self.narms)?;
        if self.arm_stds.len() != self.narms {
            return Err(Error::ShapeMismatch {
                arm_count: self.narms,
                means: self.narms,
                stds: self.arm_stds.len(),
            });
        }
        if let Some(bad) = self.arm_means.iter().find(|m| m.len() != self.narms) {
            return Err(Error::ShapeMismatch {
                arm_count: self.narms,
                means: bad.len(),
                stds: self.arm_stds.len(),
            });
        }
        if let Some((arm, &value)) = self
            .arm_stds
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_finite() || **s < 0.0)
        {
            return Err(Error::InvalidStd { arm, value });
        }
        for h in &self.hints {
            HintTemplate::parse(h, schema)?;
        }
        self.dynamics()?;
        self.validate_contexts()
    }

    fn validate_contexts(&self) -> Result<()> {
        let bandit = self.bandit.name();
        match self.bandit {
            BanditKind::TwoContext | BanditKind::ThreeContext
                if self.contexts.values().is_empty() =>
            {
                Err(Error::MissingContext { bandit })
            }
            BanditKind::ThreeContext => match self.contexts.values().iter().find(|&&c| c > 2) {
                Some(&context) => Err(Error::InvalidContext { bandit, context }),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    /// Build the configured variant, falling back to default parameters.
    pub fn dynamics(&self) -> Result<Dynamics> {
        Ok(match self.bandit {
            BanditKind::Drifting => {
                Dynamics::drifting(self.drift_rate.unwrap_or(DEFAULT_DRIFT_RATE))?
            }
            BanditKind::Stepwise => {
                Dynamics::stepwise(self.change_step.unwrap_or(DEFAULT_CHANGE_STEP))?
            }
            BanditKind::TimeDelayed => Dynamics::time_delayed(self.delay.unwrap_or(DEFAULT_DELAY)),
            kind => Dynamics::new(kind),
        })
    }

    /// A fresh environment with `narms` and `arm_stds` set.
    ///
    /// Means start at zero; the driver installs each rotation block's means.
    pub fn environment(&self) -> Result<Environment> {
        let mut env = Environment::new(self.dynamics()?);
        env.configure(self.narms, &vec![0.0; self.narms], &self.arm_stds)?;
        Ok(env)
    }
}
