//! Reward environments with distinct temporal dynamics.
//!
//! An [`Environment`] owns the per-arm Gaussian reward table (means and stds) and a
//! [`Dynamics`] value: a closed set of variants, each carrying its own state record.
//! [`Environment::reward`] is the single dispatch point: it validates the action,
//! applies the variant's state transition, draws `Normal(mean[a], std[a])`, and
//! post-processes the sample where the variant says so.
//!
//! Notes:
//! - Randomness is always an explicit `&mut R: Rng` handle. Threading one seeded
//!   generator through every call in the same order reproduces a run exactly.
//! - Installing a new arm order ([`Environment::install_means`]) clears reward
//!   history buffers so averaging/delay state never leaks across blocks.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, trace};

use crate::{Error, Result};

/// Default per-call drift std for [`BanditKind::Drifting`].
pub const DEFAULT_DRIFT_RATE: f64 = 2.0;
/// Default regime-shift period for [`BanditKind::Stepwise`].
pub const DEFAULT_CHANGE_STEP: u64 = 10;
/// Default queue depth for [`BanditKind::TimeDelayed`].
pub const DEFAULT_DELAY: usize = 3;

/// Which reward-generating regime an environment follows.
///
/// Names (`Display` / `FromStr` / serde) match the experiment configs:
/// `stationary`, `drifting`, `stepwise`, `two_context`, `three_context`,
/// `moving_avg`, `time_delayed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum BanditKind {
    Stationary,
    Drifting,
    Stepwise,
    TwoContext,
    ThreeContext,
    #[cfg_attr(feature = "serde", serde(rename = "moving_avg", alias = "moving_average"))]
    MovingAverage,
    TimeDelayed,
}

impl BanditKind {
    pub const ALL: [BanditKind; 7] = [
        BanditKind::Stationary,
        BanditKind::Drifting,
        BanditKind::Stepwise,
        BanditKind::TwoContext,
        BanditKind::ThreeContext,
        BanditKind::MovingAverage,
        BanditKind::TimeDelayed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BanditKind::Stationary => "stationary",
            BanditKind::Drifting => "drifting",
            BanditKind::Stepwise => "stepwise",
            BanditKind::TwoContext => "two_context",
            BanditKind::ThreeContext => "three_context",
            BanditKind::MovingAverage => "moving_avg",
            BanditKind::TimeDelayed => "time_delayed",
        }
    }

    /// True if `reward` requires a context for this variant.
    pub fn is_contextual(self) -> bool {
        matches!(self, BanditKind::TwoContext | BanditKind::ThreeContext)
    }
}

impl fmt::Display for BanditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BanditKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let norm = s.trim().to_ascii_lowercase();
        let norm = norm.strip_suffix("_mab").unwrap_or(&norm);
        match norm {
            "moving_average" => Ok(BanditKind::MovingAverage),
            other => BanditKind::ALL
                .into_iter()
                .find(|k| k.name() == other)
                .ok_or_else(|| Error::UnknownBandit(s.to_string())),
        }
    }
}

/// Random-walk drift applied to every mean before each draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Drift {
    rate: f64,
}

impl Drift {
    /// `rate` is the std of the per-call Gaussian increment (finite, `>= 0`).
    pub fn new(rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(Error::InvalidParameter("drift_rate must be finite and >= 0"));
        }
        Ok(Self { rate })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    fn apply<R: Rng + ?Sized>(&self, means: &mut [f64], rng: &mut R) -> Result<()> {
        let step = Normal::new(0.0, self.rate)
            .map_err(|_| Error::InvalidParameter("drift_rate must be finite and >= 0"))?;
        for m in means.iter_mut() {
            *m += step.sample(rng);
        }
        Ok(())
    }
}

/// Periodic regime shift: every `change_step` calls the lower half of arms pays 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Stepwise {
    change_step: u64,
    counter: u64,
}

impl Stepwise {
    pub fn new(change_step: u64) -> Result<Self> {
        if change_step == 0 {
            return Err(Error::InvalidParameter("change_step must be > 0"));
        }
        Ok(Self {
            change_step,
            counter: 0,
        })
    }

    pub fn change_step(&self) -> u64 {
        self.change_step
    }

    /// Number of `reward` calls seen so far (shared across arms).
    pub fn counter(&self) -> u64 {
        self.counter
    }

    fn tick(&mut self, means: &mut [f64]) {
        self.counter += 1;
        if self.counter % self.change_step == 0 {
            let half = means.len() / 2;
            means[..half].fill(0.0);
            debug!(counter = self.counter, zeroed = half, "stepwise regime shift");
        }
    }
}

/// Running average over every sample drawn in the current block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovingAverage {
    history: Vec<f64>,
}

impl MovingAverage {
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    fn record(&mut self, sample: f64) -> f64 {
        self.history.push(sample);
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }
}

/// FIFO delay line: the reward for call `t` is the sample drawn `delay - 1` calls earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDelay {
    delay: usize,
    queue: VecDeque<f64>,
}

impl TimeDelay {
    /// `delay` of 0 or 1 means no delay: every sample is returned immediately.
    pub fn new(delay: usize) -> Self {
        Self {
            delay,
            queue: VecDeque::with_capacity(delay.max(1)),
        }
    }

    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Samples drawn but not yet paid out, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = f64> + '_ {
        self.queue.iter().copied()
    }

    fn record(&mut self, sample: f64) -> f64 {
        self.queue.push_back(sample);
        if self.queue.len() < self.delay {
            return 0.0;
        }
        self.queue.pop_front().unwrap_or(0.0)
    }
}

/// Per-variant state and transition policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamics {
    Stationary,
    Drifting(Drift),
    Stepwise(Stepwise),
    /// Context 0 negates all means before the draw. The negation is never undone,
    /// so repeated 0-contexts alternate the sign.
    TwoContext,
    /// Context 0 sorts means ascending, 1 descending, 2 shuffles them.
    ThreeContext,
    MovingAverage(MovingAverage),
    TimeDelayed(TimeDelay),
}

impl Dynamics {
    /// Build a variant with its default parameters.
    pub fn new(kind: BanditKind) -> Self {
        match kind {
            BanditKind::Stationary => Dynamics::Stationary,
            BanditKind::Drifting => Dynamics::Drifting(Drift {
                rate: DEFAULT_DRIFT_RATE,
            }),
            BanditKind::Stepwise => Dynamics::Stepwise(Stepwise {
                change_step: DEFAULT_CHANGE_STEP,
                counter: 0,
            }),
            BanditKind::TwoContext => Dynamics::TwoContext,
            BanditKind::ThreeContext => Dynamics::ThreeContext,
            BanditKind::MovingAverage => Dynamics::MovingAverage(MovingAverage::default()),
            BanditKind::TimeDelayed => Dynamics::TimeDelayed(TimeDelay::new(DEFAULT_DELAY)),
        }
    }

    pub fn drifting(rate: f64) -> Result<Self> {
        Drift::new(rate).map(Dynamics::Drifting)
    }

    pub fn stepwise(change_step: u64) -> Result<Self> {
        Stepwise::new(change_step).map(Dynamics::Stepwise)
    }

    pub fn time_delayed(delay: usize) -> Self {
        Dynamics::TimeDelayed(TimeDelay::new(delay))
    }

    pub fn kind(&self) -> BanditKind {
        match self {
            Dynamics::Stationary => BanditKind::Stationary,
            Dynamics::Drifting(_) => BanditKind::Drifting,
            Dynamics::Stepwise(_) => BanditKind::Stepwise,
            Dynamics::TwoContext => BanditKind::TwoContext,
            Dynamics::ThreeContext => BanditKind::ThreeContext,
            Dynamics::MovingAverage(_) => BanditKind::MovingAverage,
            Dynamics::TimeDelayed(_) => BanditKind::TimeDelayed,
        }
    }

    /// Drop reward history (moving-average buffer, delay queue). Step counters survive.
    pub fn clear_history(&mut self) {
        match self {
            Dynamics::MovingAverage(m) => m.history.clear(),
            Dynamics::TimeDelayed(t) => t.queue.clear(),
            _ => {}
        }
    }

    /// Return every piece of transient state to its initial value.
    pub fn reset(&mut self) {
        self.clear_history();
        if let Dynamics::Stepwise(s) = self {
            s.counter = 0;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ArmTable {
    means: Vec<f64>,
    stds: Vec<f64>,
}

/// A stateful reward-generating environment.
///
/// # Example
///
/// ```rust
/// use mabsim::{BanditKind, Environment};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let mut env = Environment::from_kind(BanditKind::Stationary);
/// env.configure(3, &[10.0, 40.0, 70.0], &[4.0, 4.0, 4.0]).unwrap();
/// let r = env.reward(2, None, &mut rng).unwrap();
/// assert!(r.is_finite());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    dynamics: Dynamics,
    arms: Option<ArmTable>,
}

impl Environment {
    pub fn new(dynamics: Dynamics) -> Self {
        Self {
            dynamics,
            arms: None,
        }
    }

    pub fn from_kind(kind: BanditKind) -> Self {
        Self::new(Dynamics::new(kind))
    }

    /// Set arm count, means, and stds, and reset all variant state.
    ///
    /// Requirements:
    /// - `arm_count > 0`
    /// - `means.len() == stds.len() == arm_count`
    /// - every std is finite and `>= 0`
    pub fn configure(&mut self, arm_count: usize, means: &[f64], stds: &[f64]) -> Result<()> {
        if arm_count == 0 {
            return Err(Error::InvalidParameter("arm_count must be > 0"));
        }
        if means.len() != arm_count || stds.len() != arm_count {
            return Err(Error::ShapeMismatch {
                arm_count,
                means: means.len(),
                stds: stds.len(),
            });
        }
        if let Some((arm, &value)) = stds
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_finite() || **s < 0.0)
        {
            return Err(Error::InvalidStd { arm, value });
        }
        self.arms = Some(ArmTable {
            means: means.to_vec(),
            stds: stds.to_vec(),
        });
        self.dynamics.reset();
        Ok(())
    }

    /// Install a new arm order (one rotation block) and clear reward history.
    pub fn install_means(&mut self, means: &[f64]) -> Result<()> {
        let arms = self.arms.as_mut().ok_or(Error::UnconfiguredEnvironment)?;
        if means.len() != arms.means.len() {
            return Err(Error::ShapeMismatch {
                arm_count: arms.means.len(),
                means: means.len(),
                stds: arms.stds.len(),
            });
        }
        arms.means.copy_from_slice(means);
        self.dynamics.clear_history();
        debug!(bandit = %self.dynamics.kind(), ?means, "installed arm block");
        Ok(())
    }

    /// Draw a reward for `action` (0-indexed).
    ///
    /// `context` is required by [`BanditKind::TwoContext`] (0 is falsy) and
    /// [`BanditKind::ThreeContext`] (0, 1, or 2); other variants ignore it.
    /// An invalid action or context is rejected before any state changes.
    pub fn reward<R: Rng + ?Sized>(
        &mut self,
        action: usize,
        context: Option<usize>,
        rng: &mut R,
    ) -> Result<f64> {
        let kind = self.dynamics.kind();
        let arms = self.arms.as_mut().ok_or(Error::UnconfiguredEnvironment)?;
        let arm_count = arms.means.len();
        if action >= arm_count {
            return Err(Error::InvalidAction { action, arm_count });
        }

        let r = match &mut self.dynamics {
            Dynamics::Stationary => draw(arms, action, rng)?,
            Dynamics::Drifting(d) => {
                d.apply(&mut arms.means, rng)?;
                draw(arms, action, rng)?
            }
            Dynamics::Stepwise(s) => {
                s.tick(&mut arms.means);
                draw(arms, action, rng)?
            }
            Dynamics::TwoContext => {
                if require_context(kind, context)? == 0 {
                    arms.means.iter_mut().for_each(|m| *m = -*m);
                }
                draw(arms, action, rng)?
            }
            Dynamics::ThreeContext => {
                match require_context(kind, context)? {
                    0 => arms.means.sort_by(f64::total_cmp),
                    1 => arms.means.sort_by(|a, b| b.total_cmp(a)),
                    2 => arms.means.shuffle(rng),
                    c => {
                        return Err(Error::InvalidContext {
                            bandit: kind.name(),
                            context: c,
                        })
                    }
                }
                draw(arms, action, rng)?
            }
            Dynamics::MovingAverage(m) => m.record(draw(arms, action, rng)?),
            Dynamics::TimeDelayed(t) => t.record(draw(arms, action, rng)?),
        };
        trace!(bandit = %kind, action, ?context, reward = r, "reward drawn");
        Ok(r)
    }

    pub fn dynamics(&self) -> &Dynamics {
        &self.dynamics
    }

    pub fn kind(&self) -> BanditKind {
        self.dynamics.kind()
    }

    pub fn is_configured(&self) -> bool {
        self.arms.is_some()
    }

    pub fn arm_count(&self) -> Option<usize> {
        self.arms.as_ref().map(|a| a.means.len())
    }

    /// Current means (after any transitions so far).
    pub fn means(&self) -> Option<&[f64]> {
        self.arms.as_ref().map(|a| a.means.as_slice())
    }

    pub fn stds(&self) -> Option<&[f64]> {
        self.arms.as_ref().map(|a| a.stds.as_slice())
    }

    /// Clear history buffers without touching means (see [`Dynamics::clear_history`]).
    pub fn clear_history(&mut self) {
        self.dynamics.clear_history();
    }
}

fn require_context(kind: BanditKind, context: Option<usize>) -> Result<usize> {
    context.ok_or(Error::MissingContext {
        bandit: kind.name(),
    })
}

fn draw<R: Rng + ?Sized>(arms: &ArmTable, action: usize, rng: &mut R) -> Result<f64> {
    let (mean, std) = (arms.means[action], arms.stds[action]);
    let normal = Normal::new(mean, std).map_err(|_| Error::InvalidStd {
        arm: action,
        value: std,
    })?;
    Ok(normal.sample(rng))
}
