//! `mabsim`: non-stationary multi-armed bandit environments and counterbalanced
//! hint rotation, for running bandit tasks against an external decision maker
//! (typically a language model).
//!
//! Two leaf components, composed by a small driver:
//!
//! - [`Environment`]: per-arm Gaussian rewards under one of seven [`Dynamics`]
//!   (stationary, drifting, stepwise, two-context, three-context, moving-average,
//!   time-delayed).
//! - [`Rotator`]: cyclically rotates which position holds which arm value and
//!   rewrites hint templates so rank placeholders (`{min}`, `{mid}`, `{max}`, ...)
//!   keep naming the right arm. Rotating positions while holding the hint's
//!   *meaning* fixed separates position bias from value bias.
//!
//! [`run_experiment`] wires them together for an [`ExperimentConfig`]; the agent
//! itself plugs in through [`ArmChooser`].
//!
//! **Goals:**
//! - **Reproducible**: randomness is an explicit `&mut impl Rng` argument, never a
//!   global. Same seed + same call order → same rewards.
//! - **Strict**: unconfigured environments, out-of-range actions, unsupported arm
//!   counts, and unknown placeholders are errors, not silent misbehavior.
//!
//! **Non-goals:**
//! - No bandit-learning policies (UCB, Thompson sampling); the chooser is external.
//! - No model invocation, result files, or plotting.
//!
//! # Example
//!
//! ```rust
//! use mabsim::{run_experiment, BanditKind, ExperimentConfig, TrialView};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut cfg = ExperimentConfig::new(
//!     BanditKind::Stationary,
//!     vec![vec![10.0, 40.0, 70.0]],
//!     vec![4.0, 4.0, 4.0],
//!     vec!["{max} pays the most".to_string()],
//!     1,
//! );
//! cfg.n_iters = 5;
//!
//! // Follow the hint: read the arm number out of "arm N pays the most".
//! let mut follow = |v: &TrialView<'_>| -> Option<usize> {
//!     v.hint.split_whitespace().nth(1)?.parse().ok()
//! };
//! let mut rng = StdRng::seed_from_u64(31825);
//! let records = run_experiment(&cfg, &mut follow, &mut rng).unwrap();
//!
//! // One record per rotation block (3 arms → 3 blocks).
//! assert_eq!(records.len(), 3);
//! for r in &records {
//!     assert!(r.optimal_choices().iter().all(|&hit| hit));
//! }
//! ```

#![forbid(unsafe_code)]

mod error;
pub use error::*;

mod environment;
pub use environment::*;

mod rotator;
pub use rotator::*;

mod config;
pub use config::*;

mod harness;
pub use harness::*;
