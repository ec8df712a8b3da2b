//! Error taxonomy.
//!
//! Every variant is a caller-input bug: nothing here is transient, and nothing is
//! retried. Errors surface at the first call that observes the violation.

/// Errors produced by environments, the rotator, and the experiment driver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A reward was requested before `configure` set arm count, means, and stds.
    #[error("environment is not configured: call configure(arm_count, means, stds) first")]
    UnconfiguredEnvironment,

    /// The action index is outside `[0, arm_count)`.
    #[error("invalid action {action}: environment has {arm_count} arms")]
    InvalidAction { action: usize, arm_count: usize },

    /// Rank placeholders are only defined for 3 and 5 arms.
    #[error("unsupported arm count {0}: rank placeholders exist for 3 or 5 arms only")]
    UnsupportedArmCount(usize),

    /// A template names a placeholder outside the schema for its arm count.
    #[error("malformed hint template {template:?}: unknown placeholder {{{placeholder}}} for {arm_count} arms")]
    MalformedHintTemplate {
        template: String,
        placeholder: String,
        arm_count: usize,
    },

    /// Means or stds do not have exactly `arm_count` entries.
    #[error("shape mismatch: arm_count={arm_count}, means={means}, stds={stds}")]
    ShapeMismatch {
        arm_count: usize,
        means: usize,
        stds: usize,
    },

    /// A standard deviation is negative or non-finite.
    #[error("invalid std {value} for arm {arm}")]
    InvalidStd { arm: usize, value: f64 },

    /// A dynamics or driver parameter is out of its domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// A context-sensitive variant was called without a context.
    #[error("{bandit} bandit requires a context")]
    MissingContext { bandit: &'static str },

    /// The context value is not one the variant defines.
    #[error("invalid context {context} for {bandit} bandit")]
    InvalidContext {
        bandit: &'static str,
        context: usize,
    },

    /// The configured bandit name is not one of the known variants.
    #[error("unknown bandit {0:?}")]
    UnknownBandit(String),

    /// The JSON configuration could not be parsed.
    #[cfg(feature = "serde")]
    #[error("config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
