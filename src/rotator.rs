//! Counterbalancing arm rotation with rank-bound hint rewriting.
//!
//! A [`Rotator`] cycles which physical position holds which true arm value, and
//! rewrites hint templates so every rank placeholder keeps naming the arm with
//! that *rank*, wherever it now sits. This separates position bias from value bias.
//!
//! Placeholder schemas are a fixed table keyed by arm count (ranks low → high):
//!
//! | arms | placeholders |
//! |---|---|
//! | 3 | `{min}` `{mid}` `{max}` |
//! | 5 | `{min2}` `{min1}` `{mid}` `{max1}` `{max2}` |
//!
//! Any other arm count is rejected, as is any `{...}` token outside the schema.

use tracing::debug;

use crate::{Error, Result};

/// Rank placeholders for 3-arm configurations, lowest rank first.
pub const THREE_ARM_PLACEHOLDERS: [&str; 3] = ["min", "mid", "max"];
/// Rank placeholders for 5-arm configurations, lowest rank first.
pub const FIVE_ARM_PLACEHOLDERS: [&str; 5] = ["min2", "min1", "mid", "max1", "max2"];

/// Look up the placeholder names for `arm_count`, indexed by rank (0 = lowest value).
pub fn placeholder_schema(arm_count: usize) -> Result<&'static [&'static str]> {
    match arm_count {
        3 => Ok(&THREE_ARM_PLACEHOLDERS),
        5 => Ok(&FIVE_ARM_PLACEHOLDERS),
        n => Err(Error::UnsupportedArmCount(n)),
    }
}

/// 1-indexed position of each rank: `out[r]` is where the `r`-th smallest value sits.
///
/// Ties keep their positional order (stable sort).
pub fn rank_positions(arms: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..arms.len()).collect();
    idx.sort_by(|&a, &b| arms[a].total_cmp(&arms[b]));
    idx.into_iter().map(|i| i + 1).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Rank(usize),
}

/// A hint template parsed against one placeholder schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl HintTemplate {
    /// Parse `source`, resolving every `{name}` to a rank in `schema`.
    ///
    /// An unknown name, or a `{` with no closing `}`, fails with
    /// [`Error::MalformedHintTemplate`].
    pub fn parse(source: &str, schema: &[&str]) -> Result<Self> {
        let malformed = |placeholder: &str| Error::MalformedHintTemplate {
            template: source.to_string(),
            placeholder: placeholder.to_string(),
            arm_count: schema.len(),
        };

        let mut segments = Vec::new();
        let mut rest = source;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| malformed(after))?;
            let name = &after[..close];
            let rank = schema
                .iter()
                .position(|p| *p == name)
                .ok_or_else(|| malformed(name))?;
            segments.push(Segment::Rank(rank));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The unsubstituted template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True if the template names at least one rank.
    pub fn has_placeholders(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Rank(_)))
    }

    /// Substitute each rank with `"arm <position>"` using `positions` from [`rank_positions`].
    pub fn render(&self, positions: &[usize]) -> String {
        let mut out = String::with_capacity(self.source.len());
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => out.push_str(s),
                Segment::Rank(r) => {
                    out.push_str("arm ");
                    out.push_str(&positions[*r].to_string());
                }
            }
        }
        out
    }
}

/// One rotation block: the physical arm order and its rank-correct hints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rotation {
    /// Rotation count after the advance that produced this block (1-based).
    pub step_index: usize,
    pub arms: Vec<f64>,
    /// Substituted hints, aligned with the rotator's templates.
    pub hints: Vec<String>,
}

/// Cyclic arm rotator with rank-bound hint substitution.
///
/// # Example
///
/// ```rust
/// use mabsim::Rotator;
///
/// let mut rot = Rotator::new(vec![10.0, 40.0, 70.0], &["{min}, {mid}, {max}"]).unwrap();
/// let block = rot.advance();
/// assert_eq!(block.arms, vec![70.0, 10.0, 40.0]);
/// assert_eq!(block.hints, vec!["arm 2, arm 3, arm 1".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Rotator {
    arms: Vec<f64>,
    templates: Vec<HintTemplate>,
    step_index: usize,
}

impl Rotator {
    /// Build a rotator over `arms` (3 or 5 values) and hint templates.
    pub fn new<S: AsRef<str>>(arms: Vec<f64>, hints: &[S]) -> Result<Self> {
        let schema = placeholder_schema(arms.len())?;
        let templates = hints
            .iter()
            .map(|h| HintTemplate::parse(h.as_ref(), schema))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            arms,
            templates,
            step_index: 0,
        })
    }

    /// Rotate right by one, then derive hints for the new arrangement.
    pub fn advance(&mut self) -> Rotation {
        self.arms.rotate_right(1);
        self.step_index += 1;
        let hints = self.render_hints();
        debug!(step = self.step_index, arms = ?self.arms, "rotated arms");
        Rotation {
            step_index: self.step_index,
            arms: self.arms.clone(),
            hints,
        }
    }

    /// Hints substituted for the *current* arrangement, without rotating.
    pub fn render_hints(&self) -> Vec<String> {
        let positions = rank_positions(&self.arms);
        self.templates.iter().map(|t| t.render(&positions)).collect()
    }

    pub fn arms(&self) -> &[f64] {
        &self.arms
    }

    pub fn templates(&self) -> &[HintTemplate] {
        &self.templates
    }

    /// Number of advances taken so far.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Number of advances after which the arm order repeats.
    pub fn period(&self) -> usize {
        self.arms.len()
    }

    /// Position within the current cycle (`step_index % period`).
    pub fn phase(&self) -> usize {
        self.step_index % self.period()
    }

    /// True once every position has held every value (one full cycle taken).
    pub fn cycle_complete(&self) -> bool {
        self.step_index >= self.period()
    }

    /// Advance until one full cycle has been taken, returning each block.
    pub fn remaining_cycle(&mut self) -> Vec<Rotation> {
        let mut out = Vec::new();
        while !self.cycle_complete() {
            out.push(self.advance());
        }
        out
    }
}
