//! Editing of custom grading scales.
//!
//! Edits clamp the touched bound to `0..=100` and push only the immediate
//! neighbour out of the way. Overlaps further down the chain are reported by
//! [`validate_scale`] and left for the user to fix.

use crate::core::scale::{GradeRange, GradeScale, classify};
use crate::utils::input::sanitize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Per-range validation messages keyed by range index.
pub type ScaleIssues = BTreeMap<usize, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Min => write!(f, "min"),
            Self::Max => write!(f, "max"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no grade range at index {index} (scale has {len} ranges)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("grade letter must be 1 or 2 characters after sanitizing, got {0:?}")]
    InvalidLetter(String),
}

/// One edit as typed on the command line: `INDEX:min:VALUE`,
/// `INDEX:max:VALUE` or `INDEX:letter:TEXT`.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    SetBound {
        index: usize,
        bound: Bound,
        value: f64,
    },
    Relabel {
        index: usize,
        letter: String,
    },
}

impl FromStr for EditOp {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.splitn(3, ':');
        let (Some(index), Some(field), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("expected INDEX:FIELD:VALUE, got `{raw}`"));
        };

        let index = index
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("invalid range index `{index}`"))?;

        let parse_value = |value: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid percentage `{value}`"))
        };

        match field.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(Self::SetBound {
                index,
                bound: Bound::Min,
                value: parse_value(value)?,
            }),
            "max" => Ok(Self::SetBound {
                index,
                bound: Bound::Max,
                value: parse_value(value)?,
            }),
            "letter" => Ok(Self::Relabel {
                index,
                letter: value.to_string(),
            }),
            other => Err(format!("unknown field `{other}` (expected min, max or letter)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScaleEditor {
    scale: GradeScale,
    issues: ScaleIssues,
}

impl ScaleEditor {
    pub fn new(scale: GradeScale) -> Self {
        let issues = validate_scale(&scale);
        Self { scale, issues }
    }

    pub fn scale(&self) -> &GradeScale {
        &self.scale
    }

    pub fn issues(&self) -> &ScaleIssues {
        &self.issues
    }

    pub fn apply(&mut self, op: &EditOp) -> Result<(), EditError> {
        match op {
            EditOp::SetBound {
                index,
                bound,
                value,
            } => self.update_bound(*index, *bound, *value),
            EditOp::Relabel { index, letter } => self.relabel(*index, letter),
        }
    }

    /// Sets one bound of range `index`, rounded and clamped to `0..=100`.
    ///
    /// Lowering a `min` into the next range pulls that range's `max` down to
    /// `min - 1`; raising a `max` into the previous range pushes its `min` up
    /// to `max + 1`.
    pub fn update_bound(&mut self, index: usize, bound: Bound, value: f64) -> Result<(), EditError> {
        let len = self.scale.len();
        if index >= len {
            return Err(EditError::IndexOutOfRange { index, len });
        }

        let value = if value.is_nan() { 0.0 } else { value };
        let value = value.round().clamp(0.0, 100.0);
        let ranges = self.scale.ranges_mut();

        match bound {
            Bound::Min => {
                ranges[index].min = value;
                if let Some(next) = ranges.get_mut(index + 1)
                    && next.max >= value
                {
                    next.max = (value - 1.0).max(0.0);
                }
            }
            Bound::Max => {
                ranges[index].max = value;
                if index > 0 {
                    let prev = &mut ranges[index - 1];
                    if prev.min <= value {
                        prev.min = (value + 1.0).min(100.0);
                    }
                }
            }
        }

        tracing::debug!(index, %bound, value, "updated grade range bound");
        self.revalidate();
        Ok(())
    }

    pub fn relabel(&mut self, index: usize, letter: &str) -> Result<(), EditError> {
        let len = self.scale.len();
        if index >= len {
            return Err(EditError::IndexOutOfRange { index, len });
        }

        let letter = sanitize(letter);
        if !(1..=2).contains(&letter.chars().count()) {
            return Err(EditError::InvalidLetter(letter));
        }

        self.scale.ranges_mut()[index].letter = letter;
        self.revalidate();
        Ok(())
    }

    pub fn preview(&self, percentage: f64) -> Option<&GradeRange> {
        classify(percentage, &self.scale)
    }

    /// Hands back the edited scale for saving, or the outstanding issues.
    pub fn into_savable(self) -> Result<GradeScale, ScaleIssues> {
        if self.issues.is_empty() {
            Ok(self.scale)
        } else {
            Err(self.issues)
        }
    }

    fn revalidate(&mut self) {
        self.issues = validate_scale(&self.scale);
    }
}

/// Reports, without correcting, ranges that are out of bounds, inverted, or
/// that reach into the preceding (higher) range.
pub fn validate_scale(scale: &GradeScale) -> ScaleIssues {
    let mut issues = ScaleIssues::new();
    let ranges = scale.ranges();

    for (index, range) in ranges.iter().enumerate() {
        let message = if !(0.0..=100.0).contains(&range.min) {
            Some("Minimum percentage must be between 0 and 100")
        } else if !(0.0..=100.0).contains(&range.max) {
            Some("Maximum percentage must be between 0 and 100")
        } else if range.min > range.max {
            Some("Minimum cannot be greater than maximum")
        } else if index > 0 && range.max >= ranges[index - 1].min {
            Some("Grade ranges cannot overlap")
        } else {
            None
        };

        if let Some(message) = message {
            issues.insert(index, message.to_string());
        }
    }

    issues
}
