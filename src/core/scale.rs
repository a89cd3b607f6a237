use crate::utils::input::validate_percentage;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// One entry of a grading scale. `color` and `emoji` are display tokens
/// and are never interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRange {
    pub letter: String,
    pub min: f64,
    pub max: f64,
    pub color: String,
    pub emoji: String,
}

impl GradeRange {
    pub fn new(
        letter: impl Into<String>,
        min: f64,
        max: f64,
        color: impl Into<String>,
        emoji: impl Into<String>,
    ) -> Self {
        Self {
            letter: letter.into(),
            min,
            max,
            color: color.into(),
            emoji: emoji.into(),
        }
    }

    /// Bounds are whole percentage points: the upper bound covers everything
    /// up to the next point, so 89.99 still falls in a range ending at 89.
    pub fn contains(&self, percentage: f64) -> bool {
        percentage >= self.min && percentage.floor() <= self.max
    }

    /// Shape check applied to scales read back from the store. Ordering and
    /// overlap are deliberately not checked here.
    pub fn is_well_formed(&self) -> bool {
        let letter_len = self.letter.chars().count();
        (1..=2).contains(&letter_len)
            && validate_percentage(self.min)
            && validate_percentage(self.max)
            && !self.color.is_empty()
            && !self.emoji.is_empty()
    }
}

static FALLBACK_GRADE: Lazy<GradeRange> =
    Lazy::new(|| GradeRange::new("F", 0.0, 59.0, "grade-f", "❌"));

/// Grade reported for percentages that are out of range or not a number.
pub fn fallback_grade() -> &'static GradeRange {
    &FALLBACK_GRADE
}

/// Ordered grade ranges. Stored order is significant: lookups take the
/// first range that matches, so overlapping custom scales resolve toward
/// the earlier entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeScale {
    ranges: Vec<GradeRange>,
}

impl Default for GradeScale {
    fn default() -> Self {
        Self {
            ranges: vec![
                GradeRange::new("A", 90.0, 100.0, "grade-a", "🏆"),
                GradeRange::new("B", 80.0, 89.0, "grade-b", "🎯"),
                GradeRange::new("C", 70.0, 79.0, "grade-c", "📈"),
                GradeRange::new("D", 60.0, 69.0, "grade-d", "⚠️"),
                GradeRange::new("F", 0.0, 59.0, "grade-f", "❌"),
            ],
        }
    }
}

impl From<Vec<GradeRange>> for GradeScale {
    fn from(ranges: Vec<GradeRange>) -> Self {
        Self { ranges }
    }
}

impl GradeScale {
    pub fn ranges(&self) -> &[GradeRange] {
        &self.ranges
    }

    pub fn ranges_mut(&mut self) -> &mut [GradeRange] {
        &mut self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn is_well_formed(&self) -> bool {
        self.ranges.iter().all(GradeRange::is_well_formed)
    }

    /// First range containing `percentage`, in stored order.
    pub fn find(&self, percentage: f64) -> Option<&GradeRange> {
        self.ranges.iter().find(|range| range.contains(percentage))
    }
}

/// Classifies a percentage against `scale`.
///
/// Out-of-range or NaN input yields the fallback "F" grade instead of an
/// error. `None` means the scale has a gap at this percentage, which is a
/// normal outcome ("no grade").
pub fn classify(percentage: f64, scale: &GradeScale) -> Option<&GradeRange> {
    if !validate_percentage(percentage) {
        return Some(fallback_grade());
    }

    scale.find(percentage)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn default_scale_covers_every_valid_percentage(value in 0.0..=100.0f64) {
            prop_assert!(classify(value, &GradeScale::default()).is_some());
        }

        #[test]
        fn classification_never_panics_on_any_input(value in proptest::num::f64::ANY) {
            let _ = classify(value, &GradeScale::default());
        }

        #[test]
        fn serialized_scale_classifies_identically(
            bounds in proptest::collection::vec((0u8..=100, 0u8..=100), 1..8)
        ) {
            let scale = GradeScale::from(
                bounds
                    .iter()
                    .enumerate()
                    .map(|(idx, (a, b))| {
                        let (min, max) = if a <= b { (*a, *b) } else { (*b, *a) };
                        GradeRange::new(format!("{idx}"), f64::from(min), f64::from(max), "c", "e")
                    })
                    .collect::<Vec<_>>(),
            );
            let json = serde_json::to_string(&scale).expect("serialize");
            let restored: GradeScale = serde_json::from_str(&json).expect("deserialize");
            for percentage in 0..=100 {
                let value = f64::from(percentage);
                prop_assert_eq!(
                    classify(value, &scale).map(|r| r.letter.clone()),
                    classify(value, &restored).map(|r| r.letter.clone())
                );
            }
        }
    }
}
