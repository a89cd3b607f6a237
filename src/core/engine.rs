use crate::core::scale::{GradeRange, GradeScale, classify};
use crate::utils::input::{parse_count, validate_question_count};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CalculationError {
    #[error("Total questions must be a positive integer")]
    InvalidTotal,
    #[error("Wrong answers must be a non-negative integer")]
    InvalidWrong,
    #[error("Wrong answers cannot exceed total questions")]
    WrongExceedsTotal,
}

/// Display fields copied out of the matching [`GradeRange`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeMark {
    pub letter: String,
    pub color: String,
    pub emoji: String,
}

impl From<&GradeRange> for GradeMark {
    fn from(range: &GradeRange) -> Self {
        Self {
            letter: range.letter.clone(),
            color: range.color.clone(),
            emoji: range.emoji.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub total_questions: u64,
    pub wrong_answers: u64,
    pub correct_answers: u64,
    /// Unrounded; formatting belongs to the caller.
    pub percentage: f64,
    /// `None` when the scale has no range for this percentage.
    pub grade: Option<GradeMark>,
}

pub fn calculate_grade(
    total_questions: i64,
    wrong_answers: i64,
    scale: &GradeScale,
) -> Result<CalculationResult, CalculationError> {
    if !validate_question_count(total_questions) {
        return Err(CalculationError::InvalidTotal);
    }
    if wrong_answers < 0 {
        return Err(CalculationError::InvalidWrong);
    }
    if wrong_answers > total_questions {
        return Err(CalculationError::WrongExceedsTotal);
    }

    let correct_answers = total_questions - wrong_answers;
    let percentage = (correct_answers as f64 / total_questions as f64) * 100.0;
    let grade = classify(percentage, scale).map(GradeMark::from);

    tracing::debug!(
        total_questions,
        wrong_answers,
        percentage,
        letter = grade.as_ref().map(|mark| mark.letter.as_str()),
        "calculated grade"
    );

    Ok(CalculationResult {
        total_questions: total_questions.unsigned_abs(),
        wrong_answers: wrong_answers.unsigned_abs(),
        correct_answers: correct_answers.unsigned_abs(),
        percentage,
        grade,
    })
}

/// Same as [`calculate_grade`] for counts typed as text. An empty
/// wrong-answer field counts as zero.
pub fn calculate_from_input(
    total_raw: &str,
    wrong_raw: &str,
    scale: &GradeScale,
) -> Result<CalculationResult, CalculationError> {
    let total = parse_count(total_raw).ok_or(CalculationError::InvalidTotal)?;
    let wrong = if wrong_raw.trim().is_empty() {
        0
    } else {
        parse_count(wrong_raw).ok_or(CalculationError::InvalidWrong)?
    };

    calculate_grade(total, wrong, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_questions_two_wrong_is_a_b() {
        let result = calculate_grade(10, 2, &GradeScale::default()).expect("valid input");
        assert_eq!(result.correct_answers, 8);
        assert_eq!(result.percentage, 80.0);
        let grade = result.grade.expect("graded");
        assert_eq!(grade.letter, "B");
        assert_eq!(grade.color, "grade-b");
        assert_eq!(grade.emoji, "🎯");
    }

    #[test]
    fn more_wrong_than_total_is_rejected() {
        assert_eq!(
            calculate_grade(10, 11, &GradeScale::default()),
            Err(CalculationError::WrongExceedsTotal)
        );
    }

    #[test]
    fn zero_total_is_rejected() {
        assert_eq!(
            calculate_grade(0, 0, &GradeScale::default()),
            Err(CalculationError::InvalidTotal)
        );
    }

    #[test]
    fn total_is_checked_before_wrong() {
        assert_eq!(
            calculate_grade(-1, -1, &GradeScale::default()),
            Err(CalculationError::InvalidTotal)
        );
        assert_eq!(
            calculate_grade(5, -1, &GradeScale::default()),
            Err(CalculationError::InvalidWrong)
        );
    }

    #[test]
    fn perfect_and_zero_scores() {
        let scale = GradeScale::default();
        let perfect = calculate_grade(20, 0, &scale).expect("valid input");
        assert_eq!(perfect.percentage, 100.0);
        assert_eq!(perfect.grade.expect("graded").letter, "A");

        let zero = calculate_grade(20, 20, &scale).expect("valid input");
        assert_eq!(zero.percentage, 0.0);
        assert_eq!(zero.grade.expect("graded").letter, "F");
    }

    #[test]
    fn fractional_percentages_are_not_rounded() {
        let result = calculate_grade(9, 1, &GradeScale::default()).expect("valid input");
        assert!((result.percentage - 88.888_888_888_888_89).abs() < 1e-9);
        assert_eq!(result.grade.expect("graded").letter, "B");
    }

    #[test]
    fn uses_the_scale_passed_in() {
        let scale = GradeScale::from(vec![
            GradeRange::new("P", 50.0, 100.0, "pass", "✅"),
            GradeRange::new("NP", 0.0, 49.0, "fail", "🚫"),
        ]);
        let result = calculate_grade(4, 2, &scale).expect("valid input");
        assert_eq!(result.grade.expect("graded").letter, "P");
    }

    #[test]
    fn gap_in_scale_yields_result_without_grade() {
        let scale = GradeScale::from(vec![GradeRange::new("A", 90.0, 100.0, "grade-a", "🏆")]);
        let result = calculate_grade(10, 5, &scale).expect("valid input");
        assert_eq!(result.percentage, 50.0);
        assert!(result.grade.is_none());
    }

    #[test]
    fn parses_text_input() {
        let scale = GradeScale::default();
        let result = calculate_from_input(" 10 ", "2", &scale).expect("valid input");
        assert_eq!(result.correct_answers, 8);

        let blank_wrong = calculate_from_input("10", "  ", &scale).expect("valid input");
        assert_eq!(blank_wrong.wrong_answers, 0);
    }

    #[test]
    fn rejects_non_integer_text() {
        let scale = GradeScale::default();
        assert_eq!(
            calculate_from_input("2.5", "0", &scale),
            Err(CalculationError::InvalidTotal)
        );
        assert_eq!(
            calculate_from_input("", "0", &scale),
            Err(CalculationError::InvalidTotal)
        );
        assert_eq!(
            calculate_from_input("10", "one", &scale),
            Err(CalculationError::InvalidWrong)
        );
        assert_eq!(
            calculate_from_input("abc", "one", &scale),
            Err(CalculationError::InvalidTotal)
        );
    }

    #[test]
    fn error_messages_are_user_facing() {
        assert_eq!(
            CalculationError::WrongExceedsTotal.to_string(),
            "Wrong answers cannot exceed total questions"
        );
    }

    #[test]
    fn result_snapshot_round_trips_through_json() {
        let result = calculate_grade(12, 3, &GradeScale::default()).expect("valid input");
        let json = serde_json::to_string(&result).expect("serialize");
        assert!(json.contains("\"correctAnswers\":9"));
        let restored: CalculationResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, result);
    }
}
