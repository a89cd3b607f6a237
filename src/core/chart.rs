use crate::core::engine::calculate_grade;
use crate::core::scale::GradeScale;
use serde::Serialize;

pub const DEFAULT_CHART_LIMIT: u32 = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub wrong: u64,
    pub percentage: f64,
    pub letter: Option<String>,
}

/// Grade for every possible number of wrong answers on a test of `total`
/// questions. Empty when `total` is not positive or exceeds `limit`.
pub fn chart_table(total: i64, limit: u32, scale: &GradeScale) -> Vec<ChartRow> {
    if total <= 0 || total > i64::from(limit) {
        return Vec::new();
    }

    (0..=total)
        .filter_map(|wrong| calculate_grade(total, wrong, scale).ok())
        .map(|result| ChartRow {
            wrong: result.wrong_answers,
            percentage: result.percentage,
            letter: result.grade.map(|mark| mark.letter),
        })
        .collect()
}
