use crate::core::engine::GradeMark;
use crate::core::scale::{GradeScale, classify};
use crate::utils::input::{sanitize, validate_percentage};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AverageError {
    #[error("At least one test is required")]
    LastTest,
    #[error("no test with id {0}")]
    UnknownTest(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestScore {
    pub id: String,
    pub name: String,
    pub score: f64,
    pub max_score: f64,
}

impl TestScore {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score: 0.0,
            max_score: 100.0,
        }
    }

    /// Per-test percentage; zero when the test has no points available.
    pub fn percentage(&self) -> f64 {
        if self.max_score > 0.0 {
            (self.score / self.max_score) * 100.0
        } else {
            0.0
        }
    }
}

pub fn validate_test(test: &TestScore) -> Vec<String> {
    let mut errors = Vec::new();

    if test.name.trim().is_empty() {
        errors.push("Test name is required".to_string());
    }
    if !validate_percentage(test.score) {
        errors.push("Score must be a valid positive number".to_string());
    }
    if !validate_percentage(test.max_score) || test.max_score <= 0.0 {
        errors.push("Max score must be greater than 0".to_string());
    }
    if test.score > test.max_score {
        errors.push("Score cannot exceed max score".to_string());
    }

    errors
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageSummary {
    pub average: f64,
    pub grade: Option<GradeMark>,
    /// Tests with `max_score > 0`, which are the only ones averaged.
    pub counted_tests: usize,
    pub highest: f64,
    pub lowest: f64,
    pub total_score: f64,
    pub total_max_score: f64,
}

/// Points-weighted average: total score over total available points.
pub fn average(tests: &[TestScore], scale: &GradeScale) -> AverageSummary {
    let counted: Vec<&TestScore> = tests.iter().filter(|test| test.max_score > 0.0).collect();
    let counted_score: f64 = counted.iter().map(|test| test.score).sum();
    let counted_max: f64 = counted.iter().map(|test| test.max_score).sum();
    let average = if counted_max > 0.0 {
        (counted_score / counted_max) * 100.0
    } else {
        0.0
    };

    let percentages = tests.iter().map(TestScore::percentage);
    let highest = percentages.clone().fold(None, |acc: Option<f64>, p| {
        Some(acc.map_or(p, |best| best.max(p)))
    });
    let lowest = percentages.fold(None, |acc: Option<f64>, p| {
        Some(acc.map_or(p, |worst| worst.min(p)))
    });

    AverageSummary {
        average,
        grade: classify(average, scale).map(GradeMark::from),
        counted_tests: counted.len(),
        highest: highest.unwrap_or(0.0),
        lowest: lowest.unwrap_or(0.0),
        total_score: tests.iter().map(|test| test.score).sum(),
        total_max_score: tests.iter().map(|test| test.max_score).sum(),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestUpdate {
    pub name: Option<String>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
}

/// The list of tests being averaged. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestBook {
    tests: Vec<TestScore>,
}

impl Default for TestBook {
    fn default() -> Self {
        Self {
            tests: vec![TestScore::new("1", "Test 1")],
        }
    }
}

impl TestBook {
    /// Restores a saved list; an empty one becomes the default single test.
    pub fn from_saved(tests: Vec<TestScore>) -> Self {
        if tests.is_empty() {
            Self::default()
        } else {
            Self { tests }
        }
    }

    pub fn tests(&self) -> &[TestScore] {
        &self.tests
    }

    pub fn add(&mut self) -> &mut TestScore {
        let next_id = self
            .tests
            .iter()
            .filter_map(|test| test.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let name = format!("Test {}", self.tests.len() + 1);
        self.tests.push(TestScore::new(next_id.to_string(), name));
        let last = self.tests.len() - 1;
        &mut self.tests[last]
    }

    /// Applies `update` and returns the test's remaining validation errors.
    pub fn update(&mut self, id: &str, update: TestUpdate) -> Result<Vec<String>, AverageError> {
        let test = self
            .tests
            .iter_mut()
            .find(|test| test.id == id)
            .ok_or_else(|| AverageError::UnknownTest(id.to_string()))?;

        if let Some(name) = update.name {
            test.name = sanitize(&name);
        }
        if let Some(score) = update.score {
            test.score = finite_or_zero(score);
        }
        if let Some(max_score) = update.max_score {
            test.max_score = finite_or_zero(max_score);
        }

        Ok(validate_test(test))
    }

    pub fn remove(&mut self, id: &str) -> Result<TestScore, AverageError> {
        if self.tests.len() <= 1 {
            return Err(AverageError::LastTest);
        }

        let position = self
            .tests
            .iter()
            .position(|test| test.id == id)
            .ok_or_else(|| AverageError::UnknownTest(id.to_string()))?;
        Ok(self.tests.remove(position))
    }

    /// Validation errors for every test that has any, keyed by test id.
    pub fn errors(&self) -> BTreeMap<String, Vec<String>> {
        self.tests
            .iter()
            .map(|test| (test.id.clone(), validate_test(test)))
            .filter(|(_, errors)| !errors.is_empty())
            .collect()
    }

    pub fn summary(&self, scale: &GradeScale) -> AverageSummary {
        average(&self.tests, scale)
    }

    pub fn export(&self, scale: &GradeScale, exported_at: DateTime<Utc>) -> AverageExport<'_> {
        let summary = self.summary(scale);
        AverageExport {
            tests: self
                .tests
                .iter()
                .map(|test| ExportedTest {
                    test,
                    percentage: format!("{:.2}", test.percentage()),
                })
                .collect(),
            average: format!("{:.2}", summary.average),
            grade: summary.grade,
            export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

// NaN and infinities serialize as `null` and would make the saved list unreadable.
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedTest<'a> {
    #[serde(flatten)]
    pub test: &'a TestScore,
    pub percentage: String,
}

/// Snapshot written by `average export`. Percentages are fixed two-decimal strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageExport<'a> {
    pub tests: Vec<ExportedTest<'a>>,
    pub average: String,
    pub grade: Option<GradeMark>,
    pub export_date: String,
}

pub fn export_file_name(exported_at: DateTime<Utc>) -> String {
    format!("grade-average-{}.json", exported_at.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: &str, score: f64, max_score: f64) -> TestScore {
        TestScore {
            id: id.to_string(),
            name: format!("Test {id}"),
            score,
            max_score,
        }
    }

    #[test]
    fn weights_by_available_points() {
        let tests = vec![scored("1", 45.0, 50.0), scored("2", 70.0, 100.0)];
        let summary = average(&tests, &GradeScale::default());
        assert!((summary.average - 76.666_666_666_666_67).abs() < 1e-9);
        assert_eq!(summary.grade.expect("graded").letter, "C");
        assert_eq!(summary.counted_tests, 2);
        assert_eq!(summary.highest, 90.0);
        assert_eq!(summary.lowest, 70.0);
        assert_eq!(summary.total_score, 115.0);
        assert_eq!(summary.total_max_score, 150.0);
    }

    #[test]
    fn skips_tests_without_points() {
        let tests = vec![scored("1", 9.0, 10.0), scored("2", 5.0, 0.0)];
        let summary = average(&tests, &GradeScale::default());
        assert_eq!(summary.average, 90.0);
        assert_eq!(summary.counted_tests, 1);
        assert_eq!(summary.lowest, 0.0);
    }

    #[test]
    fn no_countable_tests_averages_to_zero() {
        let summary = average(&[scored("1", 0.0, 0.0)], &GradeScale::default());
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.grade.expect("graded").letter, "F");
    }

    #[test]
    fn validation_messages() {
        let mut test = scored("1", 120.0, 100.0);
        test.name = "  ".to_string();
        let errors = validate_test(&test);
        assert_eq!(
            errors,
            vec![
                "Test name is required",
                "Score must be a valid positive number",
                "Score cannot exceed max score",
            ]
        );

        assert_eq!(
            validate_test(&scored("2", 0.0, 0.0)),
            vec!["Max score must be greater than 0"]
        );
        assert!(validate_test(&scored("3", 80.0, 100.0)).is_empty());
    }

    #[test]
    fn book_starts_with_one_test_and_keeps_it() {
        let mut book = TestBook::default();
        assert_eq!(book.tests().len(), 1);
        assert_eq!(book.remove("1"), Err(AverageError::LastTest));
    }

    #[test]
    fn add_assigns_next_id_and_name() {
        let mut book = TestBook::default();
        let added = book.add();
        assert_eq!(added.id, "2");
        assert_eq!(added.name, "Test 2");
        assert_eq!(added.max_score, 100.0);

        book.remove("1").expect("remove first");
        let added = book.add();
        assert_eq!(added.id, "3");
        assert_eq!(added.name, "Test 2");
    }

    #[test]
    fn update_sanitizes_name_and_reports_errors() {
        let mut book = TestBook::default();
        let errors = book
            .update(
                "1",
                TestUpdate {
                    name: Some("<Final>".to_string()),
                    score: Some(110.0),
                    ..TestUpdate::default()
                },
            )
            .expect("known test");
        assert_eq!(book.tests()[0].name, "Final");
        assert!(errors.contains(&"Score cannot exceed max score".to_string()));
        assert_eq!(book.errors().len(), 1);

        assert_eq!(
            book.update("9", TestUpdate::default()),
            Err(AverageError::UnknownTest("9".to_string()))
        );
    }

    #[test]
    fn non_finite_scores_become_zero() {
        let mut book = TestBook::default();
        book.add();
        let errors = book
            .update(
                "2",
                TestUpdate {
                    score: Some(f64::NAN),
                    max_score: Some(f64::INFINITY),
                    ..TestUpdate::default()
                },
            )
            .expect("known test");
        assert_eq!(book.tests()[1].score, 0.0);
        assert_eq!(book.tests()[1].max_score, 0.0);
        assert_eq!(errors, vec!["Max score must be greater than 0"]);

        let json = serde_json::to_string(&book).expect("serialize");
        let restored: Vec<TestScore> = serde_json::from_str(&json).expect("reload");
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn export_carries_percentages_grade_and_date() {
        let book = TestBook::from_saved(vec![scored("1", 45.0, 50.0), scored("2", 0.0, 0.0)]);
        let at = DateTime::parse_from_rfc3339("2024-05-06T07:08:09Z")
            .expect("timestamp")
            .with_timezone(&Utc);

        let json = serde_json::to_value(book.export(&GradeScale::default(), at)).expect("serialize");
        assert_eq!(json["tests"][0]["name"], "Test 1");
        assert_eq!(json["tests"][0]["maxScore"], 50.0);
        assert_eq!(json["tests"][0]["percentage"], "90.00");
        assert_eq!(json["tests"][1]["percentage"], "0.00");
        assert_eq!(json["average"], "90.00");
        assert_eq!(json["grade"]["letter"], "A");
        assert_eq!(json["exportDate"], "2024-05-06T07:08:09.000Z");
        assert_eq!(export_file_name(at), "grade-average-2024-05-06.json");
    }

    #[test]
    fn empty_saved_list_restores_default() {
        assert_eq!(TestBook::from_saved(Vec::new()), TestBook::default());
        let saved = vec![scored("7", 1.0, 2.0)];
        assert_eq!(TestBook::from_saved(saved.clone()).tests(), saved.as_slice());
    }

    #[test]
    fn uses_custom_scale() {
        let scale = GradeScale::from(vec![crate::core::scale::GradeRange::new(
            "P", 50.0, 100.0, "pass", "✅",
        )]);
        let summary = average(&[scored("1", 20.0, 100.0)], &scale);
        assert!(summary.grade.is_none());
    }
}
