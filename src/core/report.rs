use crate::core::average::{AverageSummary, TestBook};
use crate::core::chart::ChartRow;
use crate::core::editor::ScaleIssues;
use crate::core::engine::{CalculationResult, GradeMark};
use crate::core::scale::{GradeRange, GradeScale};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn format_percentage(percentage: f64, decimals: bool) -> String {
    if decimals {
        format!("{percentage:.2}%")
    } else {
        format!("{}%", percentage.round())
    }
}

fn colored_letter(letter: &str, color: &str) -> String {
    match color {
        "grade-a" => letter.green().bold().to_string(),
        "grade-b" => letter.blue().bold().to_string(),
        "grade-c" => letter.yellow().bold().to_string(),
        "grade-d" => letter.magenta().bold().to_string(),
        "grade-f" => letter.red().bold().to_string(),
        _ => letter.bold().to_string(),
    }
}

fn grade_line(grade: Option<&GradeMark>) -> String {
    match grade {
        Some(mark) => format!(
            "{} {}",
            colored_letter(&mark.letter, &mark.color),
            mark.emoji
        ),
        None => "No Grade Found".dimmed().to_string(),
    }
}

/// JSON envelope shared by every command: either `data` or `error`, never both.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutcome<T: Serialize> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub issues: BTreeMap<String, Vec<String>>,
}

impl<T: Serialize> JsonOutcome<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            issues: BTreeMap::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
            issues: BTreeMap::new(),
        }
    }

    pub fn with_issues(mut self, issues: BTreeMap<String, Vec<String>>) -> Self {
        self.issues = issues;
        self
    }
}

pub fn scale_issues_for_json(issues: &ScaleIssues) -> BTreeMap<String, Vec<String>> {
    issues
        .iter()
        .map(|(index, message)| (index.to_string(), vec![message.clone()]))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationReport<'a> {
    pub result: &'a CalculationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<&'a [ChartRow]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AverageReport<'a> {
    pub tests: &'a TestBook,
    pub summary: &'a AverageSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditReport<'a> {
    pub scale: &'a GradeScale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<ClassificationReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub percentage: f64,
    pub grade: Option<GradeMark>,
}

impl ClassificationReport {
    pub fn new(percentage: f64, grade: Option<&GradeRange>) -> Self {
        Self {
            percentage,
            grade: grade.map(GradeMark::from),
        }
    }
}

pub fn print_calculation(result: &CalculationResult, decimals: bool) {
    println!(
        "Score: {}/{} = {}",
        result.correct_answers,
        result.total_questions,
        format_percentage(result.percentage, decimals)
    );
    println!("Grade: {}", grade_line(result.grade.as_ref()));
    println!(
        "correct: {}  wrong: {}",
        result.correct_answers, result.wrong_answers
    );
}

pub fn print_error(message: &str) {
    println!("{} {}", "ERROR".red().bold(), message);
}

pub fn print_chart(total: u64, rows: &[ChartRow], decimals: bool) {
    println!();
    println!("Grade chart for {} questions", total);
    for row in rows {
        let letter = row.letter.as_deref().unwrap_or("-");
        println!(
            "{:>4} wrong  {:>8}  {}",
            row.wrong,
            format_percentage(row.percentage, decimals),
            letter
        );
    }
}

pub fn print_average(book: &TestBook, summary: &AverageSummary, decimals: bool) {
    let errors = book.errors();

    for test in book.tests() {
        println!(
            "[{}] {}: {}/{} ({})",
            test.id,
            test.name,
            test.score,
            test.max_score,
            format_percentage(test.percentage(), decimals)
        );
        if let Some(messages) = errors.get(&test.id) {
            println!("{} {}", "-> invalid:".yellow(), messages.join(", "));
        }
    }

    println!();
    println!(
        "Average: {} {}",
        format_percentage(summary.average, decimals),
        grade_line(summary.grade.as_ref())
    );
    println!(
        "highest: {}  lowest: {}  points: {}/{}  tests counted: {}",
        format_percentage(summary.highest, decimals),
        format_percentage(summary.lowest, decimals),
        summary.total_score,
        summary.total_max_score,
        summary.counted_tests
    );
}

pub fn print_scale(scale: &GradeScale, issues: &ScaleIssues) {
    for (index, range) in scale.ranges().iter().enumerate() {
        println!(
            "{:>2}  {:<3} {:>5}-{:<5} {}",
            index,
            colored_letter(&range.letter, &range.color),
            range.min,
            range.max,
            range.emoji
        );
        if let Some(message) = issues.get(&index) {
            println!("    {} {}", "->".red(), message);
        }
    }
}

pub fn print_classification(report: &ClassificationReport, decimals: bool) {
    println!(
        "{}: {}",
        format_percentage(report.percentage, decimals),
        grade_line(report.grade.as_ref())
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{CalculationError, calculate_grade};

    #[test]
    fn formats_rounded_and_decimal_percentages() {
        assert_eq!(format_percentage(88.888, false), "89%");
        assert_eq!(format_percentage(88.888, true), "88.89%");
        assert_eq!(format_percentage(100.0, false), "100%");
    }

    #[test]
    fn failure_envelope_has_no_data() {
        let outcome =
            JsonOutcome::<CalculationResult>::failure(CalculationError::InvalidTotal.to_string());
        let json = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "Total questions must be a positive integer");
        assert!(json.get("data").is_none());
        assert!(json.get("issues").is_none());
    }

    #[test]
    fn success_envelope_carries_result() {
        let result = calculate_grade(10, 2, &GradeScale::default()).expect("valid input");
        let report = CalculationReport {
            result: &result,
            chart: None,
        };
        let json = serde_json::to_value(JsonOutcome::success(report)).expect("serialize");
        assert_eq!(json["ok"], true);
        assert_eq!(json["data"]["result"]["grade"]["letter"], "B");
        assert!(json["data"].get("chart").is_none());
    }

    #[test]
    fn scale_issues_are_keyed_by_index() {
        let mut issues = ScaleIssues::new();
        issues.insert(2, "Grade ranges cannot overlap".to_string());
        let json_issues = scale_issues_for_json(&issues);
        assert_eq!(json_issues["2"], vec!["Grade ranges cannot overlap".to_string()]);
    }
}
