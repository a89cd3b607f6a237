use once_cell::sync::Lazy;
use regex::Regex;

static MARKUP_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>"'&]"#).expect("valid markup character regex"));

/// Strips `< > " ' &` and surrounding whitespace from free text.
///
/// Characters are removed, not escaped. Numeric fields go through
/// [`parse_count`] or their own clamping instead.
pub fn sanitize(raw: &str) -> String {
    MARKUP_CHARS_RE.replace_all(raw, "").trim().to_string()
}

pub fn validate_percentage(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

pub fn validate_question_count(value: i64) -> bool {
    value > 0
}

/// Parses a whole-number count typed by a user. Anything that is not an
/// integer after sanitizing (including `2.5`) yields `None`.
pub fn parse_count(raw: &str) -> Option<i64> {
    sanitize(raw).parse::<i64>().ok()
}
