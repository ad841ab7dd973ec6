use std::sync::OnceLock;

use regex::Regex;

use tabmimic_core::SemanticKind;

/// Reference patterns in detection priority order.
const REFERENCE_PATTERNS: [(SemanticKind, &str); 3] = [
    (
        SemanticKind::FullNameUpper,
        r"^[А-ЯЁ]+(-[А-ЯЁ]+)? [А-ЯЁ]+ [А-ЯЁ]+$",
    ),
    (
        SemanticKind::FullNameTitleCase,
        r"^[А-ЯЁ][а-яё]+(-[А-ЯЁ][а-яё]+)? [А-ЯЁ][а-яё]+ [А-ЯЁ][а-яё]+$",
    ),
    (
        SemanticKind::Email,
        r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$",
    ),
];

fn reference_regexes() -> &'static [(SemanticKind, Regex)] {
    static REGEXES: OnceLock<Vec<(SemanticKind, Regex)>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        REFERENCE_PATTERNS
            .iter()
            .filter_map(|(kind, pattern)| Regex::new(pattern).ok().map(|regex| (*kind, regex)))
            .collect()
    })
}

/// Share of `values` matching the reference pattern of `kind`.
pub fn match_ratio<S: AsRef<str>>(values: &[S], kind: SemanticKind) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let Some((_, regex)) = reference_regexes().iter().find(|(k, _)| *k == kind) else {
        return 0.0;
    };
    let matched = values
        .iter()
        .filter(|value| regex.is_match(value.as_ref()))
        .count();
    matched as f64 / values.len() as f64
}

/// First semantic kind whose match ratio is strictly greater than
/// `threshold`.
pub fn detect_semantic_kind<S: AsRef<str>>(values: &[S], threshold: f64) -> Option<SemanticKind> {
    reference_regexes()
        .iter()
        .map(|(kind, _)| *kind)
        .find(|kind| match_ratio(values, *kind) > threshold)
}
