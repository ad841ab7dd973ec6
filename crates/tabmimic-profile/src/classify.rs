use std::collections::HashSet;

use tabmimic_core::{DeclaredType, ProfileOptions, Strategy, StrategyKind, Value};

use crate::semantic::detect_semantic_kind;

/// Ratios that drive classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Distinct/non-null ratio below which a column is categorical.
    pub categorical: f64,
    /// Match ratio a semantic reference pattern must exceed.
    pub semantic: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            categorical: 0.2,
            semantic: 0.8,
        }
    }
}

impl From<&ProfileOptions> for Thresholds {
    fn from(options: &ProfileOptions) -> Self {
        Self {
            categorical: options.categorical_threshold,
            semantic: options.semantic_threshold,
        }
    }
}

/// Caller decision for one column, applied before any inference.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOverride {
    /// Fully parameterized strategy used verbatim.
    Fixed(Strategy),
    Categorical,
    /// Estimate a density; `midnight` truncates timestamp output to the day.
    Continuous { midnight: bool },
    FreeText,
}

impl ColumnOverride {
    pub fn kind(&self) -> StrategyKind {
        match self {
            ColumnOverride::Fixed(strategy) => strategy.kind(),
            ColumnOverride::Categorical => StrategyKind::Categorical,
            ColumnOverride::Continuous { .. } => StrategyKind::Continuous,
            ColumnOverride::FreeText => StrategyKind::FreeTextRegex,
        }
    }
}

/// Pick the strategy for a sampled column. The first matching rule wins:
///
/// 1. a caller override;
/// 2. decimal-family types are continuous, or explicit null with at most
///    one distinct value;
/// 3. booleans, columns with at most one distinct value and columns whose
///    distinct/non-null ratio is under the threshold are categorical;
/// 4. textual types are semantic text when a reference pattern matches
///    often enough, free text otherwise;
/// 5. everything else is continuous.
pub fn classify(
    sample: &[Value],
    declared: &DeclaredType,
    column_override: Option<&ColumnOverride>,
    thresholds: &Thresholds,
) -> StrategyKind {
    if let Some(column_override) = column_override {
        return column_override.kind();
    }

    let non_null: Vec<&Value> = sample.iter().filter(|value| !value.is_null()).collect();
    let distinct = non_null.iter().collect::<HashSet<_>>().len();

    if declared.is_decimal_family() {
        return if distinct <= 1 {
            StrategyKind::ExplicitNull
        } else {
            StrategyKind::Continuous
        };
    }

    if matches!(declared, DeclaredType::Boolean)
        || distinct <= 1
        || (distinct as f64 / non_null.len() as f64) < thresholds.categorical
    {
        return StrategyKind::Categorical;
    }

    if declared.is_textual() {
        let rendered: Vec<String> = non_null.iter().filter_map(|value| value.render()).collect();
        return match detect_semantic_kind(&rendered, thresholds.semantic) {
            Some(kind) => StrategyKind::SemanticText(kind),
            None => StrategyKind::FreeTextRegex,
        };
    }

    StrategyKind::Continuous
}

#[cfg(test)]
mod tests {
    use tabmimic_core::SemanticKind;

    use super::*;

    fn ints(values: impl IntoIterator<Item = i64>) -> Vec<Value> {
        values.into_iter().map(Value::Int).collect()
    }

    #[test]
    fn override_wins_over_inference() {
        let sample = ints(0..100);
        let kind = classify(
            &sample,
            &DeclaredType::Int,
            Some(&ColumnOverride::Fixed(Strategy::IncrementalId)),
            &Thresholds::default(),
        );
        assert_eq!(kind, StrategyKind::IncrementalId);

        let kind = classify(
            &sample,
            &DeclaredType::Int,
            Some(&ColumnOverride::Categorical),
            &Thresholds::default(),
        );
        assert_eq!(kind, StrategyKind::Categorical);
    }

    #[test]
    fn decimal_family_is_never_categorical() {
        let declared = DeclaredType::Decimal {
            precision: 10,
            scale: 2,
        };
        let few = vec![Value::Float(1.0), Value::Float(2.0), Value::Float(1.0)];
        let few: Vec<Value> = few.into_iter().cycle().take(300).collect();
        assert_eq!(
            classify(&few, &declared, None, &Thresholds::default()),
            StrategyKind::Continuous
        );

        let constant = vec![Value::Float(1.0), Value::Null];
        assert_eq!(
            classify(&constant, &DeclaredType::Double, None, &Thresholds::default()),
            StrategyKind::ExplicitNull
        );
    }

    #[test]
    fn low_cardinality_is_categorical() {
        let sample: Vec<Value> = ints([1, 2, 3]).into_iter().cycle().take(30).collect();
        assert_eq!(
            classify(&sample, &DeclaredType::Int, None, &Thresholds::default()),
            StrategyKind::Categorical
        );
        assert_eq!(
            classify(&[Value::Null], &DeclaredType::Int, None, &Thresholds::default()),
            StrategyKind::Categorical
        );
        let booleans = vec![Value::Bool(true), Value::Bool(false)];
        assert_eq!(
            classify(&booleans, &DeclaredType::Boolean, None, &Thresholds::default()),
            StrategyKind::Categorical
        );
    }

    #[test]
    fn high_cardinality_numbers_are_continuous() {
        assert_eq!(
            classify(&ints(0..50), &DeclaredType::Int, None, &Thresholds::default()),
            StrategyKind::Continuous
        );
    }

    #[test]
    fn textual_columns_try_semantic_detection_first() {
        let emails: Vec<Value> = (0..20)
            .map(|idx| Value::Text(format!("person{idx}@mail.ru")))
            .collect();
        assert_eq!(
            classify(&emails, &DeclaredType::String, None, &Thresholds::default()),
            StrategyKind::SemanticText(SemanticKind::Email)
        );

        let codes: Vec<Value> = (0..20).map(|idx| Value::Text(format!("A-{idx:03}"))).collect();
        assert_eq!(
            classify(&codes, &DeclaredType::Varchar(Some(8)), None, &Thresholds::default()),
            StrategyKind::FreeTextRegex
        );
    }
}
