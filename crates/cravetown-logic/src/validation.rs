//! Field-level validation issues for authored items.
//!
//! Validation mirrors the editing screens' form rules: every check runs and
//! all failures are returned together, so an author sees the full list.

use thiserror::Error;

/// One failed field check on one item.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationIssue {
    #[error("item id is empty")]
    EmptyId,

    #[error("'{item}': {field} = {value} outside [{min}, {max}]")]
    OutOfRange {
        item: String,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("'{item}': quality tier '{tier}' is both accepted and rejected")]
    ConflictingQualityTier { item: String, tier: String },

    #[error("'{item}': negative multiplier {value} at fine index {index}")]
    NegativeMultiplier { item: String, index: usize, value: f64 },

    #[error("'{item}': trigger field '{field}' is empty")]
    MissingTriggerField { item: String, field: &'static str },

    #[error("'{item}': trigger type '{type_name}' is not recognized")]
    UnrecognizedTrigger { item: String, type_name: String },

    #[error("'{item}': fine dimension '{dimension}' is not defined")]
    UnknownDimension { item: String, dimension: String },

    #[error("'{item}': quality tier '{tier}' is not recognized")]
    UnknownQualityTier { item: String, tier: String },

    #[error("'{item}': non-finite {field} value at index {index}")]
    NonFinite {
        item: String,
        field: &'static str,
        index: usize,
    },
}

/// Push an [`ValidationIssue::OutOfRange`] unless `min <= value <= max`.
pub(crate) fn check_range(
    issues: &mut Vec<ValidationIssue>,
    item: &str,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) {
    if !(min..=max).contains(&value) {
        issues.push(ValidationIssue::OutOfRange {
            item: item.to_string(),
            field,
            value,
            min,
            max,
        });
    }
}

/// Push an issue for the first non-finite entry in `values`.
pub(crate) fn check_finite_values(
    issues: &mut Vec<ValidationIssue>,
    item: &str,
    field: &'static str,
    values: &[f64],
) {
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        issues.push(ValidationIssue::NonFinite {
            item: item.to_string(),
            field,
            index,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_inclusive() {
        let mut issues = Vec::new();
        check_range(&mut issues, "x", "priority", 1.0, 1.0, 10.0);
        check_range(&mut issues, "x", "priority", 10.0, 1.0, 10.0);
        assert!(issues.is_empty());
        check_range(&mut issues, "x", "priority", 11.0, 1.0, 10.0);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].to_string().contains("priority = 11"));
    }

    #[test]
    fn nan_is_out_of_range() {
        let mut issues = Vec::new();
        check_range(&mut issues, "x", "income", f64::NAN, 0.0, f64::MAX);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn first_non_finite_reported() {
        let mut issues = Vec::new();
        check_finite_values(&mut issues, "x", "fine", &[1.0, f64::INFINITY, f64::NAN]);
        assert_eq!(
            issues,
            vec![ValidationIssue::NonFinite {
                item: "x".into(),
                field: "fine",
                index: 1
            }]
        );
    }
}
