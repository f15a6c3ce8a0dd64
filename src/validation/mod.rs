//! Consumption checks and form rules
//!
//! The consumption check compares a candidate value against the trailing
//! average of the meter's previous readings:
//! - negative (or non-numeric) values are rejected outright
//! - values above twice the average are accepted with an advisory warning
//! - without history, any non-negative value is accepted silently

mod forms;

pub use forms::{validate_gasometer_form, validate_reading_form, FieldError};

use crate::format::format_number;
use crate::i18n::I18n;
use serde::{Deserialize, Serialize};

/// A value above `average * SPIKE_FACTOR` is flagged
pub const SPIKE_FACTOR: f64 = 2.0;

/// Outcome of a consumption check. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn invalid(warning: String) -> Self {
        Self {
            is_valid: false,
            warnings: vec![warning],
        }
    }
}

/// Classifies candidate consumption values; messages use the given language
pub struct ConsumptionValidator<'a> {
    i18n: &'a I18n,
}

impl<'a> ConsumptionValidator<'a> {
    pub fn new(i18n: &'a I18n) -> Self {
        Self { i18n }
    }

    /// Check `value` against prior consumption values of the same meter.
    ///
    /// The order of `history` does not matter. Pure: identical inputs give
    /// identical results.
    pub fn validate(&self, value: f64, history: &[f64]) -> ValidationResult {
        if value < 0.0 {
            return ValidationResult::invalid(self.i18n.get("validation.consumption_negative"));
        }
        if !value.is_finite() {
            return ValidationResult::invalid(self.i18n.get("validation.consumption_not_finite"));
        }

        let mut warnings = Vec::new();

        if let Some(average) = mean(history) {
            let threshold = average * SPIKE_FACTOR;

            if value > threshold {
                let percent = ((value / average) * 100.0).round();
                if average > 0.0 && percent.is_finite() {
                    let percent = format_number(self.i18n, percent, 0);
                    warnings.push(
                        self.i18n
                            .format("validation.consumption_high", &[("percent", &percent)]),
                    );
                } else {
                    // Ratio undefined or overflowing: warn without it
                    warnings.push(self.i18n.get("validation.consumption_high_zero_average"));
                }
            }
        }

        ValidationResult {
            is_valid: true,
            warnings,
        }
    }
}

/// Arithmetic mean of the finite values, `None` when there are none
fn mean(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    Some(finite.iter().sum::<f64>() / finite.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORY: [f64; 5] = [10.0, 12.0, 11.0, 9.0, 13.0];

    #[test]
    fn test_negative_is_rejected_regardless_of_history() {
        let i18n = I18n::new("pt");
        let validator = ConsumptionValidator::new(&i18n);

        for history in [&[][..], &HISTORY[..], &[0.0, 0.0][..]] {
            let result = validator.validate(-10.0, history);
            assert!(!result.is_valid);
            assert_eq!(result.warnings, vec!["Consumo n\u{00E3}o pode ser negativo".to_string()]);
        }
    }

    #[test]
    fn test_no_history_no_warnings() {
        let i18n = I18n::new("en");
        let validator = ConsumptionValidator::new(&i18n);

        for value in [0.0, 50.0, 1_000_000.0] {
            let result = validator.validate(value, &[]);
            assert!(result.is_valid);
            assert!(result.warnings.is_empty());
        }
    }

    #[test]
    fn test_spike_warns_with_rounded_percentage() {
        let i18n = I18n::new("en");
        let result = ConsumptionValidator::new(&i18n).validate(25.0, &HISTORY);

        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("227"));
        assert_eq!(result.warnings[0], "Consumption abnormally high (227% of average)");
    }

    #[test]
    fn test_spike_warning_in_portuguese() {
        let i18n = I18n::new("pt");
        let result = ConsumptionValidator::new(&i18n).validate(25.0, &HISTORY);
        assert_eq!(result.warnings, vec!["Consumo muito alto (227% da m\u{00E9}dia)".to_string()]);
    }

    #[test]
    fn test_normal_value_no_warning() {
        let i18n = I18n::new("pt");
        let result = ConsumptionValidator::new(&i18n).validate(15.0, &HISTORY);
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_exactly_twice_average_is_not_a_spike() {
        let i18n = I18n::new("pt");
        let result = ConsumptionValidator::new(&i18n).validate(22.0, &HISTORY);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_history_order_does_not_matter() {
        let i18n = I18n::new("pt");
        let validator = ConsumptionValidator::new(&i18n);
        let mut reversed = HISTORY;
        reversed.reverse();
        assert_eq!(validator.validate(25.0, &HISTORY), validator.validate(25.0, &reversed));
    }

    #[test]
    fn test_zero_average_warns_without_percentage() {
        let i18n = I18n::new("en");
        let validator = ConsumptionValidator::new(&i18n);

        let result = validator.validate(3.0, &[0.0, 0.0, 0.0]);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(!result.warnings[0].contains('%'));
        assert!(!result.warnings[0].contains("inf"));

        assert!(validator.validate(0.0, &[0.0]).warnings.is_empty());
    }

    #[test]
    fn test_overflowing_ratio_warns_without_percentage() {
        let i18n = I18n::new("en");
        let validator = ConsumptionValidator::new(&i18n);
        let expected = i18n.get("validation.consumption_high_zero_average");

        for (value, history) in [(1.0, [1e-309]), (1e307, [0.01])] {
            let result = validator.validate(value, &history);
            assert!(result.is_valid);
            assert_eq!(result.warnings, vec![expected.clone()]);
            assert!(!result.warnings[0].contains('\u{221E}'));
        }
    }

    #[test]
    fn test_non_finite_history_entries_are_ignored() {
        let i18n = I18n::new("en");
        let validator = ConsumptionValidator::new(&i18n);
        let history = [10.0, f64::NAN, 12.0, f64::INFINITY, 11.0, 9.0, 13.0];
        assert_eq!(validator.validate(25.0, &history), validator.validate(25.0, &HISTORY));
        assert!(validator.validate(25.0, &[f64::NAN]).warnings.is_empty());
    }

    #[test]
    fn test_non_finite_value_is_rejected() {
        let i18n = I18n::new("en");
        let validator = ConsumptionValidator::new(&i18n);
        assert!(!validator.validate(f64::NAN, &HISTORY).is_valid);
        assert!(!validator.validate(f64::INFINITY, &[]).is_valid);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let i18n = I18n::new("pt");
        let validator = ConsumptionValidator::new(&i18n);
        assert_eq!(validator.validate(25.0, &HISTORY), validator.validate(25.0, &HISTORY));
    }
}
