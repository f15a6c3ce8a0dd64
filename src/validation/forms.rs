//! Field rules for the meter and reading forms

use crate::core::{GasometerForm, ReadingForm};
use crate::format::parse_timestamp;
use crate::i18n::I18n;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest consumption accepted by the reading form (m³)
pub const MAX_CONSUMPTION: f64 = 999_999.0;

const MAX_IDENTIFICADOR_LEN: usize = 50;
const MAX_DESCRICAO_LEN: usize = 200;
const MAX_LOCALIZACAO_LEN: usize = 100;

/// A rule violation attached to one form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: String) -> Self {
        Self {
            field: field.to_string(),
            message,
        }
    }
}

/// Check a reading before submission. `now` bounds the measurement time.
pub fn validate_reading_form(
    i18n: &I18n,
    form: &ReadingForm,
    now: DateTime<Utc>,
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if form.gasometro < 1 {
        errors.push(FieldError::new("gasometro", i18n.get("form.gasometro_required")));
    }

    if form.data_leitura.trim().is_empty() {
        errors.push(FieldError::new("data_leitura", i18n.get("form.data_leitura_required")));
    } else {
        match parse_timestamp(&form.data_leitura) {
            None => errors.push(FieldError::new("data_leitura", i18n.get("form.data_leitura_invalid"))),
            Some(measured) if measured > now => {
                errors.push(FieldError::new("data_leitura", i18n.get("form.data_leitura_future")))
            }
            Some(_) => {}
        }
    }

    if form.consumo < 0.0 {
        errors.push(FieldError::new("consumo", i18n.get("validation.consumption_negative")));
    } else if !form.consumo.is_finite() {
        errors.push(FieldError::new("consumo", i18n.get("validation.consumption_not_finite")));
    } else if form.consumo > MAX_CONSUMPTION {
        errors.push(FieldError::new("consumo", i18n.get("form.consumo_too_high")));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Check a meter before submission
pub fn validate_gasometer_form(i18n: &I18n, form: &GasometerForm) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    let fields = [
        ("identificador", &form.identificador, MAX_IDENTIFICADOR_LEN),
        ("descricao", &form.descricao, MAX_DESCRICAO_LEN),
        ("localizacao", &form.localizacao, MAX_LOCALIZACAO_LEN),
    ];

    for (field, value, max_len) in fields {
        let value = value.trim();
        if value.is_empty() {
            errors.push(FieldError::new(field, i18n.get(&format!("form.{}_required", field))));
        } else if value.chars().count() > max_len {
            errors.push(FieldError::new(field, i18n.get(&format!("form.{}_too_long", field))));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GasometerStatus;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 22, 12, 0, 0).unwrap()
    }

    fn reading(data_leitura: &str, consumo: f64) -> ReadingForm {
        ReadingForm {
            gasometro: 1,
            data_leitura: data_leitura.to_string(),
            consumo,
            observacao: None,
        }
    }

    #[test]
    fn test_valid_reading() {
        let i18n = I18n::new("pt");
        assert!(validate_reading_form(&i18n, &reading("2024-01-21T10:00", 12.5), now()).is_ok());
    }

    #[test]
    fn test_future_reading_rejected() {
        let i18n = I18n::new("en");
        let errors = validate_reading_form(&i18n, &reading("2024-01-23T10:00:00Z", 1.0), now()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "data_leitura");
        assert_eq!(errors[0].message, "Reading date cannot be in the future");
    }

    #[test]
    fn test_reading_collects_every_error() {
        let i18n = I18n::new("en");
        let form = ReadingForm {
            gasometro: 0,
            data_leitura: "yesterday".into(),
            consumo: -1.0,
            observacao: None,
        };
        let errors = validate_reading_form(&i18n, &form, now()).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["gasometro", "data_leitura", "consumo"]);
    }

    #[test]
    fn test_consumption_upper_bound() {
        let i18n = I18n::new("pt");
        assert!(validate_reading_form(&i18n, &reading("2024-01-21", MAX_CONSUMPTION), now()).is_ok());
        let errors = validate_reading_form(&i18n, &reading("2024-01-21", 1_000_000.0), now()).unwrap_err();
        assert_eq!(errors[0].message, "Consumo muito alto");
    }

    #[test]
    fn test_gasometer_form_rules() {
        let i18n = I18n::new("pt");
        let mut form = GasometerForm {
            identificador: "GM-AC-004".into(),
            descricao: "Medidor do subsolo".into(),
            localizacao: "Bloco D".into(),
            status: GasometerStatus::Ativo,
        };
        assert!(validate_gasometer_form(&i18n, &form).is_ok());

        form.identificador = "   ".into();
        form.localizacao = "x".repeat(101);
        let errors = validate_gasometer_form(&i18n, &form).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "Identificador \u{00E9} obrigat\u{00F3}rio");
        assert_eq!(errors[1].field, "localizacao");
    }
}
