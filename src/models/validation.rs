//! Form input validation.
//!
//! These checks mirror what the input types of the web admin forms enforce:
//! required fields, numeric inputs with a step, date inputs and email inputs.
//! Business rules belong to the server.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

lazy_static! {
    /// Same shape the browser accepts for `type="email"`
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?)*$"
    ).unwrap();
}

pub const REQUIRED_MESSAGE: &str = "Campo obrigatório";

/// Field-level validation failures, keyed by wire field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut builder = ValidationErrorBuilder::new();
        builder.add(field, message);
        builder.into_errors()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Builder for collecting multiple validation errors
#[derive(Debug, Default)]
pub struct ValidationErrorBuilder {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Record the outcome of a validator for a field
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn into_errors(self) -> ValidationErrors {
        ValidationErrors {
            errors: self.errors,
        }
    }

    /// Return Ok(()) if no errors, or Err(ValidationErrors) otherwise
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.into_errors())
        }
    }
}

/// Validate a required text input
pub fn validate_required(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(REQUIRED_MESSAGE.to_string());
    }
    Ok(trimmed.to_string())
}

/// Validate a `type="number"` input with `step` and a lower bound.
///
/// A comma is accepted as decimal separator.
pub fn validate_decimal(value: &str, step: f64, min: f64) -> Result<f64, String> {
    let raw = validate_required(value)?;
    let number: f64 = raw
        .replace(',', ".")
        .parse()
        .map_err(|_| "Informe um número válido".to_string())?;

    if !number.is_finite() {
        return Err("Informe um número válido".to_string());
    }

    if number < min {
        return Err(format!("O valor deve ser maior ou igual a {}", min));
    }

    // Rounding error grows with the magnitude of the quotient
    let steps = number / step;
    let tolerance = (steps.abs() * f64::EPSILON * 8.0).max(1e-6);
    if (steps - steps.round()).abs() > tolerance {
        return Err(format!("O valor deve ser múltiplo de {}", step));
    }

    Ok(number)
}

/// Validate an integer input (e.g. a foreign key picked from a select)
pub fn validate_integer(value: &str) -> Result<i64, String> {
    let raw = validate_required(value)?;
    raw.parse()
        .map_err(|_| "Informe um número inteiro válido".to_string())
}

/// Validate a `type="date"` input (YYYY-MM-DD)
pub fn validate_date(value: &str) -> Result<NaiveDate, String> {
    let raw = validate_required(value)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| "Data inválida (use AAAA-MM-DD)".to_string())
}

/// Validate an optional `type="email"` input
pub fn validate_optional_email(value: &str) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    if trimmed.len() > 254 || !EMAIL_REGEX.is_match(trimmed) {
        return Err("Email inválido".to_string());
    }

    Ok(())
}
