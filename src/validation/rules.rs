use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

// Separators are stripped before matching.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("phone pattern compiles"));

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").expect("year pattern compiles"));

// Zero-padded calendar date with an optional time part. Rental dates are
// matched as exact strings later, so `2024-3-1` must not slip through.
static ISO8601_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}(T[0-9]{2}:[0-9]{2}(:[0-9]{2}(\.[0-9]+)?)?(Z|[+-][0-9]{2}:[0-9]{2})?)?$")
        .expect("iso8601 pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Every violation found in one request body, in schema order.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[error("{}", self.summary())]
pub struct ValidationErrors {
    pub errors: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|v| v.field.as_str()).collect()
    }

    fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|v| format!("{} {}", v.field, v.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    Alphanumeric,
    MinLength(usize),
    Email,
    MobilePhone,
    Iso8601,
    Year,
}

impl Check {
    fn apply(self, value: &str) -> Option<String> {
        let ok = match self {
            Check::Alphanumeric => !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()),
            Check::MinLength(min) => value.chars().count() >= min,
            Check::Email => EMAIL_RE.is_match(value),
            Check::MobilePhone => is_mobile_phone(value),
            Check::Iso8601 => is_iso8601(value),
            Check::Year => YEAR_RE.is_match(value),
        };
        if ok {
            return None;
        }
        Some(match self {
            Check::Alphanumeric => "must contain only letters and digits".to_string(),
            Check::MinLength(1) => "must not be empty".to_string(),
            Check::MinLength(min) => format!("must be at least {} characters long", min),
            Check::Email => "must be a valid email address".to_string(),
            Check::MobilePhone => "must be a valid phone number".to_string(),
            Check::Iso8601 => "must be an ISO 8601 date".to_string(),
            Check::Year => "must be a four-digit year".to_string(),
        })
    }
}

fn is_mobile_phone(value: &str) -> bool {
    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    PHONE_RE.is_match(&digits)
}

fn is_iso8601(value: &str) -> bool {
    if !ISO8601_RE.is_match(value) {
        return false;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").is_ok()
}

/// Rule chain for one body field. Every field is a JSON string; the chain
/// adds format checks on top.
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    required: bool,
    trim: bool,
    checks: Vec<Check>,
}

impl Field {
    pub fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            trim: false,
            checks: Vec::new(),
        }
    }

    /// Absent or `null` is accepted; a present value must pass every check.
    pub fn optional(name: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn alphanumeric(self) -> Self {
        self.check(Check::Alphanumeric)
    }

    pub fn min_length(self, min: usize) -> Self {
        self.check(Check::MinLength(min))
    }

    pub fn non_empty(self) -> Self {
        self.check(Check::MinLength(1))
    }

    pub fn email(self) -> Self {
        self.check(Check::Email)
    }

    pub fn mobile_phone(self) -> Self {
        self.check(Check::MobilePhone)
    }

    pub fn iso8601(self) -> Self {
        self.check(Check::Iso8601)
    }

    pub fn year(self) -> Self {
        self.check(Check::Year)
    }

    fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    fn validate(&self, body: &mut serde_json::Map<String, Value>, errors: &mut ValidationErrors) {
        let value = match body.get_mut(self.name) {
            Some(Value::Null) | None => {
                if self.required {
                    errors.push(self.name, "is required");
                }
                return;
            }
            Some(value) => value,
        };

        let Value::String(text) = value else {
            errors.push(self.name, "must be a string");
            return;
        };

        if self.trim {
            let trimmed = text.trim();
            if trimmed.len() != text.len() {
                *text = trimmed.to_string();
            }
        }

        for check in &self.checks {
            if let Some(message) = check.apply(text) {
                errors.push(self.name, message);
            }
        }
    }
}

/// Declared shape of a request body.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
    require_any: bool,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            require_any: false,
        }
    }

    /// Patch schema: all fields optional, but at least one must be supplied.
    pub fn partial(fields: Vec<Field>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|f| Field { required: false, ..f })
                .collect(),
            require_any: true,
        }
    }

    /// Runs every rule and collects all violations. Sanitisers (`trim`)
    /// rewrite the body in place.
    pub fn validate(&self, body: &mut Value) -> Result<(), ValidationErrors> {
        let Some(object) = body.as_object_mut() else {
            return Err(ValidationErrors::single("body", "must be a JSON object"));
        };

        let mut errors = ValidationErrors::default();

        if self.require_any
            && !self
                .fields
                .iter()
                .any(|f| object.get(f.name).is_some_and(|v| !v.is_null()))
        {
            let names: Vec<&str> = self.fields.iter().map(|f| f.name).collect();
            errors.push(
                "body",
                format!("at least one of {} must be provided", names.join(", ")),
            );
        }

        for field in &self.fields {
            field.validate(object, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.fields.iter().map(|f| f.name).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}
