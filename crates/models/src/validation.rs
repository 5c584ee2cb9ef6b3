//! Field-level validation helpers.
//!
//! A [`Validator`] collects every failing check instead of stopping at the
//! first one, so a client fixing a form sees all problems at once.

use crate::errors::{FieldError, ModelError};

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Required text: non-blank after trimming and within `min..=max` characters.
    pub fn text(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, "must not be blank");
        } else {
            let len = trimmed.chars().count();
            if len < min || len > max {
                self.push(field, format!("length must be between {min} and {max}"));
            }
        }
        self
    }

    /// Optional text: checked only when present.
    pub fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.push(field, format!("length must be at most {max}"));
            }
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_valid_email(value) {
            self.push(field, "must be a valid email");
        }
        self
    }

    pub fn optional_email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            self.email(field, v);
        }
        self
    }

    pub fn url(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_valid_url(value) {
            self.push(field, "must be an http(s) URL or an absolute path");
        }
        self
    }

    pub fn optional_url(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            self.url(field, v);
        }
        self
    }

    /// Records `message` against `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.push(field, message);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(&mut self) -> Result<(), ModelError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ModelError::Invalid(std::mem::take(&mut self.errors)))
        }
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }
}

/// One `@`, non-empty local part, dotted domain without empty labels.
pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    if value.len() > 255 || value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

pub fn is_valid_url(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.strip_prefix("https://").or_else(|| value.strip_prefix("http://")) {
        Some(rest) => !rest.is_empty(),
        None => value.starts_with('/') && !value.starts_with("//"),
    }
}
