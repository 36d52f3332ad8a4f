//! Field-level request validation.

use std::ops::RangeInclusive;

use crate::errors::{AppError, FieldError};

pub const TOKEN_NAME_LEN: RangeInclusive<usize> = 3..=100;
pub const OWNER_NAME_LEN: RangeInclusive<usize> = 2..=255;
pub const BOT_CODE_LEN: RangeInclusive<usize> = 2..=50;
pub const BOT_NAME_LEN: RangeInclusive<usize> = 2..=255;

/// Collects every failing field before reporting, so clients see all
/// problems in one response.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Length is counted in characters, not bytes.
    pub fn length(&mut self, field: &'static str, value: &str, range: RangeInclusive<usize>) -> &mut Self {
        let len = value.chars().count();
        if len < *range.start() {
            self.fail(field, format!("must be at least {} characters", range.start()));
        } else if len > *range.end() {
            self.fail(field, format!("must be at most {} characters", range.end()));
        }
        self
    }

    pub fn length_opt(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        range: RangeInclusive<usize>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.length(field, value, range);
        }
        self
    }

    pub fn check(&mut self, field: &'static str, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.fail(field, message.to_string());
        }
        self
    }

    fn fail(&mut self, field: &'static str, message: String) {
        self.errors.push(FieldError { field, message });
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

pub fn validate_token_name(name: &str) -> Result<(), AppError> {
    Validator::new().length("token_name", name, TOKEN_NAME_LEN).finish()
}
