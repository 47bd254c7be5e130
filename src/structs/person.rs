use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const NAME_MAX_LENGTH: usize = 100;
pub const MIN_HEIGHT_IN_CM: i32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

/// Stored code and display label for every [`Gender`].
pub static GENDER_CHOICES: [(Gender, &str, &str); 2] = [
    (Gender::Male, "M", "Male"),
    (Gender::Female, "F", "Female"),
];

impl Gender {
    pub fn code(self) -> &'static str {
        Self::choice(self).1
    }

    pub fn label(self) -> &'static str {
        Self::choice(self).2
    }

    pub fn from_code(code: &str) -> Option<Gender> {
        GENDER_CHOICES
            .iter()
            .find(|(_, choice_code, _)| *choice_code == code)
            .map(|(gender, _, _)| *gender)
    }

    fn choice(gender: Gender) -> &'static (Gender, &'static str, &'static str) {
        match gender {
            Gender::Male => &GENDER_CHOICES[0],
            Gender::Female => &GENDER_CHOICES[1],
        }
    }
}

/// The fields a client is allowed to write.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PersonFields {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub height_in_cm: i32,
    pub weight_in_kg: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Person {
    pub id: Uuid,
    pub fields: PersonFields,
    pub created_at: NaiveDate,
    pub updated_at: NaiveDate,
}

impl Person {
    pub fn full_name(&self) -> String {
        full_name(
            &self.fields.first_name,
            self.fields.middle_name.as_deref(),
            &self.fields.last_name,
        )
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.fields.first_name, self.fields.last_name)
    }
}

pub fn full_name(first_name: &str, middle_name: Option<&str>, last_name: &str) -> String {
    match middle_name {
        Some(middle_name) if !middle_name.is_empty() => {
            format!("{first_name} {middle_name} {last_name}")
        }
        _ => format!("{first_name} {last_name}"),
    }
}

/// Calendar date used for `created_at` / `updated_at`.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// A single constraint violation on one field. The message is client-facing.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum FieldError {
    #[error("This field is required.")]
    Required,
    #[error("This field may not be null.")]
    Null,
    #[error("This field may not be blank.")]
    Blank,
    #[error("Not a valid string.")]
    NotAString,
    #[error("Ensure this field has no more than {0} characters.")]
    TooLong(usize),
    #[error("Date has wrong format. Use one of these formats instead: YYYY-MM-DD.")]
    InvalidDate,
    #[error("\"{0}\" is not a valid choice.")]
    InvalidChoice(String),
    #[error("A valid integer is required.")]
    InvalidInteger,
    #[error("A valid number is required.")]
    InvalidNumber,
    #[error("Ensure this value is greater than or equal to {0}.")]
    BelowMinimum(i32),
    #[error("Ensure this value is greater than 0.")]
    NotPositive,
}

/// Required names may not be blank; every name is capped at [`NAME_MAX_LENGTH`].
pub fn check_name(value: &str, allow_blank: bool) -> Result<(), FieldError> {
    if !allow_blank && value.is_empty() {
        return Err(FieldError::Blank);
    }
    if value.chars().count() > NAME_MAX_LENGTH {
        return Err(FieldError::TooLong(NAME_MAX_LENGTH));
    }
    Ok(())
}

pub fn check_height_in_cm(value: i32) -> Result<(), FieldError> {
    if value < MIN_HEIGHT_IN_CM {
        return Err(FieldError::BelowMinimum(MIN_HEIGHT_IN_CM));
    }
    Ok(())
}

pub fn check_weight_in_kg(value: f64) -> Result<(), FieldError> {
    if !value.is_finite() {
        return Err(FieldError::InvalidNumber);
    }
    if value <= 0.0 {
        return Err(FieldError::NotPositive);
    }
    Ok(())
}
