use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::person::{
    check_height_in_cm, check_name, check_weight_in_kg, FieldError, Gender, Person, PersonFields,
};

/// Client-writable keys. Anything else in an inbound body, including the
/// server-owned keys in [`SERVER_FIELDS`], is ignored.
pub const WRITABLE_FIELDS: [&str; 7] = [
    "first_name",
    "last_name",
    "middle_name",
    "birth_date",
    "gender",
    "height_in_cm",
    "weight_in_kg",
];

pub const SERVER_FIELDS: [&str; 4] = ["id", "created_at", "updated_at", "full_name"];

const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Default, Deserialize)]
pub struct SearchPersonQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PersonBody {
    pub id: Uuid,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub height_in_cm: i32,
    pub weight_in_kg: f64,
    pub created_at: NaiveDate,
    pub updated_at: NaiveDate,
}

impl From<Person> for PersonBody {
    fn from(person: Person) -> Self {
        let full_name = person.full_name();
        let PersonFields {
            first_name,
            last_name,
            middle_name,
            birth_date,
            gender,
            height_in_cm,
            weight_in_kg,
        } = person.fields;

        PersonBody {
            id: person.id,
            full_name,
            first_name,
            last_name,
            middle_name,
            birth_date,
            gender,
            height_in_cm,
            weight_in_kg,
            created_at: person.created_at,
            updated_at: person.updated_at,
        }
    }
}

/// Every violation found in an inbound body, keyed by field name.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, error: impl fmt::Display) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(error.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields().collect::<Vec<_>>();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// A partial update: `None` means "not supplied, keep the stored value".
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PersonPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<Option<String>>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub height_in_cm: Option<i32>,
    pub weight_in_kg: Option<f64>,
}

impl PersonPatch {
    pub fn is_empty(&self) -> bool {
        *self == PersonPatch::default()
    }

    pub fn apply(self, current: &PersonFields) -> PersonFields {
        PersonFields {
            first_name: self
                .first_name
                .unwrap_or_else(|| current.first_name.clone()),
            last_name: self.last_name.unwrap_or_else(|| current.last_name.clone()),
            middle_name: self
                .middle_name
                .unwrap_or_else(|| current.middle_name.clone()),
            birth_date: self.birth_date.unwrap_or(current.birth_date),
            gender: self.gender.unwrap_or(current.gender),
            height_in_cm: self.height_in_cm.unwrap_or(current.height_in_cm),
            weight_in_kg: self.weight_in_kg.unwrap_or(current.weight_in_kg),
        }
    }
}

/// Inbound conversion for create: every required field must be present.
pub fn fields_from_json(body: &Value) -> Result<PersonFields, ValidationErrors> {
    let mut reader = PayloadReader::new(body, Presence::Required)?;
    let patch = reader.read_patch();

    match patch {
        PersonPatch {
            first_name: Some(first_name),
            last_name: Some(last_name),
            middle_name,
            birth_date: Some(birth_date),
            gender: Some(gender),
            height_in_cm: Some(height_in_cm),
            weight_in_kg: Some(weight_in_kg),
        } if reader.errors.is_empty() => Ok(PersonFields {
            first_name,
            last_name,
            middle_name: middle_name.flatten(),
            birth_date,
            gender,
            height_in_cm,
            weight_in_kg,
        }),
        _ => Err(reader.errors),
    }
}

/// Inbound conversion for full update: every required field must be present.
/// An omitted `middle_name` stays `None` so it keeps the stored value on apply.
pub fn replacement_from_json(body: &Value) -> Result<PersonPatch, ValidationErrors> {
    let mut reader = PayloadReader::new(body, Presence::Required)?;
    let patch = reader.read_patch();
    reader.finish(patch)
}

/// Inbound conversion for partial update: only supplied fields are checked.
pub fn patch_from_json(body: &Value) -> Result<PersonPatch, ValidationErrors> {
    let mut reader = PayloadReader::new(body, Presence::Optional)?;
    let patch = reader.read_patch();
    reader.finish(patch)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Presence {
    Required,
    Optional,
}

struct PayloadReader<'a> {
    object: &'a Map<String, Value>,
    presence: Presence,
    errors: ValidationErrors,
}

impl<'a> PayloadReader<'a> {
    fn new(body: &'a Value, presence: Presence) -> Result<Self, ValidationErrors> {
        match body {
            Value::Object(object) => Ok(PayloadReader {
                object,
                presence,
                errors: ValidationErrors::default(),
            }),
            other => {
                let mut errors = ValidationErrors::default();
                errors.add(
                    NON_FIELD_ERRORS,
                    format!(
                        "Invalid data. Expected a dictionary, but got {}.",
                        json_type_name(other)
                    ),
                );
                Err(errors)
            }
        }
    }

    fn read_patch(&mut self) -> PersonPatch {
        PersonPatch {
            first_name: self.field("first_name", self.presence, parse_required_name),
            last_name: self.field("last_name", self.presence, parse_required_name),
            middle_name: self.field("middle_name", Presence::Optional, parse_optional_name),
            birth_date: self.field("birth_date", self.presence, parse_date),
            gender: self.field("gender", self.presence, parse_gender),
            height_in_cm: self.field("height_in_cm", self.presence, parse_height),
            weight_in_kg: self.field("weight_in_kg", self.presence, parse_weight),
        }
    }

    fn finish(self, patch: PersonPatch) -> Result<PersonPatch, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(patch)
        } else {
            Err(self.errors)
        }
    }

    fn field<T>(
        &mut self,
        name: &'static str,
        presence: Presence,
        parse: impl FnOnce(&Value) -> Result<T, FieldError>,
    ) -> Option<T> {
        match self.object.get(name) {
            Some(value) => match parse(value) {
                Ok(parsed) => Some(parsed),
                Err(error) => {
                    self.errors.add(name, error);
                    None
                }
            },
            None => {
                if presence == Presence::Required {
                    self.errors.add(name, FieldError::Required);
                }
                None
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn parse_text(value: &Value) -> Result<Option<String>, FieldError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text.trim().to_owned())),
        Value::Number(number) => Ok(Some(number.to_string())),
        _ => Err(FieldError::NotAString),
    }
}

fn parse_required_name(value: &Value) -> Result<String, FieldError> {
    let name = parse_text(value)?.ok_or(FieldError::Null)?;
    check_name(&name, false)?;
    Ok(name)
}

fn parse_optional_name(value: &Value) -> Result<Option<String>, FieldError> {
    let name = parse_text(value)?;
    if let Some(name) = &name {
        check_name(name, true)?;
    }
    Ok(name)
}

fn parse_date(value: &Value) -> Result<NaiveDate, FieldError> {
    match value {
        Value::Null => Err(FieldError::Null),
        Value::String(text) => {
            NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| FieldError::InvalidDate)
        }
        _ => Err(FieldError::InvalidDate),
    }
}

fn parse_gender(value: &Value) -> Result<Gender, FieldError> {
    match value {
        Value::Null => Err(FieldError::Null),
        Value::String(code) => {
            Gender::from_code(code).ok_or_else(|| FieldError::InvalidChoice(code.clone()))
        }
        other => Err(FieldError::InvalidChoice(other.to_string())),
    }
}

fn parse_height(value: &Value) -> Result<i32, FieldError> {
    let number = match value {
        Value::Null => return Err(FieldError::Null),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(integral)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    };
    let height = number
        .and_then(|number| i32::try_from(number).ok())
        .ok_or(FieldError::InvalidInteger)?;
    check_height_in_cm(height)?;
    Ok(height)
}

fn integral(number: f64) -> Option<i64> {
    if number.is_finite() && number.fract() == 0.0 {
        Some(number as i64)
    } else {
        None
    }
}

fn parse_weight(value: &Value) -> Result<f64, FieldError> {
    let weight = match value {
        Value::Null => return Err(FieldError::Null),
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or(FieldError::InvalidNumber)?;
    check_weight_in_kg(weight)?;
    Ok(weight)
}
