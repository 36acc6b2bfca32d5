//! Input validation for patient payloads.
//!
//! The constraints that the original system declared as per-field annotations
//! are expressed here as an explicit whitelist plus one checker per field,
//! evaluated by standalone functions. Rules are **not** short-circuited: a
//! single call collects every violation it can find, so the caller can report
//! them all at once.
//!
//! Whitelist semantics: a key outside `{name, age, symptoms}` is itself a
//! violation, never silently dropped.
//!
//! These functions are pure; they neither log nor touch the store.

use crate::patient::{NewPatient, PatientPatch};
use pacientes_types::{Age, AgeError, NonEmptyText, TextError};
use serde_json::{Map, Value};

/// Fields a patient payload may carry.
pub const KNOWN_FIELDS: [&str; 3] = ["name", "age", "symptoms"];

/// Maximum accepted length of the `name` field, in characters.
pub const NAME_MAX_LEN: usize = 100;

/// A single field-level validation failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Machine name of the offending field.
    pub field: String,
    /// Machine name of the violated rule.
    pub rule: &'static str,
    /// Human-readable description, already naming the field.
    pub message: String,
}

impl Violation {
    fn new(field: impl Into<String>, rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule,
            message: message.into(),
        }
    }

    fn required(field: &'static str) -> Self {
        Self::new(field, "required", format!("{field} is required"))
    }
}

/// Validate a raw creation payload.
///
/// All three fields are required. Every rule is evaluated, so the error arm
/// can carry several violations at once.
///
/// # Errors
///
/// Returns the full list of violations when the payload is unacceptable; the
/// list is never empty in the error arm.
pub fn validate_new_patient(raw: &Map<String, Value>) -> Result<NewPatient, Vec<Violation>> {
    let mut violations = unknown_field_violations(raw);

    let name = match raw.get("name") {
        None => {
            violations.push(Violation::required("name"));
            None
        }
        Some(value) => collect(check_name(value), &mut violations),
    };

    let age = match raw.get("age") {
        None => {
            violations.push(Violation::required("age"));
            None
        }
        Some(value) => collect(check_age(value), &mut violations),
    };

    let symptoms = match raw.get("symptoms") {
        None => {
            violations.push(Violation::required("symptoms"));
            None
        }
        Some(value) => match check_symptoms(value) {
            Ok(symptoms) => Some(symptoms),
            Err(mut errs) => {
                violations.append(&mut errs);
                None
            }
        },
    };

    match (name, age, symptoms) {
        (Some(name), Some(age), Some(symptoms)) if violations.is_empty() => Ok(NewPatient {
            name,
            age,
            symptoms,
        }),
        _ => Err(violations),
    }
}

/// Validate a raw update payload.
///
/// The same per-field rules as [`validate_new_patient`] apply, but only to
/// fields present in the payload; an empty payload is an acceptable no-op
/// patch. Unknown fields are still rejected.
///
/// # Errors
///
/// Returns the full list of violations when the payload is unacceptable.
pub fn validate_patient_patch(raw: &Map<String, Value>) -> Result<PatientPatch, Vec<Violation>> {
    let mut violations = unknown_field_violations(raw);
    let mut patch = PatientPatch::default();

    if let Some(value) = raw.get("name") {
        patch.name = collect(check_name(value), &mut violations);
    }
    if let Some(value) = raw.get("age") {
        patch.age = collect(check_age(value), &mut violations);
    }
    if let Some(value) = raw.get("symptoms") {
        match check_symptoms(value) {
            Ok(symptoms) => patch.symptoms = Some(symptoms),
            Err(mut errs) => violations.append(&mut errs),
        }
    }

    if violations.is_empty() {
        Ok(patch)
    } else {
        Err(violations)
    }
}

fn collect<T>(result: Result<T, Violation>, violations: &mut Vec<Violation>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(violation) => {
            violations.push(violation);
            None
        }
    }
}

fn unknown_field_violations(raw: &Map<String, Value>) -> Vec<Violation> {
    raw.keys()
        .filter(|key| !KNOWN_FIELDS.contains(&key.as_str()))
        .map(|key| {
            Violation::new(
                key.clone(),
                "unknown_field",
                format!("{key} is not an accepted field"),
            )
        })
        .collect()
}

fn check_name(value: &Value) -> Result<NonEmptyText, Violation> {
    let Some(text) = value.as_str() else {
        return Err(Violation::new(
            "name",
            "is_string",
            "name must be a string",
        ));
    };

    NonEmptyText::with_max_len(text, NAME_MAX_LEN).map_err(|err| match err {
        TextError::Empty => Violation::new("name", "not_empty", "name must not be empty"),
        TextError::TooLong { max } => Violation::new(
            "name",
            "max_length",
            format!("name must be at most {max} characters"),
        ),
    })
}

fn check_age(value: &Value) -> Result<Age, Violation> {
    // Floats with a fractional part and non-numeric values are not integers;
    // integers too large for i64 can only ever violate the upper bound.
    let Some(raw) = value.as_i64() else {
        if value.is_u64() {
            return Err(age_too_large());
        }
        return Err(Violation::new(
            "age",
            "is_integer",
            "age must be an integer",
        ));
    };

    Age::new(raw).map_err(|err| match err {
        AgeError::Negative => Violation::new("age", "min", "age cannot be negative"),
        AgeError::TooLarge => age_too_large(),
    })
}

fn age_too_large() -> Violation {
    Violation::new(
        "age",
        "max",
        format!("age cannot be greater than {}", Age::MAX),
    )
}

fn check_symptoms(value: &Value) -> Result<Vec<NonEmptyText>, Vec<Violation>> {
    let Some(items) = value.as_array() else {
        return Err(vec![Violation::new(
            "symptoms",
            "is_array",
            "symptoms must be an array",
        )]);
    };

    let mut violations = Vec::new();
    let mut symptoms = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        match item.as_str() {
            None => violations.push(Violation::new(
                "symptoms",
                "is_string",
                format!("symptoms[{index}] must be a string"),
            )),
            Some(text) => match NonEmptyText::new(text) {
                Ok(symptom) => symptoms.push(symptom),
                Err(_) => violations.push(Violation::new(
                    "symptoms",
                    "not_empty",
                    format!("symptoms[{index}] must not be empty"),
                )),
            },
        }
    }

    if violations.is_empty() {
        Ok(symptoms)
    } else {
        Err(violations)
    }
}
