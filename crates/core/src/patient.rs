//! Patient entity and the shapes it moves through.
//!
//! Three views of the same record:
//! - [`Patient`] — a stored record as returned by the repository and serialised
//!   over the wire
//! - [`NewPatient`] — validated input for the create operation; carries
//!   constraint-checked field types so the repository never re-validates
//! - [`PatientPatch`] — validated partial input for the update operation;
//!   absent fields keep their stored values

use chrono::{DateTime, Utc};
use pacientes_types::{Age, NonEmptyText};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored patient record.
///
/// `id`, `created_at` and `updated_at` are assigned by the store; the other
/// fields satisfy the validation constraints at all times the record is
/// persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Store-assigned identifier, stable for the lifetime of the record.
    pub id: i64,
    /// Display name, non-empty, at most 100 characters.
    pub name: String,
    /// Age in whole years, 0 to 120 inclusive.
    pub age: i64,
    /// Reported symptoms in presentation order.
    pub symptoms: Vec<String>,
    /// Set once at creation, never modified.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful update.
    pub updated_at: DateTime<Utc>,
}

/// A validated payload for creating a patient.
///
/// Produced by [`crate::validation::validate_new_patient`]; the field types
/// carry the constraints, so holding a `NewPatient` is proof the input was
/// acceptable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPatient {
    pub name: NonEmptyText,
    pub age: Age,
    pub symptoms: Vec<NonEmptyText>,
}

/// A validated partial payload for updating a patient.
///
/// `None` fields are left untouched by the update; `Some` fields replace the
/// stored value. Produced by [`crate::validation::validate_patient_patch`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientPatch {
    pub name: Option<NonEmptyText>,
    pub age: Option<Age>,
    pub symptoms: Option<Vec<NonEmptyText>>,
}

impl PatientPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.symptoms.is_none()
    }
}
