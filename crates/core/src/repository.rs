//! Patient persistence over a single-file SQLite store.
//!
//! [`PatientRepository`] wraps a `sqlx::SqlitePool` opened once at process
//! start and injected at construction. All operations are direct statements
//! against the one `pacientes` table; the store's own single-writer
//! discipline is the only locking. Absence of a record is reported as
//! `Ok(None)` / `Ok(false)`, never as an error — callers decide how to
//! surface it.
//!
//! ## Storage layout
//!
//! ```text
//! pacientes
//!   id          INTEGER PRIMARY KEY AUTOINCREMENT
//!   name        TEXT    NOT NULL
//!   age         INTEGER NOT NULL
//!   symptoms    TEXT    NOT NULL   -- JSON array, order-preserving
//!   created_at  INTEGER NOT NULL   -- unix nanoseconds
//!   updated_at  INTEGER NOT NULL   -- unix nanoseconds
//! ```
//!
//! Records reach this layer already validated; the table never holds a row
//! that fails the field constraints.

use crate::error::{PatientError, PatientResult};
use crate::patient::{NewPatient, Patient, PatientPatch};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// Repository for patient records, keyed by their store-assigned id.
#[derive(Clone)]
pub struct PatientRepository {
    pool: SqlitePool,
}

impl PatientRepository {
    /// Wraps an already-opened pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the single-file store at `db_filename`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::StoreOpen` if the file cannot be opened.
    pub async fn connect(db_filename: &Path) -> PatientResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_filename)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(PatientError::StoreOpen)?;

        Ok(Self::new(pool))
    }

    /// Opens an in-memory store, used by tests.
    ///
    /// A single connection is kept alive for the lifetime of the pool; an
    /// in-memory SQLite database exists only as long as its connection does.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::StoreOpen` if the connection cannot be made.
    pub async fn connect_in_memory() -> PatientResult<Self> {
        let options = SqliteConnectOptions::new().filename(":memory:");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<std::time::Duration>)
            .max_lifetime(None::<std::time::Duration>)
            .connect_with(options)
            .await
            .map_err(PatientError::StoreOpen)?;

        Ok(Self::new(pool))
    }

    /// Creates the `pacientes` table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Schema` if the statement fails.
    pub async fn ensure_schema(&self) -> PatientResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS pacientes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT    NOT NULL,
                age         INTEGER NOT NULL,
                symptoms    TEXT    NOT NULL,
                created_at  INTEGER NOT NULL,
                updated_at  INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(PatientError::Schema)?;

        Ok(())
    }

    /// Whether the store currently answers queries.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    /// Persists a new record; the store assigns the id and both timestamps.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Storage` if the store is unreachable or the
    /// write fails.
    pub async fn create(&self, new: &NewPatient) -> PatientResult<Patient> {
        let now = encode_timestamp(Utc::now())?;
        let symptoms_json =
            serde_json::to_string(&new.symptoms).map_err(PatientError::SymptomsSerialization)?;

        let result = sqlx::query(
            "INSERT INTO pacientes (name, age, symptoms, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(new.name.as_str())
        .bind(i64::from(new.age.get()))
        .bind(&symptoms_json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(PatientError::Storage)?;

        let id = result.last_insert_rowid();
        tracing::debug!(patient_id = id, "created patient record");

        Ok(Patient {
            id,
            name: new.name.as_str().to_owned(),
            age: i64::from(new.age.get()),
            symptoms: new.symptoms.iter().map(|s| s.as_str().to_owned()).collect(),
            created_at: decode_timestamp(now),
            updated_at: decode_timestamp(now),
        })
    }

    /// Returns all records, most recently created first.
    ///
    /// `id` breaks ties between same-instant creations so the order stays
    /// deterministic. An empty store yields an empty vec.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Storage` if the query fails.
    pub async fn find_all(&self) -> PatientResult<Vec<Patient>> {
        let rows = sqlx::query_as::<_, PatientRow>(
            "SELECT id, name, age, symptoms, created_at, updated_at FROM pacientes
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(PatientError::Storage)?;

        rows.into_iter().map(PatientRow::into_patient).collect()
    }

    /// Returns the record with the given id, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Storage` if the query fails.
    pub async fn find_by_id(&self, id: i64) -> PatientResult<Option<Patient>> {
        let row = sqlx::query_as::<_, PatientRow>(
            "SELECT id, name, age, symptoms, created_at, updated_at FROM pacientes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(PatientError::Storage)?;

        row.map(PatientRow::into_patient).transpose()
    }

    /// Merges `patch` over the stored record and refreshes `updated_at`.
    ///
    /// Fields absent from the patch keep their stored values; `id` and
    /// `created_at` are never touched. The read-modify-write runs inside a
    /// transaction so it cannot interleave with another write to the same id.
    /// Validation is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Storage` if the store is unreachable or the
    /// write fails.
    pub async fn update(&self, id: i64, patch: &PatientPatch) -> PatientResult<Option<Patient>> {
        let mut tx = self.pool.begin().await.map_err(PatientError::Storage)?;

        let row = sqlx::query_as::<_, PatientRow>(
            "SELECT id, name, age, symptoms, created_at, updated_at FROM pacientes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(PatientError::Storage)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut patient = row.into_patient()?;

        if let Some(name) = &patch.name {
            patient.name = name.as_str().to_owned();
        }
        if let Some(age) = patch.age {
            patient.age = i64::from(age.get());
        }
        if let Some(symptoms) = &patch.symptoms {
            patient.symptoms = symptoms.iter().map(|s| s.as_str().to_owned()).collect();
        }

        let updated_at = encode_timestamp(Utc::now())?;
        patient.updated_at = decode_timestamp(updated_at);
        let symptoms_json = serde_json::to_string(&patient.symptoms)
            .map_err(PatientError::SymptomsSerialization)?;

        sqlx::query(
            "UPDATE pacientes SET name = ?, age = ?, symptoms = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&patient.name)
        .bind(patient.age)
        .bind(&symptoms_json)
        .bind(updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(PatientError::Storage)?;

        tx.commit().await.map_err(PatientError::Storage)?;
        tracing::debug!(patient_id = id, "updated patient record");

        Ok(Some(patient))
    }

    /// Removes the record permanently. Returns `false` when no record
    /// matched; deleting the same id twice is not an error.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Storage` if the statement fails.
    pub async fn delete(&self, id: i64) -> PatientResult<bool> {
        let result = sqlx::query("DELETE FROM pacientes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(PatientError::Storage)?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::debug!(patient_id = id, "deleted patient record");
        }
        Ok(deleted)
    }
}

/// One row of the `pacientes` table, before symptom and timestamp decoding.
#[derive(sqlx::FromRow)]
struct PatientRow {
    id: i64,
    name: String,
    age: i64,
    symptoms: String,
    created_at: i64,
    updated_at: i64,
}

impl PatientRow {
    fn into_patient(self) -> PatientResult<Patient> {
        let symptoms = serde_json::from_str(&self.symptoms)
            .map_err(PatientError::SymptomsDeserialization)?;

        Ok(Patient {
            id: self.id,
            name: self.name,
            age: self.age,
            symptoms,
            created_at: decode_timestamp(self.created_at),
            updated_at: decode_timestamp(self.updated_at),
        })
    }
}

// Timestamps are stored as unix nanoseconds so that `ORDER BY created_at`
// compares numerically and a round trip through the store is lossless.
fn encode_timestamp(ts: DateTime<Utc>) -> PatientResult<i64> {
    ts.timestamp_nanos_opt().ok_or(PatientError::InvalidTimestamp)
}

fn decode_timestamp(ns: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(ns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacientes_types::{Age, NonEmptyText};

    async fn repository() -> PatientRepository {
        let repository = PatientRepository::connect_in_memory()
            .await
            .expect("open in-memory store");
        repository.ensure_schema().await.expect("create schema");
        repository
    }

    fn new_patient(name: &str, age: i64, symptoms: &[&str]) -> NewPatient {
        NewPatient {
            name: NonEmptyText::new(name).expect("test name"),
            age: Age::new(age).expect("test age"),
            symptoms: symptoms
                .iter()
                .map(|s| NonEmptyText::new(s).expect("test symptom"))
                .collect(),
        }
    }

    #[tokio::test]
    async fn create_then_find_round_trips() {
        let repository = repository().await;

        let created = repository
            .create(&new_patient("Ana", 30, &["fever"]))
            .await
            .expect("create");
        assert!(created.id > 0);

        let fetched = repository
            .find_by_id(created.id)
            .await
            .expect("find")
            .expect("record exists");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn symptoms_survive_commas_and_order() {
        let repository = repository().await;

        let created = repository
            .create(&new_patient("Ana", 30, &["fever, chills", "cough"]))
            .await
            .expect("create");

        let fetched = repository
            .find_by_id(created.id)
            .await
            .expect("find")
            .expect("record exists");
        assert_eq!(fetched.symptoms, vec!["fever, chills", "cough"]);
    }

    #[tokio::test]
    async fn find_all_returns_newest_first() {
        let repository = repository().await;

        let a = repository
            .create(&new_patient("A", 20, &[]))
            .await
            .expect("create A");
        let b = repository
            .create(&new_patient("B", 30, &[]))
            .await
            .expect("create B");
        let c = repository
            .create(&new_patient("C", 40, &[]))
            .await
            .expect("create C");

        let all = repository.find_all().await.expect("find all");
        let ids: Vec<i64> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[tokio::test]
    async fn find_all_on_empty_store_is_empty() {
        let repository = repository().await;
        assert!(repository.find_all().await.expect("find all").is_empty());
    }

    #[tokio::test]
    async fn find_by_id_absent_is_none() {
        let repository = repository().await;
        assert!(repository.find_by_id(42).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn update_merges_partial_fields() {
        let repository = repository().await;
        let created = repository
            .create(&new_patient("Ana", 30, &["fever"]))
            .await
            .expect("create");

        let patch = PatientPatch {
            age: Some(Age::new(31).expect("test age")),
            ..PatientPatch::default()
        };
        let updated = repository
            .update(created.id, &patch)
            .await
            .expect("update")
            .expect("record exists");

        assert_eq!(updated.age, 31);
        assert_eq!(updated.name, "Ana");
        assert_eq!(updated.symptoms, vec!["fever"]);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > updated.created_at);

        let fetched = repository
            .find_by_id(created.id)
            .await
            .expect("find")
            .expect("record exists");
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn update_absent_is_none() {
        let repository = repository().await;
        let patch = PatientPatch::default();
        assert!(repository
            .update(42, &patch)
            .await
            .expect("update")
            .is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent_about_absence() {
        let repository = repository().await;
        let created = repository
            .create(&new_patient("Ana", 30, &[]))
            .await
            .expect("create");

        assert!(repository.delete(created.id).await.expect("first delete"));
        assert!(!repository.delete(created.id).await.expect("second delete"));
        assert!(repository
            .find_by_id(created.id)
            .await
            .expect("find")
            .is_none());
    }

    #[tokio::test]
    async fn connect_persists_to_the_store_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("pacientes.sqlite");

        let repository = PatientRepository::connect(&db).await.expect("open store");
        repository.ensure_schema().await.expect("create schema");
        let created = repository
            .create(&new_patient("Ana", 30, &["fever"]))
            .await
            .expect("create");

        let reopened = PatientRepository::connect(&db).await.expect("reopen store");
        let fetched = reopened
            .find_by_id(created.id)
            .await
            .expect("find")
            .expect("record persisted");
        assert_eq!(fetched.name, "Ana");
    }
}
