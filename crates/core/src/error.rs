#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to open the patient store: {0}")]
    StoreOpen(sqlx::Error),
    #[error("failed to prepare the patient store schema: {0}")]
    Schema(sqlx::Error),
    #[error("patient store operation failed: {0}")]
    Storage(sqlx::Error),
    #[error("failed to serialise symptoms: {0}")]
    SymptomsSerialization(serde_json::Error),
    #[error("failed to deserialise stored symptoms: {0}")]
    SymptomsDeserialization(serde_json::Error),
    #[error("invalid timestamp")]
    InvalidTimestamp,
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;
