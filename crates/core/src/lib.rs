//! # Pacientes Core
//!
//! Core business logic for the pacientes record service.
//!
//! This crate contains the pieces that do not know about HTTP:
//! - Patient entity shapes ([`Patient`], [`NewPatient`], [`PatientPatch`])
//! - Payload validation with whitelist semantics ([`validation`])
//! - Persistence against a single-file SQLite store ([`PatientRepository`])
//! - Startup-resolved runtime configuration ([`AppConfig`])
//!
//! **No API concerns**: routing, status codes and response shapes belong in
//! `api-rest`.

#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod patient;
pub mod repository;
pub mod validation;

pub use config::{AppConfig, RuntimeEnv};
pub use error::{PatientError, PatientResult};
pub use patient::{NewPatient, Patient, PatientPatch};
pub use repository::PatientRepository;
pub use validation::{Violation, validate_new_patient, validate_patient_patch};
