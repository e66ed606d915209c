//! Hospital Admin Rust Client Library
//!
//! Async client for the hospital administration API. Provides typed CRUD
//! for patients, doctors, hospitals and nationalities, streamed PDF report
//! downloads with progress feedback, and headless view-models for the
//! screens built on top of them.
//!
//! # Features
//!
//! - Entity CRUD (list, get, create, update, delete)
//! - Patient search and most-recent listing
//! - Streamed report downloads with progress callbacks
//! - Report workflow state machine with cancellation
//! - Object URLs over downloaded reports, revoked exactly once
//! - Form validation with derived day counts and unique file numbers
//! - Async/await support with Tokio
//!
//! # Example
//!
//! ```no_run
//! use hospital_admin::{Client, ClientConfig, ReportKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::from_env())?;
//!
//!     let found = client.patients().search("1234567890").await?;
//!     for patient in &found {
//!         let report = client
//!             .patients()
//!             .download_report(&patient.id, ReportKind::Medical, |p| println!("{p}%"))
//!             .await?;
//!         println!("{} ({} bytes)", report.filename, report.blob.len());
//!     }
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

mod blob;
mod client;
mod download;
mod errors;
mod forms;
mod models;
mod notify;
mod operations;
pub mod protocol;
mod transport;
mod types;
mod views;
mod workflow;

// Re-export public API
pub use blob::{Blob, ObjectUrl, ObjectUrlRegistry};
pub use client::{Client, PatientApi, ReportOutcome};
pub use download::{assemble_chunks, DownloadResult};
pub use errors::{map_download_status_to_error, map_status_to_error, ApiError, Result};
pub use forms::{submit_form, DoctorForm, EntityForm, HospitalForm, NationalityForm, PatientForm};
pub use models::{
    decode_logo, doctors_for_hospital, generate_file_number, inclusive_day_count, DeleteOutcome,
    Doctor, DoctorDraft, DoctorPatch, Entity, Hospital, HospitalDraft, HospitalPatch,
    HospitalType, Nationality, NationalityDraft, NationalityPatch, Patient, PatientDraft,
    PatientPatch, Relation, VisitType,
};
pub use notify::{messages, Notification, NotificationVariant, Notifier, TracingNotifier};
pub use operations::EntityApi;
pub use types::{
    ClientConfig, ReportDelivery, ReportKind, DEFAULT_BASE_URL, DEFAULT_REPORT_CONTENT_TYPE,
    DEFAULT_REPORT_FILENAME,
};
pub use views::{EntityListView, PatientListView, PatientScope, SearchResults, SearchView};
pub use workflow::{DownloadState, ReportPhase, ReportWorkflow};
