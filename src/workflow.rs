//! Report Workflow
//!
//! Drives one report download for a view and publishes its state:
//!
//! ```text
//! Idle -> Requesting -> Downloading(progress) -> Completed(url, name)
//!            \______________\__________________-> Failed
//! ```
//!
//! A workflow runs at most one download at a time; a second request while
//! one is active is rejected. Closing the workflow cancels the download in
//! flight and revokes the object URL it created, exactly once.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::blob::{ObjectUrl, ObjectUrlRegistry};
use crate::client::PatientApi;
use crate::errors::{ApiError, Result};
use crate::types::ReportKind;

/// Phase of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportPhase {
    /// Nothing requested, or the dialog was closed
    #[default]
    Idle,
    /// Request sent, no progress reported yet
    Requesting,
    /// Bytes are arriving
    Downloading,
    /// Report assembled and exposed through an object URL
    Completed,
    /// The last request failed
    Failed,
}

/// State a download dialog renders
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadState {
    /// Current phase
    pub phase: ReportPhase,
    /// True while the dialog should stay open
    pub is_downloading: bool,
    /// Percentage, 0..=100
    pub progress: u8,
    /// Set only once the report completed
    pub file_url: Option<ObjectUrl>,
    /// Filename shown in the dialog
    pub file_name: String,
    /// Report being generated
    pub report_kind: Option<ReportKind>,
}

impl DownloadState {
    fn requesting(kind: ReportKind, file_name: &str) -> Self {
        Self {
            phase: ReportPhase::Requesting,
            is_downloading: true,
            progress: 0,
            file_url: None,
            file_name: file_name.to_string(),
            report_kind: Some(kind),
        }
    }

    /// Returns true once the report can be opened
    pub fn is_completed(&self) -> bool {
        self.progress == 100 && self.file_url.is_some()
    }
}

#[derive(Default)]
struct Run {
    generation: u64,
    cancel: Option<CancellationToken>,
}

/// Runs report downloads for one view
pub struct ReportWorkflow {
    patients: PatientApi,
    object_urls: ObjectUrlRegistry,
    fallback_filename: String,
    state: watch::Sender<DownloadState>,
    run: Mutex<Run>,
}

impl ReportWorkflow {
    /// Creates an idle workflow
    pub fn new(
        patients: PatientApi,
        object_urls: ObjectUrlRegistry,
        fallback_filename: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(DownloadState::default());
        Self {
            patients,
            object_urls,
            fallback_filename: fallback_filename.into(),
            state,
            run: Mutex::new(Run::default()),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> DownloadState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<DownloadState> {
        self.state.subscribe()
    }

    /// Returns true while a download is in flight
    pub fn is_active(&self) -> bool {
        self.lock_run().cancel.is_some()
    }

    /// Generates a report for a patient
    ///
    /// Returns the completed state. Fails with `DownloadInProgress` when a
    /// download is already running, and with `Cancelled` when the workflow
    /// was closed before the download finished.
    pub async fn generate(&self, patient_id: &str, kind: ReportKind) -> Result<DownloadState> {
        let (generation, token) = {
            let mut run = self.lock_run();
            if run.cancel.is_some() {
                warn!(patient = patient_id, kind = %kind, "report rejected, another download is active");
                return Err(ApiError::DownloadInProgress);
            }
            run.generation += 1;
            let token = CancellationToken::new();
            run.cancel = Some(token.clone());

            let previous = self
                .state
                .send_replace(DownloadState::requesting(kind, &self.fallback_filename));
            if let Some(url) = previous.file_url {
                self.object_urls.revoke(&url);
            }
            (run.generation, token)
        };
        let active = ActiveRun {
            workflow: self,
            generation,
        };
        debug!(patient = patient_id, kind = %kind, generation, "report requested");

        // 100 is published together with the object URL.
        let on_progress = |percent: u8| {
            let percent = percent.min(99);
            self.state.send_if_modified(|state| {
                if token.is_cancelled() || percent < state.progress {
                    return false;
                }
                state.phase = ReportPhase::Downloading;
                state.progress = percent;
                true
            });
        };

        let result = tokio::select! {
            _ = token.cancelled() => Err(ApiError::Cancelled),
            result = self.patients.download_report(patient_id, kind, on_progress) => result,
        };

        let mut run = self.lock_run();
        if run.generation != generation || token.is_cancelled() {
            debug!(patient = patient_id, kind = %kind, "discarding result of a closed workflow");
            return Err(ApiError::Cancelled);
        }
        run.cancel = None;

        // Published under the run lock so a concurrent close sees either
        // nothing or the finished state.
        let outcome = match result {
            Ok(report) => {
                let url = self.object_urls.create(report.blob);
                let completed = DownloadState {
                    phase: ReportPhase::Completed,
                    is_downloading: true,
                    progress: 100,
                    file_url: Some(url),
                    file_name: report.filename,
                    report_kind: Some(kind),
                };
                self.state.send_replace(completed.clone());
                info!(patient = patient_id, kind = %kind, file = %completed.file_name, "report ready");
                Ok(completed)
            }
            Err(e) => {
                self.mark_failed();
                warn!(patient = patient_id, kind = %kind, error = %e, "report failed");
                Err(e)
            }
        };
        drop(run);
        drop(active);
        outcome
    }

    /// Closes the dialog
    ///
    /// Cancels a running download, revokes the object URL of a completed one
    /// and resets the state. Returns true when a URL was revoked; calling
    /// close again is a no-op.
    pub fn close(&self) -> bool {
        {
            let mut run = self.lock_run();
            if let Some(token) = run.cancel.take() {
                token.cancel();
                debug!("running download cancelled");
            }
            run.generation += 1;
        }

        let previous = self.state.send_replace(DownloadState::default());
        match previous.file_url {
            Some(url) => self.object_urls.revoke(&url),
            None => false,
        }
    }

    fn mark_failed(&self) {
        self.state.send_modify(|state| {
            state.phase = ReportPhase::Failed;
            state.is_downloading = false;
            state.file_url = None;
        });
    }

    fn lock_run(&self) -> MutexGuard<'_, Run> {
        self.run.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ReportWorkflow {
    fn drop(&mut self) {
        self.close();
    }
}

/// Releases the active slot when a `generate` future is dropped mid-flight
struct ActiveRun<'a> {
    workflow: &'a ReportWorkflow,
    generation: u64,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        let mut run = self.workflow.lock_run();
        if run.generation == self.generation {
            if let Some(token) = run.cancel.take() {
                token.cancel();
                self.workflow.mark_failed();
            }
        }
    }
}
