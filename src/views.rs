//! List and Search Views
//!
//! Headless view-models behind the list, search and report-dialog screens.
//! They hold what a screen renders and perform the calls its buttons
//! trigger. Nothing is changed locally before the server confirms it.

use std::sync::Arc;

use tracing::debug;

use crate::client::{Client, PatientApi};
use crate::errors::{ApiError, Result};
use crate::models::{Entity, Patient};
use crate::notify::{messages, Notifier};
use crate::operations::EntityApi;
use crate::types::ReportKind;
use crate::workflow::{DownloadState, ReportWorkflow};

/// Which patients a list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatientScope {
    /// Every patient
    #[default]
    All,
    /// The most recent patients
    Recent,
}

/// Delete and report actions available on every patient row
struct PatientActions {
    patients: PatientApi,
    reports: ReportWorkflow,
    notifier: Arc<dyn Notifier>,
}

impl PatientActions {
    fn new(client: &Client, notifier: Arc<dyn Notifier>) -> Self {
        let patients = client.patients();
        let reports = ReportWorkflow::new(
            patients.clone(),
            client.object_urls().clone(),
            client.config().fallback_filename.clone(),
        );
        Self {
            patients,
            reports,
            notifier,
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.patients.delete(id).await {
            Ok(outcome) if outcome.success => {
                self.notifier.notify(messages::deleted(Patient::LABEL));
                Ok(())
            }
            Ok(_) => {
                self.notifier.notify(messages::delete_failed());
                Err(ApiError::DeleteRejected(id.to_string()))
            }
            Err(e) => {
                self.notifier.notify(messages::delete_failed());
                Err(e)
            }
        }
    }

    async fn generate_report(&self, id: &str, kind: ReportKind) -> Result<DownloadState> {
        let result = self.reports.generate(id, kind).await;
        match &result {
            Err(ApiError::DownloadInProgress) => self.notifier.notify(messages::report_busy()),
            Err(ApiError::Cancelled) => {}
            Err(_) => self.notifier.notify(messages::report_failed()),
            Ok(_) => {}
        }
        result
    }
}

/// Patient table with per-row actions and a report dialog
pub struct PatientListView {
    scope: PatientScope,
    items: Vec<Patient>,
    loaded: bool,
    actions: PatientActions,
}

impl PatientListView {
    /// Creates an empty view; call [`refresh`](Self::refresh) to load it
    pub fn new(client: &Client, scope: PatientScope, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            scope,
            items: Vec::new(),
            loaded: false,
            actions: PatientActions::new(client, notifier),
        }
    }

    /// Heading of the table
    pub fn title(&self) -> &'static str {
        match self.scope {
            PatientScope::All => "قائمة المرضى",
            PatientScope::Recent => "آخر 20 ملف",
        }
    }

    /// Rows currently shown
    pub fn items(&self) -> &[Patient] {
        &self.items
    }

    /// Returns true once a load succeeded
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Reloads the rows; on failure the previous rows stay
    pub async fn refresh(&mut self) -> Result<()> {
        let result = match self.scope {
            PatientScope::All => self.actions.patients.list().await,
            PatientScope::Recent => self.actions.patients.recent().await,
        };
        match result {
            Ok(items) => {
                debug!(rows = items.len(), scope = ?self.scope, "patient list loaded");
                self.items = items;
                self.loaded = true;
                Ok(())
            }
            Err(e) => {
                self.actions.notifier.notify(messages::load_failed());
                Err(e)
            }
        }
    }

    /// Deletes a patient once the user confirmed
    ///
    /// Returns false without calling the server when not confirmed. The rows
    /// are reloaded only after the server accepted the delete.
    pub async fn delete(&mut self, id: &str, confirmed: bool) -> Result<bool> {
        if !confirmed {
            return Ok(false);
        }
        self.actions.delete(id).await?;
        // The delete went through; a failed reload is reported by refresh.
        if let Err(e) = self.refresh().await {
            debug!(patient = id, error = %e, "reload after delete failed");
        }
        Ok(true)
    }

    /// Generates a report for a row
    pub async fn generate_report(&self, id: &str, kind: ReportKind) -> Result<DownloadState> {
        self.actions.generate_report(id, kind).await
    }

    /// Report dialog of this view
    pub fn reports(&self) -> &ReportWorkflow {
        &self.actions.reports
    }

    /// Closes the report dialog, releasing the finished file
    pub fn close_report_dialog(&self) -> bool {
        self.actions.reports.close()
    }
}

/// What a search screen shows
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchResults {
    /// No query has been run
    #[default]
    NotRun,
    /// The query matched nothing
    Empty,
    /// Matching patients
    Found(Vec<Patient>),
}

impl SearchResults {
    /// Matching patients, empty unless something was found
    pub fn patients(&self) -> &[Patient] {
        match self {
            SearchResults::Found(patients) => patients,
            _ => &[],
        }
    }
}

/// Patient search screen
pub struct SearchView {
    query: String,
    results: SearchResults,
    actions: PatientActions,
}

impl SearchView {
    /// Creates a view with no query
    pub fn new(client: &Client, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            query: String::new(),
            results: SearchResults::NotRun,
            actions: PatientActions::new(client, notifier),
        }
    }

    /// Last query run
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Current results
    pub fn results(&self) -> &SearchResults {
        &self.results
    }

    /// Runs a query
    ///
    /// A blank query clears the results without calling the server. A query
    /// that matches nothing is `Empty`, not an error.
    pub async fn run(&mut self, query: &str) -> Result<&SearchResults> {
        self.query = query.trim().to_string();
        if self.query.is_empty() {
            self.results = SearchResults::NotRun;
            return Ok(&self.results);
        }

        match self.actions.patients.search(&self.query).await {
            Ok(found) if found.is_empty() => self.results = SearchResults::Empty,
            Ok(found) => self.results = SearchResults::Found(found),
            Err(e) => {
                self.actions.notifier.notify(messages::search_failed());
                return Err(e);
            }
        }
        Ok(&self.results)
    }

    /// Deletes a matching patient once the user confirmed, then re-runs the query
    pub async fn delete(&mut self, id: &str, confirmed: bool) -> Result<bool> {
        if !confirmed {
            return Ok(false);
        }
        self.actions.delete(id).await?;
        let query = self.query.clone();
        if let Err(e) = self.run(&query).await {
            debug!(patient = id, query = %query, error = %e, "search after delete failed");
        }
        Ok(true)
    }

    /// Generates a report for a matching patient
    pub async fn generate_report(&self, id: &str, kind: ReportKind) -> Result<DownloadState> {
        self.actions.generate_report(id, kind).await
    }

    /// Report dialog of this view
    pub fn reports(&self) -> &ReportWorkflow {
        &self.actions.reports
    }

    /// Closes the report dialog, releasing the finished file
    pub fn close_report_dialog(&self) -> bool {
        self.actions.reports.close()
    }
}

/// Table of doctors, hospitals or nationalities
pub struct EntityListView<E: Entity> {
    api: EntityApi<E>,
    items: Vec<E>,
    loaded: bool,
    notifier: Arc<dyn Notifier>,
}

impl<E: Entity> EntityListView<E> {
    /// Creates an empty view over a collection
    pub fn new(api: EntityApi<E>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            items: Vec::new(),
            loaded: false,
            notifier,
        }
    }

    /// Rows currently shown
    pub fn items(&self) -> &[E] {
        &self.items
    }

    /// Returns true once a load succeeded
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Reloads the rows; on failure the previous rows stay
    pub async fn refresh(&mut self) -> Result<()> {
        match self.api.list().await {
            Ok(items) => {
                self.items = items;
                self.loaded = true;
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(messages::load_failed());
                Err(e)
            }
        }
    }

    /// Deletes a record once the user confirmed
    pub async fn delete(&mut self, id: &str, confirmed: bool) -> Result<bool> {
        if !confirmed {
            return Ok(false);
        }
        match self.api.delete(id).await {
            Ok(outcome) if outcome.success => {
                self.notifier.notify(messages::deleted(E::LABEL));
                if let Err(e) = self.refresh().await {
                    debug!(collection = E::COLLECTION, id, error = %e, "reload after delete failed");
                }
                Ok(true)
            }
            Ok(_) => {
                self.notifier.notify(messages::delete_failed());
                Err(ApiError::DeleteRejected(id.to_string()))
            }
            Err(e) => {
                self.notifier.notify(messages::delete_failed());
                Err(e)
            }
        }
    }
}
