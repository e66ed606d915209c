//! Hospital Admin Client
//!
//! Main client struct for interacting with the hospital administration API.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use tracing::{debug, info, warn};
use url::Url;

use crate::blob::ObjectUrlRegistry;
use crate::download::{DownloadResult, Downloader};
use crate::errors::{ApiError, Result};
use crate::models::{
    generate_file_number, DeleteOutcome, Doctor, Hospital, Nationality, Patient, PatientDraft,
    PatientPatch, SearchEnvelope,
};
use crate::operations::{validate_id, EntityApi};
use crate::transport::Transport;
use crate::types::{
    ClientConfig, ReportDelivery, ReportKind, DATA_PREFIX, RECENT_PATIENTS_ROUTE, SEARCH_ROUTE,
};

/// Hospital administration API client
///
/// The client owns one HTTP transport and one object URL registry. Entity
/// handles returned by [`Client::patients`] and friends share both.
///
/// # Example
///
/// ```no_run
/// use hospital_admin::{Client, ClientConfig, ReportKind};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::new(ClientConfig::new("https://www.sohatey.info"))?;
///
///     let recent = client.patients().recent().await?;
///     if let Some(patient) = recent.first() {
///         let report = client
///             .patients()
///             .download_report(&patient.id, ReportKind::SickLeave, |p| println!("{p}%"))
///             .await?;
///         report.blob.save_to(&report.filename).await?;
///     }
///
///     client.close().await;
///     Ok(())
/// }
/// ```
pub struct Client {
    config: ClientConfig,
    transport: Arc<Transport>,
    object_urls: ObjectUrlRegistry,
}

impl Client {
    /// Creates a new client with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::validate_config(&config)?;

        let transport = Arc::new(Transport::new(&config)?);
        info!(base_url = %transport.base_url(), "client created");

        Ok(Self {
            config,
            transport,
            object_urls: ObjectUrlRegistry::new(),
        })
    }

    /// Validates the client configuration
    fn validate_config(config: &ClientConfig) -> Result<()> {
        if config.base_url.trim().is_empty() {
            return Err(ApiError::InvalidArgument("Base URL is required".to_string()));
        }
        crate::transport::parse_base_url(&config.base_url)?;

        if config.connect_timeout == 0 || config.request_timeout == 0 {
            return Err(ApiError::InvalidArgument(
                "Timeouts must be greater than zero".to_string(),
            ));
        }

        if config.fallback_filename.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "Fallback filename is required".to_string(),
            ));
        }

        if config.file_number_attempts == 0 {
            return Err(ApiError::InvalidArgument(
                "At least one file number attempt is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Configuration the client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Registry holding the object URLs of downloaded reports
    pub fn object_urls(&self) -> &ObjectUrlRegistry {
        &self.object_urls
    }

    /// Patient operations
    pub fn patients(&self) -> PatientApi {
        PatientApi::new(self.transport.clone(), &self.config)
    }

    /// Doctor operations
    pub fn doctors(&self) -> EntityApi<Doctor> {
        EntityApi::new(self.transport.clone())
    }

    /// Hospital operations
    pub fn hospitals(&self) -> EntityApi<Hospital> {
        EntityApi::new(self.transport.clone())
    }

    /// Nationality operations
    pub fn nationalities(&self) -> EntityApi<Nationality> {
        EntityApi::new(self.transport.clone())
    }

    /// Closes the client
    ///
    /// After calling close, all operations will return ClientClosed error.
    /// It's safe to call close multiple times.
    pub async fn close(&self) {
        if self.transport.is_closed().await {
            return;
        }
        self.transport.close().await;
        info!("client closed");
    }
}

/// What a report request produced
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    /// Link for the user to open; nothing was downloaded
    Link(Url),
    /// Assembled report
    File(DownloadResult),
}

/// Patient operations, including search and report generation
#[derive(Clone)]
pub struct PatientApi {
    records: EntityApi<Patient>,
    transport: Arc<Transport>,
    downloader: Downloader,
    file_number_attempts: u32,
}

impl PatientApi {
    fn new(transport: Arc<Transport>, config: &ClientConfig) -> Self {
        Self {
            records: EntityApi::new(transport.clone()),
            downloader: Downloader::new(
                transport.clone(),
                config.fallback_filename.clone(),
                config.default_content_type.clone(),
            ),
            transport,
            file_number_attempts: config.file_number_attempts,
        }
    }

    /// Lists every patient
    pub async fn list(&self) -> Result<Vec<Patient>> {
        self.records.list().await
    }

    /// Lists the most recent patients
    pub async fn recent(&self) -> Result<Vec<Patient>> {
        let url = self.transport.endpoint(&[DATA_PREFIX, RECENT_PATIENTS_ROUTE])?;
        self.transport.request_json(Method::GET, url, None::<&()>).await
    }

    /// Fetches one patient
    pub async fn get_by_id(&self, id: &str) -> Result<Patient> {
        self.records.get_by_id(id).await
    }

    /// Creates a patient from a prepared draft
    pub async fn create(&self, draft: &PatientDraft) -> Result<Patient> {
        self.records.create(draft).await
    }

    /// Applies a partial update
    pub async fn update(&self, id: &str, patch: &PatientPatch) -> Result<Patient> {
        self.records.update(id, patch).await
    }

    /// Deletes a patient
    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome> {
        self.records.delete(id).await
    }

    /// Searches patients server side
    ///
    /// A response without a `users` array is an empty result, not an error.
    pub async fn search(&self, query: &str) -> Result<Vec<Patient>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidArgument("Search query is empty".to_string()));
        }
        let url = self.transport.endpoint(&[DATA_PREFIX, SEARCH_ROUTE])?;
        let url = push_segment(url, query)?;
        let envelope: SearchEnvelope = self.transport.request_json(Method::GET, url, None::<&()>).await?;
        let users = envelope.users.unwrap_or_default();
        debug!(query, results = users.len(), "search finished");
        Ok(users)
    }

    /// Draws a file number that no stored patient uses yet
    ///
    /// Candidates are looked up through the search route; a candidate is taken
    /// as soon as no returned patient carries it.
    pub async fn allocate_file_number(&self) -> Result<String> {
        for attempt in 1..=self.file_number_attempts {
            let candidate = generate_file_number(&mut rand::thread_rng());
            let taken = self
                .search(&candidate)
                .await?
                .iter()
                .any(|p| p.file_number == candidate);
            if !taken {
                return Ok(candidate);
            }
            warn!(attempt, candidate = %candidate, "file number collision");
        }
        Err(ApiError::FileNumberExhausted(self.file_number_attempts))
    }

    /// Produces a report in the requested delivery mode
    pub async fn generate_report<F>(
        &self,
        id: &str,
        kind: ReportKind,
        delivery: ReportDelivery,
        on_progress: F,
    ) -> Result<ReportOutcome>
    where
        F: FnMut(u8),
    {
        match delivery {
            ReportDelivery::DirectOpen => self.report_link(id, kind).map(ReportOutcome::Link),
            ReportDelivery::StreamedDownload => self
                .download_report(id, kind, on_progress)
                .await
                .map(ReportOutcome::File),
        }
    }

    /// Link to the server-rendered report, for opening outside the client
    pub fn report_link(&self, id: &str, kind: ReportKind) -> Result<Url> {
        let id = validate_id(id)?;
        self.transport
            .endpoint(&[DATA_PREFIX, "reports", kind.route(), "generate", id])
    }

    /// Streams a report with progress feedback
    pub async fn download_report<F>(&self, id: &str, kind: ReportKind, on_progress: F) -> Result<DownloadResult>
    where
        F: FnMut(u8),
    {
        let id = validate_id(id)?;
        let started = Utc::now();
        let result = self.downloader.fetch(&[kind.route(), id], on_progress).await;
        match &result {
            Ok(report) => debug!(
                patient = id,
                kind = %kind,
                size = report.blob.len(),
                elapsed_ms = (Utc::now() - started).num_milliseconds(),
                "report generated"
            ),
            Err(e) => warn!(patient = id, kind = %kind, error = %e, "report generation failed"),
        }
        result
    }
}

fn push_segment(mut url: Url, segment: &str) -> Result<Url> {
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidArgument("Base URL cannot carry a path".to_string()))?
        .push(segment);
    Ok(url)
}
