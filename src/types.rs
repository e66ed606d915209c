//! Hospital Admin Types and Constants
//!
//! This module defines route constants, report kinds, delivery modes and the
//! client configuration used when talking to the hospital administration API.

use std::fmt;
use std::str::FromStr;

use crate::errors::ApiError;

/// Default API origin
pub const DEFAULT_BASE_URL: &str = "https://www.sohatey.info";

/// Route prefix shared by every entity collection
pub const DATA_PREFIX: &str = "manger_data";

/// Route returning the most recent patients
pub const RECENT_PATIENTS_ROUTE: &str = "user20";

/// Route searching patients server side
pub const SEARCH_ROUTE: &str = "findgsl";

/// Filename used when `Content-Disposition` is missing or malformed
pub const DEFAULT_REPORT_FILENAME: &str = "sickleaves.pdf";

/// Content type used when the report response has none
pub const DEFAULT_REPORT_CONTENT_TYPE: &str = "application/pdf";

/// Number of digits in a generated patient file number
pub const FILE_NUMBER_DIGITS: usize = 6;

/// Environment variable holding the API origin
pub const ENV_API_URL: &str = "HOSPITAL_ADMIN_API_URL";
/// Environment variable holding the connect timeout in milliseconds
pub const ENV_CONNECT_TIMEOUT: &str = "HOSPITAL_ADMIN_CONNECT_TIMEOUT_MS";
/// Environment variable holding the request timeout in milliseconds
pub const ENV_REQUEST_TIMEOUT: &str = "HOSPITAL_ADMIN_REQUEST_TIMEOUT_MS";

/// Server-side report templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Medical report
    Medical,
    /// New-format sick-leave certificate
    SickNew,
    /// Sick-leave certificate
    SickLeave,
    /// Visit attestation
    Visit,
    /// Companion certificate
    Companion,
    /// Companion visit attestation
    CompanionVisit,
}

impl ReportKind {
    /// Every report kind, in the order the list screens offer them
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Medical,
        ReportKind::SickNew,
        ReportKind::SickLeave,
        ReportKind::Visit,
        ReportKind::Companion,
        ReportKind::CompanionVisit,
    ];

    /// Stable identifier of the kind
    pub fn id(self) -> &'static str {
        match self {
            ReportKind::Medical => "medical",
            ReportKind::SickNew => "sick",
            ReportKind::SickLeave => "leave",
            ReportKind::Visit => "visit",
            ReportKind::Companion => "companion",
            ReportKind::CompanionVisit => "companion_visit",
        }
    }

    /// Route of the streamed download, relative to the API origin
    ///
    /// Some routes span two path segments.
    pub fn route(self) -> &'static str {
        match self {
            ReportKind::Medical => "medical",
            ReportKind::SickNew => "model_sikleaves_n/sickleavecreate",
            ReportKind::SickLeave => "sick",
            ReportKind::Visit => "model_sikleaves_visit/sickleavecreate",
            ReportKind::Companion => "model_sikleaves_comp/sickleavecreate",
            ReportKind::CompanionVisit => "model_sikleaves_comp_visit/sickleavecreate",
        }
    }

    /// Label shown on the report buttons
    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Medical => "تقرير طبي",
            ReportKind::SickNew => "تقرير جديد",
            ReportKind::SickLeave => "تقرير إجازة",
            ReportKind::Visit => "مشهد مراجعة",
            ReportKind::Companion => "تقرير مرافق",
            ReportKind::CompanionVisit => "مشهد مرافق",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ReportKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| ApiError::InvalidArgument(format!("Unknown report kind: {}", s)))
    }
}

/// How the caller wants a report delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportDelivery {
    /// Build a link the user opens directly; no bytes are fetched
    DirectOpen,
    /// Stream the report body with progress feedback
    #[default]
    StreamedDownload,
}

/// Client configuration options
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API origin, e.g. "https://www.sohatey.info"
    pub base_url: String,
    /// Timeout for establishing connections in milliseconds
    pub connect_timeout: u64,
    /// Timeout for JSON entity requests in milliseconds
    pub request_timeout: u64,
    /// Filename used when the server does not name the report
    pub fallback_filename: String,
    /// Content type used when the server does not type the report
    pub default_content_type: String,
    /// How many file numbers to try before giving up on a collision
    pub file_number_attempts: u32,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: 5000,
            request_timeout: 30000,
            fallback_filename: DEFAULT_REPORT_FILENAME.to_string(),
            default_content_type: DEFAULT_REPORT_CONTENT_TYPE.to_string(),
            file_number_attempts: 5,
            user_agent: concat!("hospital-admin-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates a new client configuration for the given API origin
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Reads the configuration from the environment
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(ENV_API_URL) {
            config.base_url = url;
        }
        if let Some(ms) = env_millis(ENV_CONNECT_TIMEOUT) {
            config.connect_timeout = ms;
        }
        if let Some(ms) = env_millis(ENV_REQUEST_TIMEOUT) {
            config.request_timeout = ms;
        }
        config
    }

    /// Sets the connection timeout in milliseconds
    pub fn with_connect_timeout(mut self, timeout: u64) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the request timeout in milliseconds
    pub fn with_request_timeout(mut self, timeout: u64) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the fallback report filename
    pub fn with_fallback_filename(mut self, name: impl Into<String>) -> Self {
        self.fallback_filename = name.into();
        self
    }

    /// Sets the default report content type
    pub fn with_default_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = content_type.into();
        self
    }

    /// Sets the number of file-number allocation attempts
    pub fn with_file_number_attempts(mut self, attempts: u32) -> Self {
        self.file_number_attempts = attempts;
        self
    }

    /// Sets the User-Agent header
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn env_millis(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.trim().parse().ok()
}
