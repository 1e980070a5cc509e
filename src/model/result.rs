use crate::model::Target;
use std::fmt;
use std::time::Duration;

/// Terminal outcome of one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetStatus {
    Success,
    Failed,
}

impl TargetStatus {
    /// Converts the status to its output string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// Why a target ended up `failed`
///
/// Transient network reasons (`Timeout`, `ConnectionError`) are only
/// reported after the retry budget is spent. HTTP and content reasons are
/// reported on the first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    Timeout,
    ConnectionError,
    HttpError(u16),
    NotHtml,
    Dynamic,
    NoEmailFoundStatic,
    NoEmailFoundDynamic,
}

impl FailureReason {
    /// Output code, e.g. `timeout` or `http_error_404`
    pub fn code(&self) -> String {
        match self {
            Self::Timeout => "timeout".to_string(),
            Self::ConnectionError => "connection_error".to_string(),
            Self::HttpError(status) => format!("http_error_{}", status),
            Self::NotHtml => "not_html".to_string(),
            Self::Dynamic => "dynamic".to_string(),
            Self::NoEmailFoundStatic => "no_email_found_static".to_string(),
            Self::NoEmailFoundDynamic => "no_email_found_dynamic".to_string(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

/// Where the emitted emails were found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailSource {
    Homepage,
    DeepSearch,
    None,
}

impl EmailSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Homepage => "homepage",
            Self::DeepSearch => "deep_search",
            Self::None => "none",
        }
    }
}

/// Rendering classification of a site's homepage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SiteType {
    Static,
    Dynamic,
    #[default]
    Unknown,
}

impl SiteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Unknown => "unknown",
        }
    }
}

/// How the candidate pages of a deep search were found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryStrategy {
    Sitemap,
    SitemapPlusPattern,
    Pattern,
}

impl DiscoveryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sitemap => "sitemap",
            Self::SitemapPlusPattern => "sitemap+pattern",
            Self::Pattern => "pattern",
        }
    }
}

/// Final output for one target
#[derive(Debug, Clone)]
pub struct TargetResult {
    pub target: Target,

    pub status: TargetStatus,

    /// Set exactly when `status` is `Failed`
    pub failure_reason: Option<FailureReason>,

    /// Validated emails, best candidate first
    pub emails: Vec<String>,

    pub email_source: EmailSource,

    pub phones: Vec<String>,

    pub site_type: SiteType,

    /// Cleaned page text, when text retention is enabled
    pub text: Option<String>,

    /// Discovery strategy, when a deep search ran
    pub discovery: Option<DiscoveryStrategy>,

    /// False in content-only mode: a success then carries no emails by request
    pub emails_requested: bool,

    /// Pages successfully fetched for this target, homepage included
    pub pages_fetched: u32,

    /// Attempts spent on the homepage request
    pub homepage_attempts: u32,

    pub elapsed: Duration,
}

impl TargetResult {
    /// Creates a failed result
    pub fn failed(target: Target, reason: FailureReason, site_type: SiteType) -> Self {
        Self {
            target,
            status: TargetStatus::Failed,
            failure_reason: Some(reason),
            emails: Vec::new(),
            email_source: EmailSource::None,
            phones: Vec::new(),
            site_type,
            text: None,
            discovery: None,
            emails_requested: true,
            pages_fetched: 0,
            homepage_attempts: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Creates a successful result
    ///
    /// `emails` must be non-empty unless `emails_requested` is false.
    pub fn success(
        target: Target,
        emails: Vec<String>,
        email_source: EmailSource,
        site_type: SiteType,
        emails_requested: bool,
    ) -> Self {
        debug_assert!(!emails_requested || !emails.is_empty());
        Self {
            target,
            status: TargetStatus::Success,
            failure_reason: None,
            emails,
            email_source,
            phones: Vec::new(),
            site_type,
            text: None,
            discovery: None,
            emails_requested,
            pages_fetched: 0,
            homepage_attempts: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TargetStatus::Success
    }

    /// Number of emails this result contributes to the run count
    pub fn email_count(&self) -> usize {
        self.emails.len()
    }
}
