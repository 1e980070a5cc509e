use std::collections::BTreeMap;
use url::Url;

/// One site to be processed in a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Checkpoint identifier (host without `www.`, see [`crate::url::target_id`])
    pub id: String,

    /// Display name from the input table, if any
    pub name: Option<String>,

    /// Normalized root URL to start from
    pub url: Url,

    /// Input columns the engine does not interpret, carried through to the output
    pub extra: BTreeMap<String, String>,
}

impl Target {
    /// Builds a target from an already normalized URL
    ///
    /// Returns None when no identifier can be derived (URL without a host).
    pub fn new(url: Url, name: Option<String>) -> Option<Self> {
        let id = crate::url::target_id(&url)?;
        Some(Self {
            id,
            name: name.filter(|n| !n.trim().is_empty()),
            url,
            extra: BTreeMap::new(),
        })
    }

    /// Attaches uninterpreted input columns
    pub fn with_extra(mut self, extra: BTreeMap<String, String>) -> Self {
        self.extra = extra;
        self
    }

    /// Name for log lines: display name when present, identifier otherwise
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
