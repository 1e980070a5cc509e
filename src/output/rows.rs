//! Flat output rows and email cardinality shaping

use crate::config::EmailCardinality;
use crate::model::TargetResult;
use serde::{Deserialize, Serialize};

/// Separator of multi-valued cells (emails, phones)
pub const CELL_SEPARATOR: &str = "; ";

/// One row of the `success`, `failed` or `all_combined` partition
///
/// Every partition uses this same shape. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub target_id: String,
    pub name: String,
    pub url: String,
    pub status: String,
    pub failure_reason: String,
    pub email: String,
    pub email_source: String,
    pub phones: String,
    pub site_type: String,
    pub discovery: String,
    pub text: String,
    /// Uninterpreted input columns as a JSON object, empty when there are none
    pub extra: String,
}

impl OutputRow {
    /// Column names, in field order
    pub const COLUMNS: [&'static str; 12] = [
        "target_id",
        "name",
        "url",
        "status",
        "failure_reason",
        "email",
        "email_source",
        "phones",
        "site_type",
        "discovery",
        "text",
        "extra",
    ];

    /// Cell values, in [`OutputRow::COLUMNS`] order
    pub fn values(&self) -> [&str; 12] {
        [
            self.target_id.as_str(),
            self.name.as_str(),
            self.url.as_str(),
            self.status.as_str(),
            self.failure_reason.as_str(),
            self.email.as_str(),
            self.email_source.as_str(),
            self.phones.as_str(),
            self.site_type.as_str(),
            self.discovery.as_str(),
            self.text.as_str(),
            self.extra.as_str(),
        ]
    }
}

/// Shapes a target result into output rows
///
/// # Arguments
///
/// * `result` - The terminal result of one target
/// * `cardinality` - How several emails are laid out
///
/// # Returns
///
/// At least one row. With [`EmailCardinality::OnePerRow`] a target with N
/// emails yields N rows sharing all other cells.
pub fn rows_for(result: &TargetResult, cardinality: EmailCardinality) -> Vec<OutputRow> {
    let base = OutputRow {
        target_id: result.target.id.clone(),
        name: result.target.name.clone().unwrap_or_default(),
        url: result.target.url.to_string(),
        status: result.status.as_str().to_string(),
        failure_reason: result
            .failure_reason
            .as_ref()
            .map(|r| r.code())
            .unwrap_or_default(),
        email: String::new(),
        email_source: result.email_source.as_str().to_string(),
        phones: result.phones.join(CELL_SEPARATOR),
        site_type: result.site_type.as_str().to_string(),
        discovery: result
            .discovery
            .map(|d| d.as_str().to_string())
            .unwrap_or_default(),
        text: result.text.clone().unwrap_or_default(),
        extra: if result.target.extra.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&result.target.extra).unwrap_or_default()
        },
    };

    if result.emails.is_empty() {
        return vec![base];
    }

    match cardinality {
        EmailCardinality::AllInOne => vec![OutputRow {
            email: result.emails.join(CELL_SEPARATOR),
            ..base
        }],
        EmailCardinality::PrimaryOnly => vec![OutputRow {
            email: result.emails[0].clone(),
            ..base
        }],
        EmailCardinality::OnePerRow => result
            .emails
            .iter()
            .map(|email| OutputRow {
                email: email.clone(),
                ..base.clone()
            })
            .collect(),
    }
}
