//! Bulk guest import models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::GuestSummary;

/// Known columns of a guest import sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportField {
    Name,
    InvitationName,
    Phone,
    MaxGuests,
    InvitedBy,
    TimesSent,
}

impl ImportField {
    /// Header spellings accepted for this column, already folded
    /// (lowercase, no spaces, underscores or dashes).
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Name => &["name"],
            Self::InvitationName => &["invitationname"],
            Self::Phone => &["phone", "phonenumber"],
            Self::MaxGuests => &["maxguests"],
            Self::InvitedBy => &["invitedby"],
            Self::TimesSent => &["timessent", "timessended"],
        }
    }
}

fn fold_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !matches!(*c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// One line of a tabular import, keyed by column header.
///
/// Cell values may arrive as JSON strings, numbers or booleans; they are read
/// back as text. `null` counts as an empty cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportRow(BTreeMap<String, Value>);

impl ImportRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a cell, replacing any previous value under the same header.
    pub fn with(mut self, header: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(header.into(), value.into());
        self
    }

    /// Returns the cell text for a known column, matching headers loosely.
    pub fn field(&self, field: ImportField) -> Option<String> {
        let aliases = field.aliases();
        self.0
            .iter()
            .find(|(header, _)| aliases.contains(&fold_header(header).as_str()))
            .and_then(|(_, value)| cell_text(value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ImportRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Why a row ended up in the error list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorKind {
    /// The row itself was unusable.
    Validation,
    /// The storage collaborator failed to create the guest.
    Dependency,
}

/// A row that could not be imported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    /// Row number (1-indexed) in the submitted batch.
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: RowErrorKind,
    pub reason: String,
}

/// A row whose phone already belongs to a guest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateRow {
    /// Row number (1-indexed) in the submitted batch.
    pub row: usize,
    pub name: String,
    /// Canonical phone of the row.
    pub phone: String,
    /// Guest the row collided with.
    pub existing: GuestSummary,
}

/// Structured result of an import run.
///
/// Rows are only ever added through the `record_*` methods, each of which
/// bumps `total`, so `total == created + duplicates.len() + errors.len()`
/// holds at every point.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub total: usize,
    pub created: usize,
    pub created_ids: Vec<String>,
    pub duplicates: Vec<DuplicateRow>,
    pub errors: Vec<RowError>,
}

impl ImportOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&mut self, id: String) {
        self.total += 1;
        self.created += 1;
        self.created_ids.push(id);
    }

    pub fn record_duplicate(&mut self, duplicate: DuplicateRow) {
        self.total += 1;
        self.duplicates.push(duplicate);
    }

    pub fn record_error(&mut self, error: RowError) {
        self.total += 1;
        self.errors.push(error);
    }

    /// Whether every counted row landed in exactly one category.
    pub fn is_balanced(&self) -> bool {
        self.total == self.created + self.duplicates.len() + self.errors.len()
            && self.created == self.created_ids.len()
    }
}

/// Request body of the import endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub data: Vec<ImportRow>,
}

/// Response metadata of the import endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportMeta {
    pub success: bool,
}

/// Response body of the import endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub data: ImportOutcome,
    pub meta: ImportMeta,
}

impl From<ImportOutcome> for ImportResponse {
    fn from(outcome: ImportOutcome) -> Self {
        Self {
            data: outcome,
            meta: ImportMeta { success: true },
        }
    }
}
