//! Bidirectional synchronization between the row editor and the raw text
//! blob of a draft document.
//!
//! The two representations stay consistent without re-entrancy flags: each
//! mutating call is the authoritative source for that synchronization step
//! and rebuilds the opposite representation before it returns, so
//! convergence takes exactly one step and feedback loops cannot happen.

use std::collections::HashSet;

use serde_json::Value;

use super::model::{DraftTarget, FieldRow};
use crate::document::{Document, FieldMap};
use crate::error::{Result, VellumError};

const INVALID_JSON: &str = "Invalid JSON format.";
const NOT_AN_OBJECT: &str = "Document body must be a JSON object.";

/// Placeholder body a new document starts from, so the row editor has a
/// non-empty starting point.
const NEW_DOCUMENT_KEY: &str = "key";
const NEW_DOCUMENT_VALUE: &str = "value";

/// Modal editing state for one document.
///
/// Exists only while an add/edit dialog is open; discarding it has no side
/// effects. The text blob is the single source of truth for a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftEditor {
    target: DraftTarget,
    rows: Vec<FieldRow>,
    text: String,
    validation_error: Option<String>,
}

impl DraftEditor {
    /// Starts a draft for a document that does not exist yet.
    pub fn for_new() -> Self {
        let rows = vec![FieldRow::new(NEW_DOCUMENT_KEY, NEW_DOCUMENT_VALUE)];
        let mut body = FieldMap::new();
        body.insert(
            NEW_DOCUMENT_KEY.to_string(),
            Value::String(NEW_DOCUMENT_VALUE.to_string()),
        );
        Self {
            target: DraftTarget::New { id: None },
            text: render_body(&body),
            rows,
            validation_error: None,
        }
    }

    /// Starts a draft over an existing document.
    pub fn for_document(document: &Document) -> Self {
        let rows = document
            .fields
            .iter()
            .map(|(key, value)| FieldRow::new(key.clone(), render_value(value)))
            .collect();
        Self {
            target: DraftTarget::Existing {
                id: document.id.clone(),
            },
            rows,
            text: render_body(&document.fields),
            validation_error: None,
        }
    }

    pub fn target(&self) -> &DraftTarget {
        &self.target
    }

    pub fn rows(&self) -> &[FieldRow] {
        &self.rows
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The standing validation error, if the blob is currently malformed.
    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    /// Sets the desired id of a new document. Blank means the backend
    /// assigns one. Ignored for existing documents, whose id is immutable.
    pub fn set_id(&mut self, id: Option<String>) {
        if let DraftTarget::New { id: target_id } = &mut self.target {
            *target_id = id.filter(|value| !value.is_empty());
        }
    }

    /// Replaces the rows and rebuilds the text blob from them.
    ///
    /// Rows with an empty key are excluded from the body; each raw value is
    /// parsed as JSON with a plain-string fallback; duplicate keys keep the
    /// last value. The rebuilt blob is valid by construction, so any
    /// standing validation error clears.
    pub fn rows_changed(&mut self, rows: Vec<FieldRow>) {
        self.rows = rows;
        let mut body = FieldMap::new();
        for row in &self.rows {
            let key = row.key.trim();
            if key.is_empty() {
                continue;
            }
            body.insert(key.to_string(), parse_row_value(&row.value));
        }
        self.text = render_body(&body);
        self.validation_error = None;
    }

    /// Replaces the text blob and patches the rows to match.
    ///
    /// The blob is stored verbatim. If it does not parse as a JSON object a
    /// validation error is surfaced and the rows are left untouched. On
    /// success the rows are diffed by key: unchanged keys keep their
    /// position, changed values update in place, new keys append, vanished
    /// keys are removed.
    pub fn text_changed(&mut self, text: &str) -> Result<()> {
        self.text = text.to_string();
        let body = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(body)) => body,
            Ok(_) => return Err(self.invalidate(NOT_AN_OBJECT)),
            Err(_) => return Err(self.invalidate(INVALID_JSON)),
        };
        self.validation_error = None;
        for (key, value) in &body {
            let rendered = render_value(value);
            match self.rows.iter_mut().find(|row| &row.key == key) {
                Some(row) => {
                    if row.value != rendered {
                        row.value = rendered;
                    }
                }
                None => self.rows.push(FieldRow::new(key.clone(), rendered)),
            }
        }
        let mut seen = HashSet::new();
        self.rows
            .retain(|row| body.contains_key(&row.key) && seen.insert(row.key.clone()));
        Ok(())
    }

    /// Parses the blob into the body a save would write.
    ///
    /// The blob is the single source of truth: if it does not parse as a
    /// JSON object the save is rejected and no mutation may be attempted.
    pub fn commit_body(&self) -> Result<FieldMap> {
        match serde_json::from_str::<Value>(&self.text) {
            Ok(Value::Object(body)) => Ok(body),
            Ok(_) => Err(VellumError::validation(NOT_AN_OBJECT)),
            Err(_) => Err(VellumError::validation(INVALID_JSON)),
        }
    }

    fn invalidate(&mut self, message: &str) -> VellumError {
        self.validation_error = Some(message.to_string());
        VellumError::validation(message)
    }
}

/// Renders a field value into row text: strings raw, containers pretty,
/// everything else in its JSON form.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

/// Parses row text as JSON, falling back to a plain string.
fn parse_row_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn render_body(body: &FieldMap) -> String {
    serde_json::to_string_pretty(&Value::Object(body.clone()))
        .unwrap_or_else(|_| String::from("{}"))
}
