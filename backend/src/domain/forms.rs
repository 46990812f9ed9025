//! Typed validation results for form submissions.
//!
//! Validation functions return `Result<Cleaned, FormErrors>`. A non-empty
//! [`FormErrors`] means nothing was committed; handlers surface the messages
//! back to the submitter.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use super::Error;

/// Field-level and form-level validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    /// An empty error set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `field`.
    pub fn add_field(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Record a message that is not tied to a single field.
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    /// Whether no messages were recorded.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// Messages recorded against `field`.
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Form-level messages.
    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    /// Every message flattened for display: form-level first, then
    /// `field: message` pairs.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = self.non_field.clone();
        for (field, errors) in &self.fields {
            messages.extend(errors.iter().map(|error| format!("{field}: {error}")));
        }
        messages
    }

    /// `Ok(value)` when empty, otherwise `Err(self)`.
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl From<FormErrors> for Error {
    fn from(value: FormErrors) -> Self {
        let summary = value
            .messages()
            .into_iter()
            .next()
            .unwrap_or_else(|| "invalid form".to_owned());
        Error::invalid_request(summary).with_details(json!({ "form": value }))
    }
}

/// Pull the flattened form messages out of an error produced by
/// `From<FormErrors>`, falling back to the error message.
pub fn form_messages(error: &Error) -> Vec<String> {
    let parsed = error
        .details()
        .and_then(|details| details.get("form"))
        .and_then(|form| {
            let non_field = form.get("nonField")?.as_array()?;
            let fields = form.get("fields")?.as_object()?;
            let mut messages: Vec<String> = non_field
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect();
            for (field, errors) in fields {
                for message in errors.as_array().into_iter().flatten() {
                    if let Some(text) = message.as_str() {
                        messages.push(format!("{field}: {text}"));
                    }
                }
            }
            Some(messages)
        });
    match parsed {
        Some(messages) if !messages.is_empty() => messages,
        _ => vec![error.message().to_owned()],
    }
}
