//! Untrusted raw items as returned by the works API.
//!
//! Items are kept as loosely-typed JSON so that one malformed field never
//! fails a whole page. Accessors return `None` for anything missing, null or
//! of the wrong type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One raw work from the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawItem(pub Value);

/// A concept tag attached to a raw work.
#[derive(Debug, Clone, PartialEq)]
pub struct RawConcept<'a> {
    /// Display name, if present and a string
    pub display_name: Option<&'a str>,

    /// Hierarchy level; missing or non-numeric levels read as 0
    pub level: f64,
}

impl RawItem {
    /// Wrap a JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// `publication_date` string.
    pub fn publication_date(&self) -> Option<&str> {
        self.str_field("publication_date")
    }

    /// `title` string.
    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    /// `doi` string, usually a full resolver URL.
    pub fn doi(&self) -> Option<&str> {
        self.str_field("doi")
    }

    /// `primary_location.source.display_name`.
    pub fn source_display_name(&self) -> Option<&str> {
        self.0
            .get("primary_location")
            .and_then(|location| location.get("source"))
            .and_then(|source| source.get("display_name"))
            .and_then(Value::as_str)
    }

    /// Concept tags in their given order; empty when absent.
    pub fn concepts(&self) -> Vec<RawConcept<'_>> {
        self.0
            .get("concepts")
            .and_then(Value::as_array)
            .map(|concepts| {
                concepts
                    .iter()
                    .map(|concept| RawConcept {
                        display_name: concept.get("display_name").and_then(Value::as_str),
                        level: concept.get("level").and_then(Value::as_f64).unwrap_or(0.0),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl From<Value> for RawItem {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
