//! Caller-defined extraction schemas
//!
//! A schema is an ordered map of field name to expected kind. Declared kinds
//! are free text in configuration (`"number"`, `"array - list of tools"`);
//! only the leading word matters and anything unrecognized is a string.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Expected kind of an extracted field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    List,
}

impl FieldKind {
    /// Parses a declared kind from its leading word
    ///
    /// # Examples
    ///
    /// ```
    /// use leadscout::extract::FieldKind;
    ///
    /// assert_eq!(FieldKind::from_declared("integer"), FieldKind::Number);
    /// assert_eq!(FieldKind::from_declared("array - List of technologies"), FieldKind::List);
    /// assert_eq!(FieldKind::from_declared("date"), FieldKind::String);
    /// ```
    pub fn from_declared(declared: &str) -> Self {
        let word: String = declared
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();

        match word.as_str() {
            "number" | "integer" | "int" | "float" | "decimal" => Self::Number,
            "boolean" | "bool" => Self::Boolean,
            "list" | "array" => Self::List,
            _ => Self::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::List => "list",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed field name -> kind mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSchema {
    fields: BTreeMap<String, FieldKind>,
}

impl ExtractionSchema {
    /// Creates an empty schema (links-only extraction)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a schema from declared `name = "kind"` pairs
    pub fn from_declared(declared: &BTreeMap<String, String>) -> Self {
        Self {
            fields: declared
                .iter()
                .map(|(name, kind)| (name.trim().to_string(), FieldKind::from_declared(kind)))
                .collect(),
        }
    }

    /// The built-in schema describing a company lead
    pub fn lead_defaults() -> Self {
        use FieldKind::*;
        let fields = [
            ("company_name", String),
            ("industry", String),
            ("description", String),
            ("contact_email", String),
            ("contact_phone", String),
            ("location", String),
            ("website", String),
            ("company_size", String),
            ("technologies", List),
            ("social_links", List),
            ("pain_points", List),
            ("key_people", List),
        ];
        Self {
            fields: fields
                .into_iter()
                .map(|(name, kind)| (name.to_string(), kind))
                .collect(),
        }
    }

    /// Adds or replaces a field
    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.fields.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.fields.iter().map(|(name, kind)| (name.as_str(), *kind))
    }
}
