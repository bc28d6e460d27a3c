//! Hidden form posted into a frame by the form-submission path.

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// `<form method="post" target="...">` with one hidden input per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenForm {
    pub id: String,
    pub method: String,
    /// Name of the frame the form posts into
    pub target: String,
    pub action: Url,
    pub fields: Vec<FormField>,
}

impl HiddenForm {
    pub fn post(id: impl Into<String>, target: impl Into<String>, action: Url) -> Self {
        Self {
            id: id.into(),
            method: "post".to_string(),
            target: target.into(),
            action,
            fields: Vec::new(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(FormField::new(name, value));
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}
