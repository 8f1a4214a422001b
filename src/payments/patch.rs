//! JSON Patch documents for PayPal's partial-update endpoints.
//!
//! PayPal only accepts `replace` here, so that is the only op modelled.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Replace,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    pub value: Value,
}

/// Ordered list of replace operations, serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PatchDocument(Vec<PatchOperation>);

impl PatchDocument {
    pub fn operations(&self) -> &[PatchOperation] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Changed fields in the order they were detected, keyed by field name
/// relative to the resource root (`description`,
/// `payment_preferences/auto_bill_outstanding`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldChanges {
    fields: Vec<(String, Value)>,
}

impl FieldChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((field.into(), value.into()));
    }

    /// Record `field` only when the old and new values differ.
    pub fn diff<T>(&mut self, field: &str, old: &T, new: &T)
    where
        T: PartialEq + Clone + Into<Value>,
    {
        if old != new {
            self.set(field, new.clone());
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(f, _)| f.as_str())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// One `replace` per changed field, addressed at `/<field>`.
    pub fn to_patch(&self) -> PatchDocument {
        PatchDocument(
            self.fields
                .iter()
                .map(|(field, value)| PatchOperation {
                    op: PatchOp::Replace,
                    path: format!("/{}", field),
                    value: value.clone(),
                })
                .collect(),
        )
    }
}
