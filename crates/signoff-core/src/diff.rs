//! Diff records and their output projection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A pending change to one resource: what it is now, what it would become,
/// and who proposed it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffRecord {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:     Option<Value>,
  /// The live value, if the resource already exists.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub origin: Option<Value>,
  /// The proposed value.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value:  Option<Value>,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub by:     String,
}

impl DiffRecord {
  /// Project onto caller-chosen keys, keeping only the components that are
  /// present: non-null `id`, `origin`, `value`, and non-empty `by`.
  pub fn project(&self, config: &DiffModelConfig) -> Map<String, Value> {
    let mut out = Map::new();
    let present = |v: &Option<Value>| v.as_ref().filter(|v| !v.is_null()).cloned();
    if let Some(id) = present(&self.id) {
      out.insert(config.id.clone(), id);
    }
    if let Some(origin) = present(&self.origin) {
      out.insert(config.origin.clone(), origin);
    }
    if let Some(value) = present(&self.value) {
      out.insert(config.value.clone(), value);
    }
    if !self.by.is_empty() {
      out.insert(config.by.clone(), Value::String(self.by.clone()));
    }
    out
  }
}

/// Output key names for the four diff components, plus optional audit labels
/// for the diff handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffModelConfig {
  pub id:       String,
  pub origin:   String,
  pub value:    String,
  pub by:       String,
  pub resource: Option<String>,
  pub action:   Option<String>,
}

impl Default for DiffModelConfig {
  fn default() -> Self {
    Self {
      id:       "id".into(),
      origin:   "origin".into(),
      value:    "value".into(),
      by:       "by".into(),
      resource: None,
      action:   None,
    }
  }
}
