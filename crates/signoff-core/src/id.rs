//! Identifier values extracted from requests.

use std::fmt;

use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::Value;
use uuid::Uuid;

/// A single scalar identifier component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IdValue {
  String(String),
  Integer(i64),
  Unsigned(u64),
  Float(f64),
  Boolean(bool),
  Uuid(Uuid),
}

impl IdValue {
  pub fn to_json(&self) -> Value {
    match self {
      Self::String(s) => Value::String(s.clone()),
      Self::Integer(i) => Value::from(*i),
      Self::Unsigned(u) => Value::from(*u),
      Self::Float(f) => Value::from(*f),
      Self::Boolean(b) => Value::Bool(*b),
      Self::Uuid(u) => Value::String(u.hyphenated().to_string()),
    }
  }
}

impl fmt::Display for IdValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::String(s) => f.write_str(s),
      Self::Integer(i) => write!(f, "{i}"),
      Self::Unsigned(u) => write!(f, "{u}"),
      Self::Float(x) => write!(f, "{x}"),
      Self::Boolean(b) => write!(f, "{b}"),
      Self::Uuid(u) => write!(f, "{}", u.hyphenated()),
    }
  }
}

/// An ordered, possibly composite, resource identifier.
///
/// Components keep the order of the identity shape they were extracted with.
/// A single-component identifier serializes as the bare scalar; a composite
/// one serializes as an object keyed by the declared field keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
  parts: Vec<(String, IdValue)>,
}

impl Identifier {
  pub fn new(parts: Vec<(String, IdValue)>) -> Self { Self { parts } }

  pub fn single(key: impl Into<String>, value: IdValue) -> Self {
    Self {
      parts: vec![(key.into(), value)],
    }
  }

  pub fn parts(&self) -> &[(String, IdValue)] { &self.parts }

  pub fn len(&self) -> usize { self.parts.len() }

  pub fn is_empty(&self) -> bool { self.parts.is_empty() }

  pub fn is_composite(&self) -> bool { self.parts.len() > 1 }

  pub fn get(&self, key: &str) -> Option<&IdValue> {
    self.parts.iter().find(|(k, _)| k == key).map(|(_, v)| v)
  }

  /// The JSON form used in responses and as a storage key.
  pub fn to_json(&self) -> Value {
    match self.parts.as_slice() {
      [(_, v)] => v.to_json(),
      parts => Value::Object(
        parts.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
      ),
    }
  }
}

impl Serialize for Identifier {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    if let [(_, v)] = self.parts.as_slice() {
      return v.serialize(serializer);
    }
    let mut map = serializer.serialize_map(Some(self.parts.len()))?;
    for (k, v) in &self.parts {
      map.serialize_entry(k, v)?;
    }
    map.end()
  }
}

impl fmt::Display for Identifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, (_, v)) in self.parts.iter().enumerate() {
      if i > 0 {
        f.write_str("/")?;
      }
      write!(f, "{v}")?;
    }
    Ok(())
  }
}
