//! Model shapes — statically declared field metadata for a resource.
//!
//! A [`ModelShape`] lists a resource's fields with their serialization keys
//! and scalar kinds. Handlers derive an [`IdentityShape`] from it once, at
//! construction, and use that to pull identifiers out of requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  id::IdValue,
};

// ─── Scalar kinds ────────────────────────────────────────────────────────────

/// The scalar type an identifier field converts to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScalarKind {
  String,
  Integer,
  Unsigned,
  Float,
  Boolean,
  Uuid,
}

impl ScalarKind {
  /// Convert a raw path segment into a value of this kind. Floats must be
  /// finite.
  pub fn parse(self, key: &str, raw: &str) -> Result<IdValue> {
    let invalid = || Error::InvalidValue {
      key:   key.to_owned(),
      kind:  self,
      value: raw.to_owned(),
    };
    Ok(match self {
      Self::String => IdValue::String(raw.to_owned()),
      Self::Integer => IdValue::Integer(raw.parse().map_err(|_| invalid())?),
      Self::Unsigned => IdValue::Unsigned(raw.parse().map_err(|_| invalid())?),
      Self::Float => IdValue::Float(
        raw
          .parse::<f64>()
          .ok()
          .filter(|f| f.is_finite())
          .ok_or_else(invalid)?,
      ),
      Self::Boolean => IdValue::Boolean(raw.parse().map_err(|_| invalid())?),
      Self::Uuid => IdValue::Uuid(Uuid::parse_str(raw).map_err(|_| invalid())?),
    })
  }

  /// Convert a decoded JSON value into a value of this kind.
  ///
  /// Strings are accepted for every kind and parsed as a path segment would
  /// be; string-kinded keys also accept numbers and booleans as text.
  pub fn from_json(self, key: &str, value: &Value) -> Result<IdValue> {
    if let Value::String(s) = value {
      return self.parse(key, s);
    }
    let converted = match (self, value) {
      (Self::String, Value::Number(n)) => Some(IdValue::String(n.to_string())),
      (Self::String, Value::Bool(b)) => Some(IdValue::String(b.to_string())),
      (Self::Integer, Value::Number(n)) => n.as_i64().map(IdValue::Integer),
      (Self::Unsigned, Value::Number(n)) => n.as_u64().map(IdValue::Unsigned),
      (Self::Float, Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).map(IdValue::Float),
      (Self::Boolean, Value::Bool(b)) => Some(IdValue::Boolean(*b)),
      _ => None,
    };
    converted.ok_or_else(|| Error::InvalidValue {
      key:   key.to_owned(),
      kind:  self,
      value: value.to_string(),
    })
  }
}

// ─── Field descriptors ───────────────────────────────────────────────────────

/// One declared field of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
  /// Logical field name, e.g. `user_id`.
  pub name:       String,
  /// Declared serialization key. Identifier fields are referred to by key.
  pub key:        String,
  pub kind:       ScalarKind,
  /// Whether the field is part of the resource's unique key.
  #[serde(default)]
  pub identifier: bool,
}

impl FieldDescriptor {
  pub fn new(name: impl Into<String>, key: impl Into<String>, kind: ScalarKind) -> Self {
    Self {
      name: name.into(),
      key: key.into(),
      kind,
      identifier: false,
    }
  }
}

// ─── Model shape ─────────────────────────────────────────────────────────────

/// The declared fields of a resource, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelShape {
  name:   String,
  fields: Vec<FieldDescriptor>,
}

impl ModelShape {
  pub fn builder(name: impl Into<String>) -> ModelShapeBuilder {
    ModelShapeBuilder {
      name:   name.into(),
      fields: Vec::new(),
    }
  }

  /// Build a shape from an already-assembled field list, rejecting duplicate
  /// keys.
  pub fn from_fields(
    name: impl Into<String>,
    fields: Vec<FieldDescriptor>,
  ) -> Result<Self> {
    let name = name.into();
    for (i, field) in fields.iter().enumerate() {
      if fields[..i].iter().any(|f| f.key == field.key) {
        return Err(Error::DuplicateKey {
          model: name,
          key:   field.key.clone(),
        });
      }
    }
    Ok(Self { name, fields })
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn fields(&self) -> &[FieldDescriptor] { &self.fields }

  /// Look up a field by its serialization key.
  pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
    self.fields.iter().find(|f| f.key == key)
  }

  /// Keys of the fields flagged as identifiers, in declaration order.
  pub fn identifier_keys(&self) -> Vec<&str> {
    self
      .fields
      .iter()
      .filter(|f| f.identifier)
      .map(|f| f.key.as_str())
      .collect()
  }

  /// Default audit resource name: `UserRole` becomes `user-role`.
  pub fn resource_name(&self) -> String { build_resource_name(&self.name) }

  /// Derive the identifier-only shape.
  ///
  /// An empty `keys` slice selects the fields flagged as identifiers;
  /// otherwise `keys` is used verbatim and fixes the identifier order.
  pub fn identity(&self, keys: &[String]) -> Result<IdentityShape> {
    let fields = if keys.is_empty() {
      self.fields.iter().filter(|f| f.identifier).cloned().collect()
    } else {
      keys
        .iter()
        .map(|k| {
          self.field(k).cloned().ok_or_else(|| Error::UnknownField {
            model: self.name.clone(),
            key:   k.clone(),
          })
        })
        .collect::<Result<Vec<_>>>()?
    };

    if fields.is_empty() {
      return Err(Error::NoIdentifierFields(self.name.clone()));
    }

    Ok(IdentityShape {
      model: self.name.clone(),
      fields,
    })
  }
}

/// Incremental builder for [`ModelShape`].
#[derive(Debug)]
pub struct ModelShapeBuilder {
  name:   String,
  fields: Vec<FieldDescriptor>,
}

impl ModelShapeBuilder {
  /// Declare a non-identifier field.
  pub fn field(
    mut self,
    name: impl Into<String>,
    key: impl Into<String>,
    kind: ScalarKind,
  ) -> Self {
    self.fields.push(FieldDescriptor::new(name, key, kind));
    self
  }

  /// Declare an identifier field. Identifier order is declaration order.
  pub fn id(
    mut self,
    name: impl Into<String>,
    key: impl Into<String>,
    kind: ScalarKind,
  ) -> Self {
    let mut field = FieldDescriptor::new(name, key, kind);
    field.identifier = true;
    self.fields.push(field);
    self
  }

  pub fn build(self) -> Result<ModelShape> {
    ModelShape::from_fields(self.name, self.fields)
  }
}

// ─── Identity shape ──────────────────────────────────────────────────────────

/// The identifier fields of a model, in identifier order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityShape {
  model:  String,
  fields: Vec<FieldDescriptor>,
}

impl IdentityShape {
  pub fn model(&self) -> &str { &self.model }

  pub fn fields(&self) -> &[FieldDescriptor] { &self.fields }

  pub fn len(&self) -> usize { self.fields.len() }

  pub fn is_empty(&self) -> bool { self.fields.is_empty() }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.fields.iter().map(|f| f.key.as_str())
  }
}

fn build_resource_name(name: &str) -> String {
  let mut out = String::with_capacity(name.len() + 4);
  for c in name.chars() {
    if c.is_uppercase() {
      out.push('-');
      out.extend(c.to_lowercase());
    } else {
      out.push(c);
    }
  }
  match out.strip_prefix(['-', '_']) {
    Some(rest) => rest.to_owned(),
    None => out,
  }
}
