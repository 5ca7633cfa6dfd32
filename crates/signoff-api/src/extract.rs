//! Identifier extraction from request paths and bodies.

use std::borrow::Cow;

use axum::body::Body;
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use signoff_core::{IdentityShape, Identifier};

use crate::error::ExtractError;

/// Split a request path into percent-decoded segments. The leading `/` does
/// not produce a segment. A segment that does not decode to UTF-8 is an
/// error.
pub fn path_segments(path: &str) -> Result<Vec<Cow<'_, str>>, ExtractError> {
  path
    .strip_prefix('/')
    .unwrap_or(path)
    .split('/')
    .enumerate()
    .map(|(position, s)| {
      percent_decode_str(s)
        .decode_utf8()
        .map_err(|_| ExtractError::Encoding { position })
    })
    .collect()
}

/// Build an identifier from path segments `[offset, offset + identity.len())`.
///
/// Segment `offset + i` supplies identifier field `i`. Empty segments count
/// as missing.
pub fn build_id(
  path: &str,
  identity: &IdentityShape,
  offset: usize,
) -> Result<Identifier, ExtractError> {
  let segments = path_segments(path)?;
  let mut parts = Vec::with_capacity(identity.len());
  for (i, field) in identity.fields().iter().enumerate() {
    let position = offset + i;
    let raw = segments
      .get(position)
      .filter(|s| !s.is_empty())
      .ok_or_else(|| ExtractError::MissingSegment {
        key: field.key.clone(),
        position,
      })?;
    parts.push((field.key.clone(), field.kind.parse(&field.key, raw)?));
  }
  Ok(Identifier::new(parts))
}

/// Decode a JSON array of objects into identifiers.
///
/// Each object is narrowed to the identity shape: keys outside it are
/// dropped without error. A missing or `null` identifier key is an error.
pub fn build_ids(
  body: &[u8],
  identity: &IdentityShape,
) -> Result<Vec<Identifier>, ExtractError> {
  let items: Vec<Map<String, Value>> = serde_json::from_slice(body)?;
  items
    .iter()
    .enumerate()
    .map(|(index, item)| narrow(index, item, identity))
    .collect()
}

fn narrow(
  index: usize,
  item: &Map<String, Value>,
  identity: &IdentityShape,
) -> Result<Identifier, ExtractError> {
  let mut parts = Vec::with_capacity(identity.len());
  for field in identity.fields() {
    let value = item
      .get(&field.key)
      .filter(|v| !v.is_null())
      .ok_or_else(|| ExtractError::MissingField {
        index,
        key: field.key.clone(),
      })?;
    parts.push((field.key.clone(), field.kind.from_json(&field.key, value)?));
  }
  Ok(Identifier::new(parts))
}

/// Buffer a request body, refusing anything over `limit` bytes.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, ExtractError> {
  axum::body::to_bytes(body, limit)
    .await
    .map_err(|e| ExtractError::Body(e.to_string()))
}

#[cfg(test)]
mod tests {
  use signoff_core::{IdValue, ModelShape, ScalarKind};

  use super::*;

  fn composite() -> IdentityShape {
    ModelShape::builder("Membership")
      .id("tenant", "tenant", ScalarKind::String)
      .field("note", "note", ScalarKind::String)
      .id("user_id", "userId", ScalarKind::Integer)
      .build()
      .unwrap()
      .identity(&[])
      .unwrap()
  }

  #[test]
  fn segments_skip_leading_slash_and_decode() {
    let segments = path_segments("/users/a%20b/approve").unwrap();
    assert_eq!(segments, ["users", "a b", "approve"]);
  }

  #[test]
  fn invalid_utf8_segment_is_rejected() {
    let identity = ModelShape::builder("User")
      .id("id", "id", ScalarKind::String)
      .build()
      .unwrap()
      .identity(&[])
      .unwrap();
    for path in ["/users/%FF/approve", "/users/%FE/approve"] {
      let err = build_id(path, &identity, 1).unwrap_err();
      assert!(matches!(err, ExtractError::Encoding { position: 1 }), "{path}");
    }
    assert_eq!(
      build_id("/users/%C3%A9/approve", &identity, 1).unwrap().to_string(),
      "é"
    );
  }

  #[test]
  fn build_id_reads_segments_after_offset_in_order() {
    let id = build_id("/memberships/acme/42/approve", &composite(), 1).unwrap();
    assert_eq!(
      id.parts(),
      [
        ("tenant".to_string(), IdValue::String("acme".into())),
        ("userId".to_string(), IdValue::Integer(42)),
      ]
    );
  }

  #[test]
  fn build_id_honours_larger_offsets() {
    let id = build_id("/api/v1/memberships/acme/42", &composite(), 3).unwrap();
    assert_eq!(id.to_string(), "acme/42");
  }

  #[test]
  fn build_id_reports_missing_segment() {
    let err = build_id("/memberships/acme", &composite(), 1).unwrap_err();
    assert!(matches!(
      err,
      ExtractError::MissingSegment { ref key, position: 2 } if key == "userId"
    ));
  }

  #[test]
  fn build_id_treats_empty_segment_as_missing() {
    let err = build_id("/memberships//42", &composite(), 1).unwrap_err();
    assert!(matches!(err, ExtractError::MissingSegment { position: 1, .. }));
  }

  #[test]
  fn build_id_reports_conversion_failure() {
    let err = build_id("/memberships/acme/abc", &composite(), 1).unwrap_err();
    assert_eq!(err.to_string(), r#"invalid integer value "abc" for "userId""#);
  }

  #[test]
  fn build_ids_drops_extra_fields() {
    let body = br#"[
      {"tenant": "acme", "userId": 1, "note": "ignored", "extra": [1, 2]},
      {"userId": "2", "tenant": "globex"}
    ]"#;
    let ids = build_ids(body, &composite()).unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0].to_string(), "acme/1");
    assert_eq!(ids[1].get("userId"), Some(&IdValue::Integer(2)));
    assert_eq!(ids[1].parts()[0].0, "tenant");
  }

  #[test]
  fn build_ids_requires_every_identifier_key() {
    let err = build_ids(br#"[{"tenant": "acme"}]"#, &composite()).unwrap_err();
    assert!(matches!(err, ExtractError::MissingField { index: 0, .. }));
  }

  #[test]
  fn build_ids_rejects_malformed_json() {
    let err = build_ids(b"[{", &composite()).unwrap_err();
    assert!(matches!(err, ExtractError::Json(_)));
    let err = build_ids(br#"{"tenant": "acme"}"#, &composite()).unwrap_err();
    assert!(matches!(err, ExtractError::Json(_)));
  }

  #[test]
  fn build_ids_accepts_empty_list() {
    assert!(build_ids(b"[]", &composite()).unwrap().is_empty());
  }
}
