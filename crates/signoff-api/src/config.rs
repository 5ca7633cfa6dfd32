//! Handler configuration.
//!
//! Both structs deserialize with every field optional, so they can be read
//! straight out of a config file section.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use signoff_core::{ModelShape, diff::DiffModelConfig};

use crate::error::ConfigError;

pub const DEFAULT_APPROVE_ACTION: &str = "approve";
pub const DEFAULT_REJECT_ACTION: &str = "reject";
pub const DEFAULT_DIFF_ACTION: &str = "diff";
pub const DEFAULT_OFFSET: usize = 1;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Configuration shared by [`ApprovalHandler`](crate::ApprovalHandler) and
/// [`BatchApprovalHandler`](crate::BatchApprovalHandler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
  /// Audit resource name. Defaults to the model name, dash-cased.
  pub resource:       Option<String>,
  pub approve_action: String,
  pub reject_action:  String,
  /// Identifier keys, in path order. Empty selects the model's flagged
  /// identifier fields.
  pub id_keys:        Vec<String>,
  /// Leading path segments to skip before identifier segments. Ignored by
  /// the batch handler.
  pub offset:         usize,
  /// Status written when the service fails. Defaults to 200 for the single
  /// handler and 500 for the batch handler.
  pub failure_status: Option<u16>,
  pub max_body_bytes: usize,
}

impl Default for ApprovalConfig {
  fn default() -> Self {
    Self {
      resource:       None,
      approve_action: DEFAULT_APPROVE_ACTION.into(),
      reject_action:  DEFAULT_REJECT_ACTION.into(),
      id_keys:        Vec::new(),
      offset:         DEFAULT_OFFSET,
      failure_status: None,
      max_body_bytes: DEFAULT_MAX_BODY_BYTES,
    }
  }
}

impl ApprovalConfig {
  pub(crate) fn resource_for(&self, shape: &ModelShape) -> String {
    label_or(self.resource.as_deref(), None, || shape.resource_name())
  }

  pub(crate) fn approve_label(&self) -> String {
    label_or(Some(self.approve_action.as_str()), None, || DEFAULT_APPROVE_ACTION.into())
  }

  pub(crate) fn reject_label(&self) -> String {
    label_or(Some(self.reject_action.as_str()), None, || DEFAULT_REJECT_ACTION.into())
  }
}

/// Configuration shared by [`DiffHandler`](crate::DiffHandler) and
/// [`BatchDiffHandler`](crate::BatchDiffHandler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
  /// Audit resource name. Falls back to `projection.resource`, then to the
  /// model name, dash-cased.
  pub resource:       Option<String>,
  /// Audit action label. Falls back to `projection.action`, then `diff`.
  pub action:         Option<String>,
  pub id_keys:        Vec<String>,
  pub offset:         usize,
  /// Status written when the service fails. Defaults to 500.
  pub failure_status: Option<u16>,
  pub max_body_bytes: usize,
  /// Output key names. When unset, diff records are written with their own
  /// keys.
  pub projection:     Option<DiffModelConfig>,
}

impl Default for DiffConfig {
  fn default() -> Self {
    Self {
      resource:       None,
      action:         None,
      id_keys:        Vec::new(),
      offset:         DEFAULT_OFFSET,
      failure_status: None,
      max_body_bytes: DEFAULT_MAX_BODY_BYTES,
      projection:     None,
    }
  }
}

impl DiffConfig {
  pub(crate) fn resource_for(&self, shape: &ModelShape) -> String {
    let fallback = self.projection.as_ref().and_then(|p| p.resource.as_deref());
    label_or(self.resource.as_deref(), fallback, || shape.resource_name())
  }

  pub(crate) fn action_label(&self) -> String {
    let fallback = self.projection.as_ref().and_then(|p| p.action.as_deref());
    label_or(self.action.as_deref(), fallback, || DEFAULT_DIFF_ACTION.into())
  }
}

/// First non-empty of `primary`, `secondary`, else `default()`.
fn label_or(
  primary: Option<&str>,
  secondary: Option<&str>,
  default: impl FnOnce() -> String,
) -> String {
  primary
    .filter(|s| !s.is_empty())
    .or(secondary.filter(|s| !s.is_empty()))
    .map(str::to_owned)
    .unwrap_or_else(default)
}

pub(crate) fn failure_status(
  configured: Option<u16>,
  default: StatusCode,
) -> Result<StatusCode, ConfigError> {
  match configured {
    None => Ok(default),
    Some(code) => StatusCode::from_u16(code).map_err(|_| ConfigError::Status(code)),
  }
}

#[cfg(test)]
mod tests {
  use signoff_core::ScalarKind;

  use super::*;

  fn shape() -> ModelShape {
    ModelShape::builder("UserRole")
      .id("id", "id", ScalarKind::String)
      .build()
      .unwrap()
  }

  #[test]
  fn empty_labels_fall_back_to_defaults() {
    let config = ApprovalConfig {
      approve_action: String::new(),
      resource: Some(String::new()),
      ..Default::default()
    };
    assert_eq!(config.approve_label(), "approve");
    assert_eq!(config.reject_label(), "reject");
    assert_eq!(config.resource_for(&shape()), "user-role");
  }

  #[test]
  fn diff_labels_prefer_config_then_projection() {
    let mut config = DiffConfig {
      projection: Some(DiffModelConfig {
        resource: Some("roles".into()),
        action: Some("compare".into()),
        ..Default::default()
      }),
      ..Default::default()
    };
    assert_eq!(config.resource_for(&shape()), "roles");
    assert_eq!(config.action_label(), "compare");

    config.action = Some("inspect".into());
    assert_eq!(config.action_label(), "inspect");
    assert_eq!(DiffConfig::default().action_label(), "diff");
  }

  #[test]
  fn config_deserializes_from_partial_json() {
    let config: ApprovalConfig =
      serde_json::from_str(r#"{"offset": 2, "failure_status": 500}"#).unwrap();
    assert_eq!(config.offset, 2);
    assert_eq!(config.failure_status, Some(500));
    assert_eq!(config.approve_action, "approve");
  }

  #[test]
  fn out_of_range_failure_status_is_rejected() {
    assert!(matches!(
      failure_status(Some(1000), StatusCode::OK),
      Err(ConfigError::Status(1000))
    ));
    assert_eq!(
      failure_status(None, StatusCode::OK).unwrap(),
      StatusCode::OK
    );
  }
}
