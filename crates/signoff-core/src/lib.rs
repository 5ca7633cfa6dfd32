//! Core types and trait definitions for signoff.
//!
//! Model shapes, identifiers, diff records, and the service contracts the
//! HTTP handlers in `signoff-api` dispatch to. This crate has no HTTP or
//! database dependencies.

// Service traits return `impl Future + Send` and implementors use plain
// `async fn`; suppress the advisory lint about the returned futures.
#![allow(async_fn_in_trait)]

pub mod audit;
pub mod diff;
pub mod error;
pub mod id;
pub mod service;
pub mod shape;
pub mod status;

pub use error::{Error, Result};
pub use id::{IdValue, Identifier};
pub use shape::{FieldDescriptor, IdentityShape, ModelShape, ScalarKind};
