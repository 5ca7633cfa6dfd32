pub mod approval;
pub mod batch_approval;
pub mod batch_diff;
pub mod diff;

/// Which of the two approval actions a request invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
  Approve,
  Reject,
}
