use teeter_core::types::LinkShape;
use thiserror::Error;

use crate::backend::{JointHandle, LinkHandle};

/// Errors returned by a [`PhysicsAdapter`](crate::PhysicsAdapter).
///
/// Copy so callers can record the failure and carry on.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PhysicsError {
    #[error("Unknown link handle {0}")]
    UnknownLink(LinkHandle),

    #[error("Unknown joint handle {0}")]
    UnknownJoint(JointHandle),

    #[error("Invalid link shape: {0:?}")]
    InvalidShape(LinkShape),

    #[error("Non-finite {0}")]
    NonFinite(&'static str),

    #[error("Joint must connect two distinct links, got {0} twice")]
    SelfJoint(LinkHandle),
}
