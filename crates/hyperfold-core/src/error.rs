//! Structured errors for store and engine operations.
//!
//! Every failing operation validates before it mutates, so an `Err` always
//! means the graph is exactly as it was before the call.

use thiserror::Error;

use crate::model::{EntityKind, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An operation referenced an id that does not exist.
    #[error("{kind} not found: '{id}'")]
    NotFound { kind: EntityKind, id: String },

    /// A container-membership edit would create a self-reference or a cycle.
    #[error("invalid hierarchy: cannot place '{child}' under '{parent}': {reason}")]
    InvalidHierarchy {
        parent: NodeId,
        child: NodeId,
        reason: HierarchyViolation,
    },

    /// A child is already owned by a different container.
    #[error("'{child}' already belongs to '{parent}', cannot move it under '{requested}'")]
    AlreadyParented {
        child: NodeId,
        parent: NodeId,
        requested: NodeId,
    },

    /// An id is already used by an entity of another kind.
    #[error("id '{id}' is already used by a {existing}")]
    DuplicateId { id: String, existing: EntityKind },
}

/// Why a hierarchy edit was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HierarchyViolation {
    #[error("a container cannot contain itself")]
    SelfReference,
    #[error("the child is an ancestor of the parent")]
    Cycle,
}

impl GraphError {
    pub(crate) fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        GraphError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
