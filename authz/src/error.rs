//! Error types for the authorization engine.

use thiserror::Error;

use crate::models::RoleId;

/// Errors surfaced by the engine's mutation and decoding entry points.
///
/// Contract violations (out-of-range identities, mismatched dimensions) are
/// not represented here: they are bugs in the calling code and panic so the
/// enclosing transaction aborts instead of committing half a change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// Adding the edge would make the implication graph cyclic.
    #[error("role {from:?} cannot imply role {to:?}: the implication graph would become cyclic")]
    ImplicationCycle { from: RoleId, to: RoleId },

    /// The serialized packed store does not start with the expected header.
    #[error("unrecognized authorization data header")]
    BadMagic,

    /// The serialized packed store uses a format version this build cannot
    /// read.
    #[error("unsupported authorization data version {0}")]
    UnsupportedVersion(u16),

    /// The serialized packed store ends before its declared contents do.
    #[error("authorization data truncated")]
    Truncated,

    /// The serialized packed store's buffers disagree with its declared
    /// dimensions.
    #[error("authorization data dimensions are inconsistent")]
    DimensionMismatch,
}
