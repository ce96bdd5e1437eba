//! Error types shared by every stage of the kernel.

use thiserror::Error;

/// The error type for all fallible operations in this crate.
///
/// Variants correspond to the failure domains of the pipeline. Only
/// [`Error::LayoutInfeasible`] and [`Error::PlanarizationFailed`] are ever
/// recovered from, and only inside the documented layout fallbacks; the rest
/// propagate to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid vertex id, disallowed self-loop or directed edge, or a
    /// malformed payload.
    #[error("bad input: {0}")]
    BadInput(String),

    /// A rotation system that is inconsistent with its graph (wrong
    /// multiplicity or endpoint mismatch).
    #[error("bad rotation: {0}")]
    BadRotation(String),

    /// The orthogonal bend-minimisation flow has no solution.
    #[error("orthogonal layout infeasible: {0}")]
    LayoutInfeasible(String),

    /// An edge reinsertion found no dual path (for example on a
    /// disconnected routing mesh).
    #[error("planarization failed: {0}")]
    PlanarizationFailed(String),

    /// The request was cancelled. Mapped to a terminal error message on
    /// the output channel, never to a result.
    #[error("Computation cancelled")]
    Cancelled,

    /// A structural invariant did not hold (Euler check, face closure,
    /// twin pairing). Not recoverable.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// A specialized `Result` type for kernel operations.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub(crate) fn bad_input(msg: impl Into<String>) -> Self {
        Error::BadInput(msg.into())
    }

    pub(crate) fn bad_rotation(msg: impl Into<String>) -> Self {
        Error::BadRotation(msg.into())
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether this error is the distinguished cancellation flag.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
