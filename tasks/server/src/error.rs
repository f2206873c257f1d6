use axum::extract::rejection::JsonRejection;
use std::error::Error;

use crate::task::RepositoryError;

/// Reason returned to clients for any error that is not known to be safe.
pub const GENERIC_REASON: &str = "Something went wrong";

/// Error whose reason is safe to return to a client verbatim.
///
/// Only validators and handlers build these, always from a fixed message
/// template, never from the text of an internal error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct SafeError {
    reason: String,
}

impl SafeError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the user-facing reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Returns the reason that may be shown to a client for `err`.
///
/// The error and its chain of sources are searched for a [`SafeError`], a
/// request body rejection, or a missing record. Anything else is replaced by
/// [`GENERIC_REASON`]; callers log the error itself at error level before
/// replying, so only a debug record is emitted here.
pub fn reason_for(err: &(dyn Error + 'static)) -> String {
    let mut current = Some(err);
    while let Some(candidate) = current {
        if let Some(safe) = candidate.downcast_ref::<SafeError>() {
            return safe.reason().to_string();
        }
        if let Some(rejection) = candidate.downcast_ref::<JsonRejection>() {
            return rejection.body_text();
        }
        if let Some(not_found @ RepositoryError::NotFound(_)) =
            candidate.downcast_ref::<RepositoryError>()
        {
            return not_found.to_string();
        }
        current = candidate.source();
    }

    tracing::debug!("Withholding internal error from client: {}", err);
    GENERIC_REASON.to_string()
}
