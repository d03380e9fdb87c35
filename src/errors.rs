//! Errors the board reports back to whoever emitted the intent.
//!
//! Persistence failures never show up here: the storage adapter logs and
//! swallows them so the in-memory board stays usable.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    /// A required form field was empty after trimming.
    #[error("Please fill in the {0} field")]
    MissingField(&'static str),

    #[error("Unknown status '{0}' (expected one of: wishlist, applied, interviewing, offer, rejected)")]
    UnknownStatus(String),
}
