//! Error types for `muster-core`.

use thiserror::Error;
use uuid::Uuid;

/// Shown by a station when the store failed, so it never implies that a
/// write went through.
pub const STORE_UNAVAILABLE_MESSAGE: &str = "Attendance could not be recorded. Please try again.";

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid scan code: {0:?}")]
  InvalidScanCode(String),

  #[error("invalid scan action: {0:?}")]
  InvalidAction(String),

  /// The directory or attendance store could not be read or written.
  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A guarded write was rejected twice in a row for the same scan.
  #[error("attendance for student {0} was modified concurrently")]
  ConcurrentModification(Uuid),
}

impl Error {
  /// Wrap a backend error as [`Error::StoreUnavailable`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::StoreUnavailable(Box::new(err))
  }

  /// The message a scan station shows for this failure.
  pub fn user_message(&self) -> &'static str {
    match self {
      Error::InvalidScanCode(_) => "Invalid scan code.",
      Error::InvalidAction(_) => "Invalid action.",
      Error::StoreUnavailable(_) => STORE_UNAVAILABLE_MESSAGE,
      Error::ConcurrentModification(_) => {
        "Attendance changed while recording. Please scan again."
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
