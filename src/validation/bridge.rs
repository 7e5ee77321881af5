use crate::builder::DocumentSnapshot;
use crate::error::ApiError;
use crate::fable::{FableDocument, ValidationState};
use std::sync::Arc;
use tracing::{debug, warn};

/// A validation request for one document version.
#[derive(Debug, Clone)]
pub struct ValidationTicket {
    pub version: u64,
    pub document: Arc<FableDocument>,
}

/// What consumers of validation see.
///
/// `state == None` means "unknown": nothing has been validated yet, or the
/// fable is empty. Consumers must treat that as permissive, not as invalid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationStatus {
    pub state: Option<ValidationState>,
    /// Message of the latest failed call. The previous `state` is kept alongside it.
    pub last_error: Option<String>,
    /// Document version `state` was computed for.
    pub validated_version: Option<u64>,
    /// Version of the request currently awaiting an answer.
    pub in_flight: Option<u64>,
}

impl ValidationStatus {
    /// `Some(true/false)` once a verdict exists, `None` while unknown.
    pub fn is_valid(&self) -> Option<bool> {
        self.state.as_ref().map(|state| state.is_valid)
    }
}

/// Outcome of [`ValidationBridge::complete`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationUpdate {
    Applied { version: u64 },
    Failed { version: u64, error: String },
    /// The document moved on while the request was out; the answer was dropped.
    Stale { version: u64, current: u64 },
}

#[derive(Debug, Default)]
pub struct ValidationBridge {
    status: ValidationStatus,
}

impl ValidationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &ValidationStatus {
        &self.status
    }

    /// Opens a request for `snapshot`. An empty fable is never validated;
    /// instead the state goes back to unknown.
    pub fn begin(&mut self, snapshot: &DocumentSnapshot) -> Option<ValidationTicket> {
        if snapshot.document.is_empty() {
            self.status = ValidationStatus::default();
            return None;
        }
        debug!(version = snapshot.version, "Requesting validation");
        self.status.in_flight = Some(snapshot.version);
        Some(ValidationTicket {
            version: snapshot.version,
            document: Arc::clone(&snapshot.document),
        })
    }

    /// Applies the answer to `ticket` if it is still about the current document.
    pub fn complete(
        &mut self,
        ticket: &ValidationTicket,
        result: Result<ValidationState, ApiError>,
        current_version: u64,
    ) -> ValidationUpdate {
        if self.status.in_flight == Some(ticket.version) {
            self.status.in_flight = None;
        }

        let superseded = self
            .status
            .validated_version
            .is_some_and(|applied| applied > ticket.version);
        if ticket.version != current_version || superseded {
            debug!(
                version = ticket.version,
                current = current_version,
                "Discarding stale validation result"
            );
            return ValidationUpdate::Stale {
                version: ticket.version,
                current: current_version,
            };
        }

        match result {
            Ok(state) => {
                debug!(
                    version = ticket.version,
                    valid = state.is_valid,
                    errors = state.error_count(),
                    "Validation applied"
                );
                self.status.state = Some(state);
                self.status.validated_version = Some(ticket.version);
                self.status.last_error = None;
                ValidationUpdate::Applied {
                    version: ticket.version,
                }
            }
            Err(e) => {
                warn!(version = ticket.version, error = %e, "Validation failed, keeping previous state");
                let error = e.to_string();
                self.status.last_error = Some(error.clone());
                ValidationUpdate::Failed {
                    version: ticket.version,
                    error,
                }
            }
        }
    }
}
