use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Scanner {scanner_id} is already a participant of event {event_id}")]
    DuplicateParticipant { event_id: DbId, scanner_id: DbId },

    #[error("Event {event_id} is full ({max_scanners} scanners)")]
    CapacityExceeded { event_id: DbId, max_scanners: i32 },

    #[error("No hours available to certify")]
    NoHoursAvailable,

    #[error("Delivery via {channel} failed: {reason}")]
    DeliveryFailure { channel: &'static str, reason: String },

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
