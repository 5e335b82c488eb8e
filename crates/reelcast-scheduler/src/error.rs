use thiserror::Error;

/// Errors that can occur within the scheduling subsystem.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No entry with the given ID exists in the store.
    #[error("Schedule entry not found: {id}")]
    NotFound { id: String },

    /// A compare-and-set precondition failed: the entry is not in any of the
    /// expected statuses. Someone else is handling it.
    #[error("Status conflict on entry {id}: currently '{status}'")]
    Conflict { id: String, status: String },

    /// An entry for the same brand+variant already occupies this exact slot.
    #[error("Slot {time} already booked for {brand}/{variant}")]
    SlotTaken {
        brand: String,
        variant: String,
        time: String,
    },

    /// The entry spec is malformed (empty platform set, empty brand, …).
    #[error("Invalid entry: {0}")]
    Validation(String),

    /// The variant has no slot template configured.
    #[error("No slot template for variant: {0}")]
    UnknownVariant(String),

    /// A JSON column could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
