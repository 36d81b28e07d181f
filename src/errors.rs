use thiserror::Error;

/// Errors raised by the tracker and its content/profile sources.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The configured aggregate quest is absent from the content database.
    /// Nothing can be tracked without it.
    #[error("aggregate quest not found in content database: {0}")]
    AggregateQuestMissing(String),

    /// The provider could not produce a snapshot for a profile.
    #[error("profile {profile_id} unavailable: {reason}")]
    ProfileUnavailable { profile_id: String, reason: String },

    /// A snapshot was produced but lacks a section the full pass needs.
    #[error("profile {profile_id} is missing its {section}")]
    IncompleteProfile {
        profile_id: String,
        section: &'static str,
    },

    /// Rejected before touching the filesystem.
    #[error("invalid profile id: {0}")]
    InvalidProfileId(String),

    /// Wrapper around IO errors (directory listing, file reads).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around JSON parse errors.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The blocking task running a pass panicked.
    #[error("progression pass failed: {0}")]
    PassFailed(String),

    #[error("progression tracker is not running")]
    DriverStopped,

    #[error("{path} exceeds {limit} bytes")]
    FileTooLarge { path: String, limit: u64 },
}
