//! Authorized session.

/// Session granted by the server at the end of a successful handshake.
///
/// Both fields are opaque server tokens. The session is never renewed or
/// persisted; it lives until the process exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// `SESSION_ID` from the AUTH response
    pub session_id: String,
    /// `ROLE` from the AUTH response
    pub role: String,
}

impl Session {
    /// Create a session from its two tokens.
    pub fn new(session_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self { session_id: session_id.into(), role: role.into() }
    }
}
