//! Bearer credential and pending login state

use std::fmt;

/// Current authentication material for the transcription service.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    /// Bearer token; `None` means unauthenticated
    pub token: Option<String>,
    /// Identifier returned by the login call, consumed by code verification
    pub pending_auth_request_id: Option<String>,
}

impl Credential {
    /// True iff a non-empty token is present.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }

    /// Pending auth request id, if one is set and non-empty.
    pub fn pending_request(&self) -> Option<&str> {
        self.pending_auth_request_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credential")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "pending_auth_request_id",
                &self.pending_auth_request_id.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
