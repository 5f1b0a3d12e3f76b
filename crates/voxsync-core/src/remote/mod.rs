//! Client contract for the transcription service.

mod client;

use std::future::Future;

pub use client::HttpRemoteClient;

use crate::error::Result;
use crate::models::Upload;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const VERIFY_CODE_PATH: &str = "/api/auth/verify-code";
pub const UPLOADS_PATH: &str = "/api/uploads/obsidian";
pub const ACKNOWLEDGE_PATH_PREFIX: &str = "/api/uploads/obsidian/sync";

/// The four calls the auth flow and sync engine depend on.
pub trait RemoteService: Send + Sync + 'static {
    /// Request a one-time code for `email`; returns the auth request id.
    fn login(&self, email: &str) -> impl Future<Output = Result<String>> + Send;

    /// Exchange a pending request id and code for a bearer token.
    fn verify_code(
        &self,
        auth_request_id: &str,
        code: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Uploads not yet acknowledged by this client.
    fn list_uploads(&self, token: &str) -> impl Future<Output = Result<Vec<Upload>>> + Send;

    /// Mark an upload as synced so the service stops returning it.
    fn acknowledge(&self, token: &str, upload_id: &str) -> impl Future<Output = Result<()>> + Send;
}
