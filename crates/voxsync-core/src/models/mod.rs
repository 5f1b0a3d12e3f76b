//! Data models for voxsync

mod credential;
mod upload;

pub use credential::Credential;
pub use upload::{Upload, DEFAULT_UPLOAD_TITLE};
