//! voxsync-core - Core library for voxsync
//!
//! This crate contains the credential store, the email + one-time-code auth
//! flow, the remote uploads client, and the sync engine that turns
//! transcribed voice uploads into markdown notes.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
mod guard;
pub mod models;
pub mod presenter;
pub mod remote;
pub mod storage;
pub mod sync;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use models::{Credential, Upload};
