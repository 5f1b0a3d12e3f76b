//! Email + one-time-code login and credential persistence.

mod flow;
mod store;

pub use flow::{AuthFlow, AuthState, AuthStep};
pub use store::{
    CredentialPersistence, CredentialStore, MemoryCredentialPersistence,
    SettingsCredentialPersistence,
};
