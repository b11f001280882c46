//! Stockroom core types and utilities

pub mod config;
pub mod credentials;
pub mod error;

pub use config::ClientConfig;
pub use credentials::{
    CredentialRecord, CredentialStore, FileCredentialStore, MemoryCredentialStore, UserProfile,
};
pub use error::{CoreError, CoreResult};
