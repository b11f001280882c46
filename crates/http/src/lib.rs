//! Stockroom HTTP client
//!
//! An authenticated client for the inventory API. Requests carry the stored
//! bearer token, and an expired session is refreshed once, on behalf of every
//! request that runs into it, before those requests are replayed.

pub mod client;
pub mod types;

pub use client::{
    Attempt, ClientError, LogNavigator, Navigator, RefreshError, RequestDescriptor, Resource,
    StockroomClient, StockroomClientBuilder,
};
pub use stockroom_core::{CredentialRecord, CredentialStore, UserProfile};
