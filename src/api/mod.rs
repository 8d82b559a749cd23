//! kDrive API client and types.

pub mod client;
pub mod error;
pub(crate) mod types;

pub use client::KdriveClient;
pub use error::ApiErrorCode;
