//! Record store client for CloudKit Web Services.

pub mod api;
mod client;
mod errors;
pub mod mapping;

pub use client::{CloudKitClient, ROTATED_TOKEN_HEADER, SignInRedirect};
pub use errors::{CloudKitError, ErrorKind};
