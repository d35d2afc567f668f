//! Core types shared by the mesika SSO gateway crates.
//!
//! This crate provides the error-handling foundation and the strongly-typed
//! identifiers used by the platform-access core and the HTTP server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, UserId};
