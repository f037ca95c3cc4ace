//! Common types module for the audit desk.
//!
//! This module defines the core data types shared by the desk crates: record
//! statuses and roles, backend-owned records, quote cart items, the REST
//! envelope, product-builder field kinds and client-side form validation.

/// REST envelope and error body types.
pub mod api;
/// Bearer token wrapper with redacted output.
pub mod auth_token;
/// Items held by the quote cart.
pub mod cart;
/// Product-builder field kinds.
pub mod fields;
/// User-facing notices.
pub mod notice;
/// Backend-owned records and request payloads.
pub mod records;
/// Record status and caller role.
pub mod status;
/// Storage namespaces.
pub mod storage;
/// Client-side form validation.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use auth_token::AuthToken;
pub use cart::*;
pub use fields::*;
pub use notice::*;
pub use records::*;
pub use status::*;
pub use storage::*;
pub use validation::*;
