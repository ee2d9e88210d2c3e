//! Common types module for the portal backend.
//!
//! This module defines the data types shared by every portal component:
//! views and their payloads, caller identities, domain entities, and the
//! HTTP-facing error type.

/// API error types and their HTTP mapping.
pub mod api;
/// Caller identities, capabilities, and access settings.
pub mod identity;
/// Order entity and its display projection.
pub mod order;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Secure string wrapper for tokens.
pub mod secret_string;
/// Storage namespaces.
pub mod storage;
/// Configuration validation types for implementation tables.
pub mod validation;
/// Client-rendered views and their strongly-typed payloads.
pub mod views;

pub use api::*;
pub use identity::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use storage::*;
pub use validation::*;
pub use views::*;
