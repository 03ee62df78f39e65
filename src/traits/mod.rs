//! Trait abstractions for dependency injection and testability.
//!
//! This module provides trait-based seams for everything the SDK needs from
//! the outside world, enabling mocking and better testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP transport (GET, POST, streaming POST)
//! - [`IdentityProvider`] - stable per-client user identifier

pub mod http;
pub mod identity;

pub use http::{ByteStream, Headers, HttpClient, HttpError, Response};
pub use identity::IdentityProvider;
