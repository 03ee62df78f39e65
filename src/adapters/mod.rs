//! Concrete implementations of the trait seams.
//!
//! Production adapters wrap the real dependencies; the [`mock`] submodule
//! provides test doubles with the same shapes.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP transport using reqwest
//! - [`mock::MockHttpClient`] - configurable responses and a request spy
//! - [`mock::FixedIdentity`] - constant user id

pub mod mock;
pub mod reqwest_http;

pub use reqwest_http::ReqwestHttpClient;
