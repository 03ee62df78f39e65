//! Test doubles for the SDK's trait seams.
//!
//! - [`MockHttpClient`] - configurable responses, recorded requests
//! - [`FixedIdentity`] - constant user id

mod http;
mod identity;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use identity::FixedIdentity;
