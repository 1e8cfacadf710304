//! HTTP transport for the blog API.
//!
//! This module provides the reqwest client, the immutable request
//! descriptor used by the gateway, and the endpoint wire types.

mod client;
mod endpoints;
mod request;

pub(crate) use client::{HttpClient, HttpResponse};
pub(crate) use endpoints::*;
pub use request::{ApiRequest, AuthMode};
pub use reqwest::Method;
