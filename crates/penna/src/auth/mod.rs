//! Authentication types and token inspection.
//!
//! This module provides the credential types sent to the login and
//! registration endpoints, the token types kept in the credential store,
//! and the claim decoder used to check expiry without a network call.

mod claims;
mod credentials;
mod tokens;

pub use claims::{Claims, decode, is_expired};
pub use credentials::{Credentials, Registration};
pub(crate) use credentials::aggregate_field_errors;
pub use tokens::{AccessToken, RefreshToken, TokenPair};
