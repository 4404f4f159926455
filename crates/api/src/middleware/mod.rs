//! Request extractors that enforce authentication.
//!
//! - [`auth::AuthUser`] -- the user behind a Bearer access token.

pub mod auth;
