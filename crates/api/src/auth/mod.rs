//! Authentication primitives and the Token Service.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- signed access and refresh tokens.
//! - [`service`] -- [`AuthService`](service::AuthService), which composes the
//!   two with the user directory.

pub mod jwt;
pub mod password;
pub mod service;
