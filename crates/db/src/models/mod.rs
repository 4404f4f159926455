//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row and a create DTO for inserts. Neither table supports updates.

pub mod prediction;
pub mod user;
