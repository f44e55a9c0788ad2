//! Core data models for attachment migration.
//!
//! Resource groups decide which table and which blob container an
//! attachment belongs to; attachment rows map to those tables via
//! `sqlx::FromRow` and serialize as JSON via `serde`.

pub mod attachment;
pub mod resource_group;
