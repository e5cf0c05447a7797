//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts, validated with `validator`
//! - Update DTOs or projection rows where the API needs them

pub mod event;
pub mod notification_log;
pub mod participant;
pub mod purge_settings;
pub mod scanner;
pub mod user;
