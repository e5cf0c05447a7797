//! Well-known role name constants.
//!
//! These must match the `CHECK` constraint on `users.role` in
//! `20250101000001_create_users_and_scanners.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_TEAM_LEADER: &str = "team_leader";

/// Whether `role` may create events, manage participants and issue
/// certificates.
pub fn can_manage_events(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_TEAM_LEADER
}
