//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or any `PgExecutor`, so they can join a caller's
//! transaction) as the first argument. Ledger and issuance operations open
//! their own transactions and return [`crate::LedgerError`].

pub mod certificate_repo;
pub mod event_repo;
pub mod notification_log_repo;
pub mod participant_repo;
pub mod purge_settings_repo;
pub mod scanner_repo;
pub mod team_leader_repo;
pub mod user_repo;

pub use certificate_repo::{CertificateRepo, IssuedCertificate};
pub use event_repo::EventRepo;
pub use notification_log_repo::NotificationLogRepo;
pub use participant_repo::ParticipantRepo;
pub use purge_settings_repo::PurgeSettingsRepo;
pub use scanner_repo::ScannerRepo;
pub use team_leader_repo::TeamLeaderRepo;
pub use user_repo::UserRepo;
