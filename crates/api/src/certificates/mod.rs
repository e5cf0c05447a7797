//! Certificate artifacts: rendering and batch archives.
//!
//! Issuance itself (claiming and zeroing ledger hours) lives in
//! `tiketon_db::repositories::CertificateRepo`; this module only turns a
//! [`CertificateDocument`](tiketon_core::certificate::CertificateDocument)
//! into bytes and packs batch results into a zip.

pub mod archive;
pub mod render;

pub use archive::{ArchiveBuilder, BatchManifest, MANIFEST_FILE};
pub use render::{BuiltinRenderer, CertificateRenderer};
