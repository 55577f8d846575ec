//! # nullbind core
//!
//! The bind-and-enumerate protocol driver.
//!
//! * **[`network`]**: connection lifecycle and the `ldap3` backed client.
//! * **[`directory`]**: the trait seam every pipeline stage talks through.
//! * **[`scanner`]**: the per-target pipeline and multi-target orchestration.
//! * **[`aggregator`]**: ordered collection of finished scans.

pub mod aggregator;
pub mod directory;
pub mod network;
pub mod scanner;
