//! Shared types for `nullbind`: targets, configuration, the scan result model
//! and the failure taxonomy used by every layer.

pub mod config;
pub mod error;
pub mod models;
pub mod network;
