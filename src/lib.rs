//! rms: safe deletion with undo
//!
//! Deleted entries are moved into a holding directory and recorded in an
//! append-only ledger, so the most recent deletion can always be undone.

pub mod cli;
pub mod config;
pub mod error;
pub mod init;
pub mod ledger;
pub mod mover;
pub mod prompt;
pub mod record;
pub mod trash;
