//! Internal implementation modules for `rpo-core`.
//!
//! Callers should go through the re-exports in the crate root rather than
//! importing these modules directly.

pub mod bootstrap;
pub mod checkout;
pub mod clone;
pub mod config;
pub mod fs;
pub mod git;
pub mod gitc;
pub mod locate;
pub mod net;
pub mod outcome;
pub mod process;
pub mod relaunch;
pub mod trust;
pub mod verify;
pub mod version;
