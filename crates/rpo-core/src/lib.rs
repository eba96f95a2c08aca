#![deny(clippy::all, warnings)]

//! Core of the rpo launcher: locate an existing installation, bootstrap a
//! verified one when asked, and hand execution off to the installed tool.

mod core;

pub use crate::core::bootstrap::{bootstrap, BootstrapConfig};
pub use crate::core::clone::{validate_branch, RemoteSource};
pub use crate::core::config::{
    Settings, ENTRY_POINT, INSTALL_DIR, LAUNCHER_VERSION, SOURCE_DIR, TRUST_DIR,
};
pub use crate::core::gitc::{resolve_client, GitcClient};
pub use crate::core::locate::{find_installation, find_self_checkout, SelfCheckout};
pub use crate::core::outcome::CloneFailure;
pub use crate::core::process::RunOutput;
pub use crate::core::relaunch::{
    build_plan, exec, parse_invocation, resolve_interpreter, Invocation, RelaunchPlan,
    EXIT_CANNOT_SPAWN,
};
pub use crate::core::trust::TrustStore;
pub use crate::core::version::Version;
