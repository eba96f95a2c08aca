//! Launcher settings, resolved once from the process environment and
//! threaded explicitly through the bootstrap (no mutable process globals).

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Launcher version reported to the installed tool via `--wrapper-version`.
pub const LAUNCHER_VERSION: &str = "1.21";

/// Per-tree install root created in the user's working directory.
pub const INSTALL_DIR: &str = ".rpo";
/// Clone workspace for the tool's own source, under [`INSTALL_DIR`].
pub const SOURCE_DIR: &str = "rpo";
/// Entry point of the installed tool, relative to the clone workspace.
pub const ENTRY_POINT: &str = "main.py";
/// Per-user trust-store directory name, under the home directory.
pub const TRUST_DIR: &str = ".rpoconfig";

const DEFAULT_SOURCE_URL: &str = "https://git.rpo-project.org/rpo";
const DEFAULT_SOURCE_REV: &str = "stable";
const DEFAULT_GITC_CONFIG: &str = "/gitc/.config";

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub(crate) fn flag_is_enabled(&self, key: &str) -> bool {
        matches!(self.vars.get(key).map(String::as_str), Some("1"))
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

/// Resolved launcher configuration.
///
/// `RPO_GIT`, `RPO_GPG`, and `RPO_PYTHON` override the external program
/// names; `RPO_URL` / `RPO_REV` override where the tool's own source is
/// bootstrapped from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source_url: String,
    pub source_rev: String,
    pub git_program: String,
    pub gpg_program: String,
    pub python_program: Option<String>,
    pub curl_verbose: bool,
    pub home_dir: Option<PathBuf>,
    pub gitc_config_path: PathBuf,
}

impl Settings {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        Self {
            source_url: snapshot
                .var("RPO_URL")
                .unwrap_or(DEFAULT_SOURCE_URL)
                .to_string(),
            source_rev: snapshot
                .var("RPO_REV")
                .unwrap_or(DEFAULT_SOURCE_REV)
                .to_string(),
            git_program: snapshot.var("RPO_GIT").unwrap_or("git").to_string(),
            gpg_program: snapshot.var("RPO_GPG").unwrap_or("gpg").to_string(),
            python_program: snapshot.var("RPO_PYTHON").map(ToOwned::to_owned),
            curl_verbose: snapshot.flag_is_enabled("RPO_CURL_VERBOSE"),
            home_dir: dirs_next::home_dir(),
            gitc_config_path: snapshot
                .var("RPO_GITC_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GITC_CONFIG)),
        }
    }

    /// Per-user trust-store root (`~/.rpoconfig`).
    #[must_use]
    pub fn trust_home(&self) -> Option<PathBuf> {
        self.home_dir.as_ref().map(|home| home.join(TRUST_DIR))
    }
}
