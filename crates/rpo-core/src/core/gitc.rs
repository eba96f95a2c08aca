//! GITC variant installs: `gitc-init` targets a client directory under the
//! GITC filesystem root instead of the current working directory, then runs
//! the same bootstrap.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

/// A resolved GITC installation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitcClient {
    /// GITC filesystem root from the system configuration.
    pub root: PathBuf,
    /// Directory the bootstrap installs into (`<root>/<client>`).
    pub client_dir: PathBuf,
}

/// Resolve the target directory for a named GITC client.
///
/// # Errors
///
/// Returns an error when the configuration file is unreadable, does not
/// name a `gitc_dir`, or the client name is empty.
pub fn resolve_client(config_path: &Path, client: &str) -> Result<GitcClient> {
    if client.is_empty() {
        return Err(anyhow!("gitc client name is required"));
    }
    let contents = fs::read_to_string(config_path)
        .with_context(|| format!("cannot read GITC config {}", config_path.display()))?;
    let root = parse_gitc_root(&contents).ok_or_else(|| {
        anyhow!(
            "no gitc_dir entry in GITC config {}",
            config_path.display()
        )
    })?;
    let client_dir = root.join(client);
    Ok(GitcClient { root, client_dir })
}

/// Pull `gitc_dir` out of the `key=value` GITC configuration format.
fn parse_gitc_root(contents: &str) -> Option<PathBuf> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .find_map(|line| {
            let (key, value) = line.split_once('=')?;
            if key.trim() == "gitc_dir" {
                Some(PathBuf::from(value.trim()))
            } else {
                None
            }
        })
}
