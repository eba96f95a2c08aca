//! End-to-end install: environment gate, trust setup, clone, verify,
//! checkout. Any pipeline failure deletes the clone workspace wholesale so
//! a retry starts from "not installed".

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

use super::checkout;
use super::clone::{self, CloneOptions, RemoteSource};
use super::config::{Settings, INSTALL_DIR, SOURCE_DIR};
use super::fs::remove_dir_all_writable;
use super::git;
use super::locate::SelfCheckout;
use super::net::HttpContext;
use super::outcome::CloneFailure;
use super::trust::TrustStore;
use super::verify;

/// Parameters of a single bootstrap run. Overrides never mutate shared
/// state; they derive a new value.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub url: String,
    pub revision: String,
    pub quiet: bool,
    pub verify: bool,
    pub clone_bundle: bool,
}

impl BootstrapConfig {
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            url: settings.source_url.clone(),
            revision: settings.source_rev.clone(),
            quiet: false,
            verify: true,
            clone_bundle: true,
        }
    }

    /// Derive defaults from a live development checkout of the tool: its
    /// git dir becomes the source and its current branch the revision.
    ///
    /// # Errors
    ///
    /// Returns an error when the checkout has no current branch.
    pub fn from_checkout(settings: &Settings, checkout: &SelfCheckout) -> Result<Self> {
        let head = git::head_ref(&settings.git_program, &checkout.git_dir)?;
        Ok(Self {
            url: checkout.git_dir.display().to_string(),
            revision: head,
            ..Self::new(settings)
        })
    }
}

/// Run the bootstrap against `target`, the directory that will hold
/// `.rpo/`. Returns the populated clone workspace.
///
/// # Errors
///
/// Returns an error for environment failures (nothing created yet) and for
/// pipeline failures (after the clone workspace has been rolled back).
pub fn bootstrap(target: &Path, config: &BootstrapConfig, settings: &Settings) -> Result<PathBuf> {
    // Reject malformed refs before any process or directory side effect.
    let branch = clone::validate_branch(&config.revision)?;

    let root = target.join(INSTALL_DIR);
    match fs::create_dir(&root) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
        Err(err) => {
            return Err(err).with_context(|| format!("cannot make {} directory", root.display()))
        }
    }

    check_git_version(&settings.git_program)?;

    let trust = TrustStore::from_settings(settings)?;
    let can_verify = if trust.needs_setup() {
        trust.setup(config.quiet)?
    } else {
        true
    };

    let workspace = root.join(SOURCE_DIR);
    if let Err(failure) = install(&workspace, &branch, config, settings, &trust, can_verify) {
        if config.quiet {
            eprintln!("fatal: rpo init failed; run without --quiet to see why");
        }
        // Whole-directory rollback; there is no finer-grained undo.
        let _ = remove_dir_all_writable(&workspace);
        return Err(failure.into());
    }
    Ok(workspace)
}

fn install(
    workspace: &Path,
    branch: &str,
    config: &BootstrapConfig,
    settings: &Settings,
    trust: &TrustStore,
    can_verify: bool,
) -> Result<(), CloneFailure> {
    let git_program = &settings.git_program;
    let http = HttpContext::from_settings(settings)
        .map_err(|err| CloneFailure::new(format!("{err:#}")))?;
    let source = RemoteSource {
        url: config.url.clone(),
        branch: branch.to_string(),
    };

    if !config.quiet {
        eprintln!("Getting rpo ...");
        eprintln!("   from {}", source.url);
    }
    clone::clone(
        git_program,
        &source,
        workspace,
        &http,
        CloneOptions {
            quiet: config.quiet,
            clone_bundle: config.clone_bundle,
        },
    )?;

    let revision = if can_verify && config.verify {
        verify::verify(git_program, workspace, branch, &trust.gnupg_home(), config.quiet)?
    } else {
        // Best effort only: the install proceeds without cryptographic
        // assurance.
        debug!(branch, "verification skipped");
        format!("refs/remotes/origin/{branch}^0")
    };

    checkout::checkout(git_program, workspace, branch, &revision, config.quiet)
}

fn check_git_version(git_program: &str) -> Result<()> {
    let version = git::version(git_program)
        .with_context(|| format!("'{git_program}' is not installed or not usable"))?;
    let Some(version) = version else {
        bail!(
            "unrecognized git version string; git {} or later required",
            git::MIN_GIT_VERSION
        );
    };
    if !version.supported(git::MIN_GIT_VERSION) {
        bail!(
            "git {} or later required (found {version})",
            git::MIN_GIT_VERSION
        );
    }
    debug!(%version, "git version check passed");
    Ok(())
}
