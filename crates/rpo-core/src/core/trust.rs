//! Per-user trust store: the GnuPG home holding the imported maintainer
//! public keys, plus a schema-version marker deciding when re-import runs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tracing::debug;

use super::config::Settings;
use super::process;
use super::version::Version;

/// Schema version of the embedded maintainer key set. Bumping it forces a
/// re-import on every user's next run.
const KEYRING_SCHEMA: Version = Version::new(1, 2, 0);
const KEYRING_MARKER: &str = "keyring-version";
const GNUPG_DIR: &str = "gnupg";

/// Armored public keys of the release maintainers. Import is additive, so
/// re-running it after a crash converges on the same keyring.
const MAINTAINER_KEYS: &str = "\
-----BEGIN PGP PUBLIC KEY BLOCK-----

mDMEanXv5xYJKwYBBAHaRw8BAQdAv9S34ItaiYRJ0EN5V2t96SMvHQMn1b3w8fRP
V4NOXKa0KHJwbyBNYWludGFpbmVyIDxycG8tZGV2QHJwby1wcm9qZWN0Lm9yZz6I
kAQTFggAOBYhBAUzvFBTxCPn+7p1Xh63eUYZ1krUBQJqde/nAhsDBQsJCAcCBhUK
CQgLAgQWAgMBAh4BAheAAAoJEB63eUYZ1krUuJcBANPUxjA+4Z4ZX7tDx0eo1PYp
XcfGSbJE3FBBJcYpXhiSAQDrwZ9Awd7Sey6LYSWbW6fDVGIVoG4Ew/YVLpJ4d5ve
BQ==
=SZQP
-----END PGP PUBLIC KEY BLOCK-----
";

/// Explicit trust-store value; callers check [`TrustStore::needs_setup`]
/// before [`TrustStore::setup`] (a precondition, not hidden laziness).
#[derive(Debug, Clone)]
pub struct TrustStore {
    home: PathBuf,
    gpg_program: String,
}

impl TrustStore {
    #[must_use]
    pub fn new(home: PathBuf, gpg_program: impl Into<String>) -> Self {
        Self {
            home,
            gpg_program: gpg_program.into(),
        }
    }

    /// # Errors
    ///
    /// Returns an error when no home directory can be determined.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let home = settings
            .trust_home()
            .ok_or_else(|| anyhow!("cannot determine the user home directory"))?;
        Ok(Self::new(home, settings.gpg_program.clone()))
    }

    /// GnuPG home directory used by tag verification (`GNUPGHOME`).
    #[must_use]
    pub fn gnupg_home(&self) -> PathBuf {
        self.home.join(GNUPG_DIR)
    }

    /// True when the keyring must be (re-)imported: the store directory is
    /// missing, the version marker is missing or empty, or the marker is
    /// older than the embedded key set.
    #[must_use]
    pub fn needs_setup(&self) -> bool {
        if !self.home.is_dir() {
            return true;
        }
        let Ok(marker) = fs::read_to_string(self.home.join(KEYRING_MARKER)) else {
            return true;
        };
        match Version::parse(&marker) {
            Some(version) => version < KEYRING_SCHEMA,
            None => true,
        }
    }

    /// Import the embedded maintainer keys. Returns whether verification
    /// will be possible this run: a missing gpg binary is a soft failure
    /// (warn and return `Ok(false)`), while a failed import is fatal.
    ///
    /// Safe to re-run after a crash mid-import; the marker is only written
    /// once the import has succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error when the store directories cannot be created, the
    /// import exits nonzero, or the marker cannot be written.
    pub fn setup(&self, quiet: bool) -> Result<bool> {
        fs::create_dir_all(&self.home)
            .with_context(|| format!("cannot make {} directory", self.home.display()))?;
        let gnupg = self.gnupg_home();
        if !gnupg.is_dir() {
            fs::create_dir(&gnupg)
                .with_context(|| format!("cannot make {} directory", gnupg.display()))?;
        }
        restrict_permissions(&gnupg)?;

        if which::which(&self.gpg_program).is_err() {
            if !quiet {
                eprintln!("warning: gpg ({}) is not available", self.gpg_program);
                eprintln!("warning: verifying the launcher is disabled");
            }
            return Ok(false);
        }

        let gnupg_home = gnupg.display().to_string();
        let output = process::run_with_input(
            &self.gpg_program,
            &["--import"],
            &[("GNUPGHOME", &gnupg_home)],
            None,
            MAINTAINER_KEYS.as_bytes(),
        )?;
        if !output.success() {
            bail!(
                "registering rpo maintainer keys failed: {}",
                output.stderr.trim()
            );
        }
        debug!(home = %self.home.display(), "maintainer keys imported");

        fs::write(
            self.home.join(KEYRING_MARKER),
            format!("{KEYRING_SCHEMA}\n"),
        )
        .with_context(|| format!("cannot write {}", self.home.join(KEYRING_MARKER).display()))?;
        Ok(true)
    }
}

#[cfg(unix)]
fn restrict_permissions(dir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
        .with_context(|| format!("cannot restrict {}", dir.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_dir: &Path) -> Result<()> {
    Ok(())
}
