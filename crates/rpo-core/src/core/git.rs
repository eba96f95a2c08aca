//! git invocation helpers shared by the clone/verify/checkout pipeline.

use std::path::Path;

use anyhow::{anyhow, Context, Result};

use super::outcome::CloneFailure;
use super::process::{self, RunOutput};
use super::version::Version;

/// Oldest git release the bootstrap protocol is known to work with.
pub(crate) const MIN_GIT_VERSION: Version = Version::new(1, 7, 2);

const VERSION_PREFIX: &str = "git version ";

/// Query and parse the installed git version. `None` means the reported
/// string was unrecognized, which callers treat as unsupported.
///
/// # Errors
///
/// Returns an error when git cannot be executed at all.
pub(crate) fn version(git_program: &str) -> Result<Option<Version>> {
    let output = process::run_capture(git_program, &["--version"], &[], None)?;
    if !output.success() {
        return Err(anyhow!(
            "{git_program} --version exited with status {}",
            output.code
        ));
    }
    Ok(Version::parse_with_prefix(VERSION_PREFIX, &output.stdout))
}

/// Current branch ref of a local checkout, e.g. `refs/heads/stable`.
///
/// # Errors
///
/// Returns an error when the checkout has no current branch.
pub(crate) fn head_ref(git_program: &str, git_dir: &Path) -> Result<String> {
    let git_dir_arg = format!("--git-dir={}", git_dir.display());
    let output = process::run_capture(git_program, &[&git_dir_arg, "symbolic-ref", "HEAD"], &[], None)
        .with_context(|| format!("failed to run {git_program} symbolic-ref"))?;
    if !output.success() || output.stdout.trim().is_empty() {
        return Err(anyhow!("{} has no current branch", git_dir.display()));
    }
    Ok(output.stdout.trim().to_string())
}

/// Run git inside the clone pipeline; a spawn error or nonzero exit becomes
/// `CloneFailure`. With `quiet` both streams are captured and stderr rides
/// along on the failure; otherwise stderr passes through to the user.
pub(crate) fn run(
    git_program: &str,
    args: &[&str],
    cwd: &Path,
    envs: &[(&str, &str)],
    quiet: bool,
) -> Result<RunOutput, CloneFailure> {
    let result = if quiet {
        process::run_capture(git_program, args, envs, Some(cwd))
    } else {
        process::run_inherit_stderr(git_program, args, envs, Some(cwd))
    };
    let output =
        result.map_err(|err| CloneFailure::new(format!("cannot run {git_program}: {err:#}")))?;
    if !output.success() {
        let subcommand = args.first().copied().unwrap_or(git_program);
        let message = format!("git {subcommand} exited with status {}", output.code);
        let stderr = output.stderr.trim();
        if stderr.is_empty() {
            return Err(CloneFailure::new(message));
        }
        return Err(CloneFailure::with_detail(message, stderr));
    }
    Ok(output)
}

pub(crate) fn set_config(
    git_program: &str,
    cwd: &Path,
    name: &str,
    value: &str,
) -> Result<(), CloneFailure> {
    run(git_program, &["config", name, value], cwd, &[], true).map(|_| ())
}
