//! Create and populate the local clone workspace: an empty object store,
//! optionally seeded from a snapshot bundle, always reconciled against the
//! authoritative remote.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use super::git;
use super::net::HttpContext;
use super::outcome::CloneFailure;
use super::process;

const FETCH_HEADS: &str = "+refs/heads/*:refs/remotes/origin/*";
const FETCH_TAGS: &str = "+refs/tags/*:refs/tags/*";
const BUNDLE_NAME: &str = "clone.bundle";

/// Where the tool's own source comes from.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    pub url: String,
    pub branch: String,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CloneOptions {
    pub quiet: bool,
    pub clone_bundle: bool,
}

/// Normalize the requested revision into a bare branch name. A
/// `refs/heads/` prefix is stripped; any other fully-qualified ref is
/// rejected here, before any network or filesystem side effect.
///
/// # Errors
///
/// Returns `CloneFailure` for a non-branch ref.
pub fn validate_branch(revision: &str) -> Result<String, CloneFailure> {
    let branch = revision.strip_prefix("refs/heads/").unwrap_or(revision);
    if branch.starts_with("refs/") {
        return Err(CloneFailure::new(format!(
            "invalid branch name '{revision}'"
        )));
    }
    Ok(branch.to_string())
}

/// Clone `source` into `workspace`. The snapshot bundle, when allowed and
/// available, only accelerates the fetch that always follows; it is never a
/// substitute for reconciling against the authoritative remote.
pub(crate) fn clone(
    git_program: &str,
    source: &RemoteSource,
    workspace: &Path,
    http: &HttpContext,
    options: CloneOptions,
) -> Result<(), CloneFailure> {
    match fs::create_dir(workspace) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
        Err(err) => {
            return Err(CloneFailure::new(format!(
                "cannot make {} directory: {err}",
                workspace.display()
            )));
        }
    }

    git::run(git_program, &["init", "--quiet"], workspace, &[], true)?;
    git::set_config(git_program, workspace, "remote.origin.url", &source.url)?;
    git::set_config(git_program, workspace, "remote.origin.fetch", FETCH_HEADS)?;

    if options.clone_bundle
        && download_bundle(git_program, &source.url, workspace, http, options.quiet)?
    {
        import_bundle(git_program, workspace)?;
    }
    fetch(git_program, &source.url, workspace, options.quiet)
}

fn fetch(git_program: &str, url: &str, workspace: &Path, quiet: bool) -> Result<(), CloneFailure> {
    if !quiet {
        eprintln!("Get {url}");
    }
    let mut args = vec!["fetch"];
    if quiet {
        args.push("--quiet");
    }
    args.extend(["origin", FETCH_HEADS, FETCH_TAGS]);
    git::run(git_program, &args, workspace, &[], quiet).map(|_| ())
}

/// Import the downloaded bundle's objects. The bundle file is removed even
/// when the import fails.
fn import_bundle(git_program: &str, workspace: &Path) -> Result<(), CloneFailure> {
    let bundle = workspace.join(".git").join(BUNDLE_NAME);
    let bundle_arg = bundle.display().to_string();
    let result = git::run(
        git_program,
        &["fetch", "--quiet", &bundle_arg, FETCH_HEADS],
        workspace,
        &[],
        true,
    );
    let _ = fs::remove_file(bundle);
    result.map(|_| ())
}

/// Fetch `<url>/clone.bundle` into the workspace's object store directory.
/// `Ok(false)` means the bundle is unavailable (or the URL scheme is not
/// eligible) and the clone proceeds over the ordinary transport.
fn download_bundle(
    git_program: &str,
    base_url: &str,
    workspace: &Path,
    http: &HttpContext,
    quiet: bool,
) -> Result<bool, CloneFailure> {
    let url = format!("{}/{BUNDLE_NAME}", base_url.trim_end_matches('/'));
    let url = apply_insteadof_rules(git_program, workspace, &url);
    if !url.starts_with("http:") && !url.starts_with("https:") {
        return Ok(false);
    }

    let response = http
        .get(&url)
        .map_err(|err| CloneFailure::new(format!("cannot get {url}: {err:#}")))?;
    let status = response.status();
    if matches!(status.as_u16(), 401 | 403 | 404 | 406 | 501) {
        debug!(%url, %status, "clone bundle unavailable");
        return Ok(false);
    }
    if !status.is_success() {
        return Err(CloneFailure::new(format!(
            "cannot get {url}: HTTP error {}",
            status.as_u16()
        )));
    }

    if !quiet {
        eprintln!("Get {url}");
    }
    let bundle = workspace.join(".git").join(BUNDLE_NAME);
    if let Err(err) = write_bundle(response, &bundle) {
        let _ = fs::remove_file(bundle);
        return Err(CloneFailure::new(format!("cannot get {url}: {err}")));
    }
    Ok(true)
}

fn write_bundle(mut response: reqwest::blocking::Response, dest: &Path) -> io::Result<()> {
    let mut file = fs::File::create(dest)?;
    // io::copy stops on the reader's own end-of-stream signal.
    io::copy(&mut response, &mut file)?;
    Ok(())
}

/// Rewrite a URL through the user's `url.<new>.insteadOf <old>` git
/// configuration. Lookup failures are ignored and the original URL is used.
fn apply_insteadof_rules(git_program: &str, workspace: &Path, url: &str) -> String {
    let output = process::run_capture(
        git_program,
        &["config", "--get-regexp", r"url\..*\.insteadof"],
        &[],
        Some(workspace),
    );
    let Ok(output) = output else {
        return url.to_string();
    };
    if !output.success() {
        // Exits nonzero when no rules are configured.
        return url.to_string();
    }
    for line in output.stdout.lines() {
        if let Some((new_base, old_base)) = parse_insteadof_line(line) {
            if let Some(rest) = url.strip_prefix(old_base) {
                return format!("{new_base}{rest}");
            }
        }
    }
    url.to_string()
}

/// Parse one `git config --get-regexp` line of the form
/// `url.<new>.insteadof <old>`.
fn parse_insteadof_line(line: &str) -> Option<(&str, &str)> {
    let (key, old_base) = line.split_once(' ')?;
    let new_base = key.strip_prefix("url.")?.strip_suffix(".insteadof")?;
    if new_base.is_empty() || old_base.is_empty() {
        return None;
    }
    Some((new_base, old_base))
}
