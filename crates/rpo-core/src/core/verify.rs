//! Resolve a branch tip to the nearest signed tag and verify its signature
//! against the trust store. Commits past the last signed tag are never
//! trusted for checkout, even when they are the branch's actual tip.

use std::path::Path;

use super::outcome::CloneFailure;
use super::process;

/// Verify `origin/<branch>` and return the revision to check out: the
/// dereferenced commit of the nearest signed tag (`<tag>^0`), never the raw
/// tag object.
///
/// # Errors
///
/// Returns `CloneFailure` when no tag is reachable or the signature does
/// not validate; the signing tool's diagnostics ride along verbatim.
pub(crate) fn verify(
    git_program: &str,
    workspace: &Path,
    branch: &str,
    gnupg_home: &Path,
    quiet: bool,
) -> Result<String, CloneFailure> {
    let remote_ref = format!("origin/{branch}");
    let output = process::run_capture(git_program, &["describe", &remote_ref], &[], Some(workspace))
        .map_err(|err| CloneFailure::new(format!("cannot run {git_program}: {err:#}")))?;
    let described = output.stdout.trim().to_string();
    if !output.success() || described.is_empty() {
        return Err(CloneFailure::new(format!(
            "branch '{branch}' has not been signed"
        )));
    }

    let tag = match strip_describe_suffix(&described) {
        Some(tag) => {
            if !quiet {
                eprintln!("info: Ignoring branch '{branch}'; using tagged release '{tag}'");
            }
            tag.to_string()
        }
        None => described,
    };

    let gnupg_home = gnupg_home.display().to_string();
    let output = process::run_capture(
        git_program,
        &["tag", "-v", &tag],
        &[("GNUPGHOME", &gnupg_home)],
        Some(workspace),
    )
    .map_err(|err| CloneFailure::new(format!("cannot run {git_program}: {err:#}")))?;
    if !output.success() {
        let mut detail = String::new();
        if !output.stdout.trim().is_empty() {
            detail.push_str(output.stdout.trim());
        }
        if !output.stderr.trim().is_empty() {
            if !detail.is_empty() {
                detail.push('\n');
            }
            detail.push_str(output.stderr.trim());
        }
        return Err(CloneFailure::with_detail(
            format!("could not verify rpo tag {tag}"),
            detail,
        ));
    }
    Ok(format!("{tag}^0"))
}

/// Strip the `-<N>-g<hash>` suffix `git describe` appends when the branch
/// tip sits past the described tag. Exact-tag output passes through as
/// `None`.
fn strip_describe_suffix(described: &str) -> Option<&str> {
    let (rest, hash) = described.rsplit_once('-')?;
    let hash = hash.strip_prefix('g')?;
    if hash.is_empty() || !hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return None;
    }
    let (tag, count) = rest.rsplit_once('-')?;
    if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_tags_are_untouched() {
        assert_eq!(strip_describe_suffix("v1.21"), None);
        assert_eq!(strip_describe_suffix("v1.0-rc1"), None);
    }

    #[test]
    fn ahead_of_tag_descriptions_are_stripped() {
        assert_eq!(strip_describe_suffix("v1.21-3-gdeadbee"), Some("v1.21"));
        assert_eq!(strip_describe_suffix("v1.0-rc1-12-g0123abc"), Some("v1.0-rc1"));
    }

    #[test]
    fn non_describe_suffixes_are_left_alone() {
        assert_eq!(strip_describe_suffix("v1.0-3-gXYZ"), None);
        assert_eq!(strip_describe_suffix("v1.0-x-gabc"), None);
        assert_eq!(strip_describe_suffix("v1.0-3"), None);
    }

    #[cfg(unix)]
    mod pipeline {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::path::{Path, PathBuf};

        use super::super::*;

        /// A fake git whose `describe` and `tag -v` behavior is scripted.
        fn fake_git(dir: &Path, script: &str) -> PathBuf {
            let path = dir.join("git");
            fs::write(&path, format!("#!/bin/sh\n{script}")).expect("write fake git");
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
            path
        }

        #[test]
        fn signed_tag_resolves_to_dereferenced_commit() {
            let temp = tempfile::tempdir().expect("tempdir");
            let git = fake_git(
                temp.path(),
                "case \"$1\" in\n\
                 describe) echo v1.21-3-gdeadbee ;;\n\
                 tag) exit 0 ;;\n\
                 esac\n",
            );
            let rev = verify(
                git.to_str().expect("utf-8"),
                temp.path(),
                "stable",
                Path::new("/nonexistent/gnupg"),
                true,
            )
            .expect("verification");
            assert_eq!(rev, "v1.21^0");
        }

        #[test]
        fn unsigned_branch_fails() {
            let temp = tempfile::tempdir().expect("tempdir");
            let git = fake_git(temp.path(), "exit 128\n");
            let err = verify(
                git.to_str().expect("utf-8"),
                temp.path(),
                "stable",
                Path::new("/nonexistent/gnupg"),
                true,
            )
            .expect_err("no reachable tag");
            assert!(err.to_string().contains("has not been signed"));
        }

        #[test]
        fn bad_signature_carries_tool_diagnostics() {
            let temp = tempfile::tempdir().expect("tempdir");
            let git = fake_git(
                temp.path(),
                "case \"$1\" in\n\
                 describe) echo v1.21 ;;\n\
                 tag) echo 'gpg: BAD signature' >&2; exit 1 ;;\n\
                 esac\n",
            );
            let err = verify(
                git.to_str().expect("utf-8"),
                temp.path(),
                "stable",
                Path::new("/nonexistent/gnupg"),
                true,
            )
            .expect_err("bad signature");
            assert_eq!(err.detail(), Some("gpg: BAD signature"));
        }
    }
}
