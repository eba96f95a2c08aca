//! Materialize a verified revision: a local `default` branch pinned to the
//! revision, configured to track the remote branch, and a working tree
//! reset to match.

use std::path::Path;

use super::git;
use super::outcome::CloneFailure;

pub(crate) fn checkout(
    git_program: &str,
    workspace: &Path,
    branch: &str,
    revision: &str,
    quiet: bool,
) -> Result<(), CloneFailure> {
    git::run(
        git_program,
        &["update-ref", "refs/heads/default", revision],
        workspace,
        &[],
        true,
    )?;
    git::set_config(git_program, workspace, "branch.default.remote", "origin")?;
    let merge_ref = format!("refs/heads/{branch}");
    git::set_config(git_program, workspace, "branch.default.merge", &merge_ref)?;
    git::run(
        git_program,
        &["symbolic-ref", "HEAD", "refs/heads/default"],
        workspace,
        &[],
        true,
    )?;

    let mut args = vec!["read-tree", "--reset", "-u"];
    if !quiet {
        args.push("-v");
    }
    args.push("HEAD");
    git::run(git_program, &args, workspace, &[], quiet).map(|_| ())
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    use super::*;

    /// A fake git that appends every invocation to a log file.
    fn recording_git(dir: &Path) -> (PathBuf, PathBuf) {
        let log = dir.join("git.log");
        let path = dir.join("git");
        fs::write(
            &path,
            format!("#!/bin/sh\necho \"$@\" >> {}\n", log.display()),
        )
        .expect("write fake git");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        (path, log)
    }

    #[test]
    fn runs_the_checkout_sequence_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (git, log) = recording_git(temp.path());

        checkout(
            git.to_str().expect("utf-8"),
            temp.path(),
            "stable",
            "v1.21^0",
            true,
        )
        .expect("checkout");

        let log = fs::read_to_string(log).expect("read log");
        let calls: Vec<&str> = log.lines().collect();
        assert_eq!(
            calls,
            vec![
                "update-ref refs/heads/default v1.21^0",
                "config branch.default.remote origin",
                "config branch.default.merge refs/heads/stable",
                "symbolic-ref HEAD refs/heads/default",
                "read-tree --reset -u HEAD",
            ]
        );
    }

    #[test]
    fn verbose_read_tree_when_not_quiet() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (git, log) = recording_git(temp.path());

        checkout(
            git.to_str().expect("utf-8"),
            temp.path(),
            "stable",
            "v1.21^0",
            false,
        )
        .expect("checkout");

        let log = fs::read_to_string(log).expect("read log");
        assert!(log.lines().any(|line| line == "read-tree --reset -u -v HEAD"));
    }

    #[test]
    fn any_failing_step_is_a_clone_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("git");
        fs::write(
            &path,
            "#!/bin/sh\nif [ \"$1\" = symbolic-ref ]; then exit 1; fi\nexit 0\n",
        )
        .expect("write fake git");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");

        let result = checkout(
            path.to_str().expect("utf-8"),
            temp.path(),
            "stable",
            "v1.21^0",
            true,
        );
        assert!(result.is_err());
    }
}
