//! Find an existing installation by walking up the directory tree, and
//! detect a live development checkout of the tool next to the launcher.

use std::path::{Path, PathBuf};

use super::config::{ENTRY_POINT, INSTALL_DIR, SOURCE_DIR};

/// Companion source artifacts that must exist before the launcher's own
/// directory is adopted as a relaunch target. A partially checked-out copy
/// is treated as not self-hosting even when `.git` is present.
const SELF_COMPANIONS: [&str; 3] = ["git_config.py", "project.py", "subcmds"];

/// A usable development checkout of the tool, co-located with the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfCheckout {
    pub main: PathBuf,
    pub git_dir: PathBuf,
}

/// Walk from `start` upward looking for an installed entry point
/// (`.rpo/rpo/main.py`). Returns the entry point (or `None`) together with
/// the install root that was (or would have been) used. The walk stops at
/// the filesystem root or at a non-progressing parent.
#[must_use]
pub fn find_installation(start: &Path) -> (Option<PathBuf>, PathBuf) {
    let mut dir = start.to_path_buf();
    loop {
        let entry = dir.join(INSTALL_DIR).join(SOURCE_DIR).join(ENTRY_POINT);
        if entry.is_file() {
            return (Some(entry), dir.join(INSTALL_DIR));
        }
        match dir.parent() {
            Some(parent) if parent != dir => dir = parent.to_path_buf(),
            _ => return (None, dir.join(INSTALL_DIR)),
        }
    }
}

/// Check whether the launcher's own directory is a complete, trackable
/// checkout of the tool.
#[must_use]
pub fn find_self_checkout(launcher_dir: &Path) -> Option<SelfCheckout> {
    let main = launcher_dir.join(ENTRY_POINT);
    let git_dir = launcher_dir.join(".git");
    if !main.is_file() || !git_dir.is_dir() {
        return None;
    }
    for name in SELF_COMPANIONS {
        if !launcher_dir.join(name).exists() {
            return None;
        }
    }
    Some(SelfCheckout { main, git_dir })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn install_under(dir: &Path) -> PathBuf {
        let workspace = dir.join(INSTALL_DIR).join(SOURCE_DIR);
        fs::create_dir_all(&workspace).expect("mkdir workspace");
        let entry = workspace.join(ENTRY_POINT);
        fs::write(&entry, "# entry\n").expect("write entry");
        entry
    }

    #[test]
    fn finds_installation_in_start_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let entry = install_under(temp.path());
        let (found, root) = find_installation(temp.path());
        assert_eq!(found, Some(entry));
        assert_eq!(root, temp.path().join(INSTALL_DIR));
    }

    #[test]
    fn finds_installation_in_an_ancestor() {
        let temp = tempfile::tempdir().expect("tempdir");
        let entry = install_under(temp.path());
        let nested = temp.path().join("a").join("b").join("c");
        fs::create_dir_all(&nested).expect("mkdir nested");
        let (found, root) = find_installation(&nested);
        assert_eq!(found, Some(entry));
        assert_eq!(root, temp.path().join(INSTALL_DIR));
    }

    #[test]
    fn reports_topmost_root_when_absent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (found, root) = find_installation(temp.path());
        assert_eq!(found, None);
        // The walk terminated at the filesystem root.
        assert_eq!(root.file_name().and_then(|n| n.to_str()), Some(INSTALL_DIR));
        assert!(!root.starts_with(temp.path()));
    }

    #[test]
    fn self_checkout_requires_all_companions() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path();
        fs::write(dir.join(ENTRY_POINT), "# entry\n").expect("write main");
        fs::create_dir(dir.join(".git")).expect("mkdir .git");
        fs::write(dir.join("git_config.py"), "").expect("write companion");
        fs::write(dir.join("project.py"), "").expect("write companion");
        assert_eq!(find_self_checkout(dir), None, "subcmds missing");

        fs::create_dir(dir.join("subcmds")).expect("mkdir subcmds");
        let checkout = find_self_checkout(dir).expect("complete checkout");
        assert_eq!(checkout.main, dir.join(ENTRY_POINT));
        assert_eq!(checkout.git_dir, dir.join(".git"));
    }

    #[test]
    fn self_checkout_requires_version_control_metadata() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path();
        fs::write(dir.join(ENTRY_POINT), "# entry\n").expect("write main");
        for name in SELF_COMPANIONS {
            if name.ends_with(".py") {
                fs::write(dir.join(name), "").expect("write companion");
            } else {
                fs::create_dir(dir.join(name)).expect("mkdir companion");
            }
        }
        assert_eq!(find_self_checkout(dir), None);
    }
}
