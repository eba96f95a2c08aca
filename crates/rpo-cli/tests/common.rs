#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// A scratch area: the temp dir doubles as an isolated `$HOME`, with the
/// working tree one level below it.
pub fn sandbox() -> (TempDir, PathBuf) {
    let temp = tempfile::tempdir().expect("tempdir");
    let tree = temp.path().join("tree");
    fs::create_dir(&tree).expect("mkdir tree");
    (temp, tree)
}

/// The launcher binary with an isolated environment.
pub fn rpo(tree: &Path, home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("rpo");
    cmd.current_dir(tree)
        .env("HOME", home)
        .env_remove("RPO_URL")
        .env_remove("RPO_REV")
        .env_remove("RPO_GIT")
        .env_remove("RPO_GPG")
        .env_remove("RPO_PYTHON")
        .env_remove("RPO_GITC_CONFIG")
        .env_remove("RPO_LOG");
    cmd
}

/// Lay out an installed tree: `<dir>/.rpo/rpo/main.py`.
pub fn install_tree(dir: &Path) -> PathBuf {
    let workspace = dir.join(".rpo").join("rpo");
    fs::create_dir_all(&workspace).expect("mkdir workspace");
    let entry = workspace.join("main.py");
    fs::write(&entry, "# rpo entry point\n").expect("write entry");
    entry
}

#[cfg(unix)]
pub fn executable_script(path: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, format!("#!/bin/sh\n{body}")).expect("write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod script");
    path.to_path_buf()
}

pub fn stderr_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}

pub fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}
