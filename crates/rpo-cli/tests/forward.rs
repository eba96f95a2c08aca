mod common;

use common::{install_tree, rpo, sandbox, stdout_of};

#[cfg(unix)]
#[test]
fn forwarded_invocation_orders_derived_flags_before_user_args() {
    let (temp, tree) = sandbox();
    let entry = install_tree(&tree);
    let interpreter =
        common::executable_script(&temp.path().join("interp.sh"), "printf '%s\\n' \"$@\"\n");

    let assert = rpo(&tree, temp.path())
        .env("RPO_PYTHON", &interpreter)
        .args(["init", "-q"])
        .assert()
        .success();

    let stdout = stdout_of(&assert);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 7, "unexpected argv: {lines:?}");
    assert_eq!(lines[0], entry.to_str().expect("utf-8 entry"));
    assert_eq!(
        lines[1],
        format!("--rpo-dir={}", tree.join(".rpo").display())
    );
    assert!(lines[2].starts_with("--wrapper-version="));
    assert!(lines[3].starts_with("--wrapper-path="));
    assert_eq!(lines[4], "--");
    assert_eq!(lines[5], "init");
    assert_eq!(lines[6], "-q");
}

#[cfg(unix)]
#[test]
fn opaque_flags_before_the_command_are_forwarded() {
    let (temp, tree) = sandbox();
    install_tree(&tree);
    let interpreter =
        common::executable_script(&temp.path().join("interp.sh"), "printf '%s\\n' \"$@\"\n");

    let assert = rpo(&tree, temp.path())
        .env("RPO_PYTHON", &interpreter)
        .args(["--trace", "sync", "-j8"])
        .assert()
        .success();

    let stdout = stdout_of(&assert);
    let lines: Vec<&str> = stdout.lines().collect();
    let separator = lines.iter().position(|line| *line == "--").expect("separator");
    assert_eq!(&lines[separator + 1..], ["--trace", "sync", "-j8"]);
}

#[cfg(unix)]
#[test]
fn child_exit_code_is_propagated() {
    let (temp, tree) = sandbox();
    install_tree(&tree);
    let interpreter = common::executable_script(&temp.path().join("interp.sh"), "exit 7\n");

    rpo(&tree, temp.path())
        .env("RPO_PYTHON", &interpreter)
        .arg("sync")
        .assert()
        .code(7);
}

#[test]
fn spawn_failure_maps_to_the_fixed_code() {
    let (temp, tree) = sandbox();
    install_tree(&tree);

    rpo(&tree, temp.path())
        .env("RPO_PYTHON", "/nonexistent/rpo-interpreter")
        .arg("sync")
        .assert()
        .code(148);
}
