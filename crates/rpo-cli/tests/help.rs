mod common;

use common::{rpo, sandbox, stderr_of, stdout_of};

#[test]
fn bare_invocation_without_install_exits_nonzero() {
    let (temp, tree) = sandbox();
    let assert = rpo(&tree, temp.path()).assert().code(1);
    assert!(stderr_of(&assert).contains("rpo is not installed"));
}

#[test]
fn help_flag_without_install_prints_usage() {
    let (temp, tree) = sandbox();
    let assert = rpo(&tree, temp.path()).arg("-h").assert().code(1);
    let stderr = stderr_of(&assert);
    assert!(stderr.contains("usage: rpo COMMAND"));
    assert!(stderr.contains("rpo init"));
}

#[test]
fn bare_help_without_install_prints_usage() {
    let (temp, tree) = sandbox();
    let assert = rpo(&tree, temp.path()).arg("help").assert().code(1);
    assert!(stderr_of(&assert).contains("usage: rpo COMMAND"));
}

#[test]
fn help_init_prints_the_option_set() {
    let (temp, tree) = sandbox();
    let assert = rpo(&tree, temp.path()).args(["help", "init"]).assert().success();
    let stdout = stdout_of(&assert);
    assert!(stdout.contains("--manifest-url"));
    assert!(stdout.contains("--no-repo-verify"));
    assert!(stdout.contains("--no-clone-bundle"));
}

#[test]
fn help_for_a_tool_command_is_an_error() {
    let (temp, tree) = sandbox();
    let assert = rpo(&tree, temp.path()).args(["help", "sync"]).assert().code(1);
    assert!(stderr_of(&assert).contains("not a bootstrap command"));
}

#[test]
fn unknown_command_without_install_is_an_error() {
    let (temp, tree) = sandbox();
    let assert = rpo(&tree, temp.path()).arg("sync").assert().code(1);
    assert!(stderr_of(&assert).contains("requires rpo to be installed first"));
}
