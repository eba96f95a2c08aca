//! Hand off execution to the installed tool: minimal argv scanning, the
//! ordered relaunch argument vector, and the synchronous spawn that
//! propagates the tool's exit code.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use super::config::{Settings, LAUNCHER_VERSION};
use super::process;

/// Exit code when the installed entry point cannot be spawned, distinct
/// from any ordinary sub-tool failure.
pub const EXIT_CANNOT_SPAWN: i32 = 148;

/// Result of the minimal argv scan. The launcher recognizes only the first
/// non-flag token and a bare help flag; every token is forwarded verbatim
/// regardless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub help: bool,
}

#[must_use]
pub fn parse_invocation(args: &[String]) -> Invocation {
    let mut invocation = Invocation::default();
    for (index, arg) in args.iter().enumerate() {
        if arg == "-h" || arg == "--help" {
            invocation.help = true;
        } else if !arg.starts_with('-') {
            invocation.command = Some(arg.clone());
            invocation.args = args[index + 1..].to_vec();
            break;
        }
    }
    invocation
}

/// The final argument vector: interpreter, entry point, derived flags, the
/// literal `--` separator, the user's original argv, then any
/// bootstrap-appended extras. Derived flags must precede the separator so
/// the tool can tell them apart from user-supplied ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaunchPlan {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

#[must_use]
pub fn build_plan(
    interpreter: PathBuf,
    entry: &Path,
    rpo_dir: &Path,
    wrapper_path: &Path,
    orig_args: &[OsString],
    extra_args: &[OsString],
) -> RelaunchPlan {
    let mut args: Vec<OsString> = vec![entry.as_os_str().to_owned()];
    args.push(format!("--rpo-dir={}", rpo_dir.display()).into());
    args.push(format!("--wrapper-version={LAUNCHER_VERSION}").into());
    args.push(format!("--wrapper-path={}", wrapper_path.display()).into());
    args.push("--".into());
    args.extend(orig_args.iter().cloned());
    args.extend(extra_args.iter().cloned());
    RelaunchPlan {
        program: interpreter,
        args,
    }
}

/// Interpreter for the installed tool's entry point: `$RPO_PYTHON`, else
/// `python3`/`python` from `PATH`.
///
/// # Errors
///
/// Returns an error when no interpreter can be found.
pub fn resolve_interpreter(settings: &Settings) -> Result<PathBuf> {
    if let Some(program) = &settings.python_program {
        return Ok(PathBuf::from(program));
    }
    which::which("python3")
        .or_else(|_| which::which("python"))
        .context("python interpreter not found; install python3")
}

/// Spawn the plan synchronously and return the exit code to propagate. A
/// spawn failure prints a fatal diagnostic and maps to
/// [`EXIT_CANNOT_SPAWN`].
#[must_use]
pub fn exec(plan: &RelaunchPlan) -> i32 {
    debug!(program = %plan.program.display(), "relaunching installed tool");
    match Command::new(&plan.program).args(&plan.args).status() {
        Ok(status) => process::exit_code(status),
        Err(err) => {
            let entry = plan
                .args
                .first()
                .map(|arg| arg.to_string_lossy().into_owned())
                .unwrap_or_default();
            eprintln!("fatal: unable to start {entry}");
            eprintln!("fatal: {err}");
            EXIT_CANNOT_SPAWN
        }
    }
}
