use std::{
    io::{self, Read, Write},
    path::Path,
    process::{Command, ExitStatus, Stdio},
    thread,
};

use anyhow::{Context, Result};

/// Captured result of an external command.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

fn configured_command(
    program: &str,
    args: &[&str],
    envs: &[(&str, &str)],
    cwd: Option<&Path>,
) -> Command {
    let mut command = Command::new(program);
    command.args(args);
    for (key, value) in envs {
        command.env(key, value);
    }
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    command
}

/// Execute a program and capture stdout/stderr.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned or its output
/// streams cannot be read entirely.
pub(crate) fn run_capture(
    program: &str,
    args: &[&str],
    envs: &[(&str, &str)],
    cwd: Option<&Path>,
) -> Result<RunOutput> {
    let mut command = configured_command(program, args, envs, cwd);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let child = command
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;
    collect(child, program)
}

/// Execute a program with stdout captured and stderr passing through to the
/// terminal (progress stays visible to the user).
///
/// # Errors
///
/// Returns an error when the program cannot be spawned or stdout cannot be
/// read entirely.
pub(crate) fn run_inherit_stderr(
    program: &str,
    args: &[&str],
    envs: &[(&str, &str)],
    cwd: Option<&Path>,
) -> Result<RunOutput> {
    let mut command = configured_command(program, args, envs, cwd);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::inherit());

    let mut child = command
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("stdout missing for {program}"))?;
    let stdout_handle = thread::spawn(move || read_lossy(stdout));

    let status = child
        .wait()
        .with_context(|| format!("failed to wait for {program}"))?;
    let stdout = stdout_handle
        .join()
        .map_err(|_| anyhow::anyhow!("stdout thread panicked"))??;
    Ok(RunOutput {
        code: exit_code(status),
        stdout,
        stderr: String::new(),
    })
}

/// Execute a program, feeding `input` over a scoped stdin pipe and
/// capturing both output streams.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned, stdin cannot be
/// written, or the output streams cannot be read entirely.
pub(crate) fn run_with_input(
    program: &str,
    args: &[&str],
    envs: &[(&str, &str)],
    cwd: Option<&Path>,
    input: &[u8],
) -> Result<RunOutput> {
    let mut command = configured_command(program, args, envs, cwd);
    command.stdin(Stdio::piped());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;
    {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("stdin missing for {program}"))?;
        stdin
            .write_all(input)
            .with_context(|| format!("failed to write to {program} stdin"))?;
        // Dropping the handle closes the pipe so the child sees EOF.
    }
    collect(child, program)
}

fn collect(mut child: std::process::Child, program: &str) -> Result<RunOutput> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("stdout missing for {program}"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow::anyhow!("stderr missing for {program}"))?;
    let stdout_handle = thread::spawn(move || read_lossy(stdout));
    let stderr_handle = thread::spawn(move || read_lossy(stderr));

    let status = child
        .wait()
        .with_context(|| format!("failed to wait for {program}"))?;
    let stdout = stdout_handle
        .join()
        .map_err(|_| anyhow::anyhow!("stdout thread panicked"))??;
    let stderr = stderr_handle
        .join()
        .map_err(|_| anyhow::anyhow!("stderr thread panicked"))??;
    Ok(RunOutput {
        code: exit_code(status),
        stdout,
        stderr,
    })
}

/// Shell-style exit code: the process's own code, or 128 plus the signal
/// number when it died to a signal.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(1)
}

fn read_lossy(mut reader: impl Read) -> io::Result<String> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
