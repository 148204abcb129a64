//! Process execution for `run` steps.

use crate::error::{DeployerError, Result};
use anyhow::Context;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// What to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// A command line handed to the platform shell.
    Shell(String),
    /// A program with explicit arguments, no shell involved.
    Program { program: String, args: Vec<String> },
}

impl CommandSpec {
    /// Human-readable command line.
    pub fn display(&self) -> String {
        match self {
            CommandSpec::Shell(line) => line.clone(),
            CommandSpec::Program { program, args } if args.is_empty() => program.clone(),
            CommandSpec::Program { program, args } => format!("{} {}", program, args.join(" ")),
        }
    }

    fn to_command(&self) -> Command {
        match self {
            CommandSpec::Shell(line) => {
                let (shell, flag) = shell_invocation();
                let mut cmd = Command::new(shell);
                cmd.arg(flag).arg(line);
                cmd
            }
            CommandSpec::Program { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
        }
    }
}

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal or timeout).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Whether command succeeded (exit code 0).
    pub success: bool,

    /// Whether the command was killed for exceeding its timeout.
    pub timed_out: bool,
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: BTreeMap<String, String>,

    /// Kill the process after this long (None = no timeout).
    pub timeout: Option<Duration>,
}

/// Execute a command, capturing stdout and stderr.
///
/// # Errors
///
/// Returns `CommandFailed` if the process cannot be spawned or waited on.
/// A non-zero exit or a timeout is reported through [`CommandResult`].
pub fn execute(spec: &CommandSpec, options: &CommandOptions) -> Result<CommandResult> {
    let failed = || DeployerError::CommandFailed {
        command: spec.display(),
        code: None,
    };

    let mut cmd = spec.to_command();
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Own process group; a timeout kills the whole group.
        cmd.process_group(0);
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("cannot start '{}'", spec.display()))?;

    let stdout_handle = child.stdout.take().map(|mut out| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = out.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).to_string()
        })
    });
    let stderr_handle = child.stderr.take().map(|mut err| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = err.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).to_string()
        })
    });

    let (status, timed_out) = wait_with_timeout(&mut child, options.timeout).map_err(|_| failed())?;

    let stdout = stdout_handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    let stderr = stderr_handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default();

    let success = !timed_out && status.success();
    Ok(CommandResult {
        exit_code: if timed_out { None } else { status.code() },
        stdout,
        stderr,
        success,
        timed_out,
    })
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<(ExitStatus, bool)> {
    let Some(limit) = timeout else {
        return child.wait().map(|status| (status, false));
    };

    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        if Instant::now() >= deadline {
            kill_process_group(child);
            return child.wait().map(|status| (status, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the child and, on unix, every process in its group.
///
/// The process may already have exited, so failures are ignored.
fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: kill(2) with a negative pid only signals that process group.
            unsafe {
                libc::kill(-pid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
}

/// Shell program and the flag that passes it a command line.
fn shell_invocation() -> (String, &'static str) {
    if cfg!(target_os = "windows") {
        (
            std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string()),
            "/C",
        )
    } else {
        ("/bin/sh".to_string(), "-c")
    }
}
