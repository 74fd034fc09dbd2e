//! External process execution
//!
//! Every VCS call goes through here: a single attempt, synchronous, with stdout,
//! stderr and exit code captured. Callers run it on background threads.
//!
//! A process that could not be started at all is reported with
//! `launched == false`. That is distinct from a non-zero exit: the former means
//! the client is unavailable, the latter means a command failed inside a
//! present client.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::Instant;

/// Monotonic epoch for trace timestamps.
static TRACE_EPOCH: OnceLock<Instant> = OnceLock::new();

fn trace_epoch() -> &'static Instant {
    TRACE_EPOCH.get_or_init(Instant::now)
}

/// Extract numeric thread ID from ThreadId's debug format ("ThreadId(N)").
fn thread_id_number() -> u64 {
    let debug_str = format!("{:?}", std::thread::current().id());
    debug_str
        .strip_prefix("ThreadId(")
        .and_then(|s| s.strip_suffix(")"))
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

/// Captured result of one external command.
///
/// Output is decoded lossily: the parsers only pattern-match on it, so garbled
/// or non-UTF-8 bytes are kept as opaque replacement characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub launched: bool,
}

impl ProcessOutput {
    /// The executable could not be found or started.
    pub fn not_launched(reason: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: reason.into(),
            exit_code: -1,
            launched: false,
        }
    }

    /// Launched and exited with code 0.
    pub fn success(&self) -> bool {
        self.launched && self.exit_code == 0
    }

    /// Stderr and stdout joined and trimmed, for keyword matching on failures.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stderr, self.stdout).trim().to_string()
    }
}

/// Seam between the probes/executor and the operating system.
///
/// `SystemRunner` spawns real processes; tests substitute a scripted double.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String], working_dir: &Path) -> ProcessOutput;
}

/// Runs commands with [`Cmd`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], working_dir: &Path) -> ProcessOutput {
        Cmd::new(program)
            .args(args.iter().cloned())
            .current_dir(working_dir)
            .context(working_dir.display().to_string())
            .run()
    }
}

/// Builder for executing commands with logging and tracing.
///
/// ```ignore
/// let output = Cmd::new("git")
///     .args(["status", "--porcelain=v2", "-b"])
///     .current_dir(&repo_root)
///     .context("project")
///     .run();
/// ```
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    context: Option<String>,
}

impl Cmd {
    /// Create a new command builder for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            context: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory for the command.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Set the logging context (typically the working directory).
    pub fn context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }

    /// Execute the command once and capture its output.
    ///
    /// No timeout is applied: a hung client blocks the calling worker.
    pub fn run(self) -> ProcessOutput {
        let cmd_str = if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        };

        match &self.context {
            Some(ctx) => log::debug!("$ {} [{}]", cmd_str, ctx),
            None => log::debug!("$ {}", cmd_str),
        }

        let executable = match which::which(&self.program) {
            Ok(path) => path,
            Err(e) => {
                log::debug!("{} not launchable: {}", self.program, e);
                return ProcessOutput::not_launched(format!("{}: {}", self.program, e));
            }
        };

        let t0 = Instant::now();
        let ts = t0.duration_since(*trace_epoch()).as_micros() as u64;
        let tid = thread_id_number();

        let mut cmd = Command::new(&executable);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }

        let result = cmd.output();
        let dur_us = t0.elapsed().as_micros() as u64;
        let ctx = self.context.as_deref().unwrap_or("-");

        match result {
            Ok(output) => {
                log::debug!(
                    "[safesave-trace] ts={} tid={} context={} cmd=\"{}\" dur_us={} ok={}",
                    ts,
                    tid,
                    ctx,
                    cmd_str,
                    dur_us,
                    output.status.success()
                );
                ProcessOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    // Killed by a signal: no code, report a generic failure
                    exit_code: output.status.code().unwrap_or(-1),
                    launched: true,
                }
            }
            Err(e) => {
                log::debug!(
                    "[safesave-trace] ts={} tid={} context={} cmd=\"{}\" dur_us={} err=\"{}\"",
                    ts,
                    tid,
                    ctx,
                    cmd_str,
                    dur_us,
                    e
                );
                ProcessOutput::not_launched(format!("{}: {}", self.program, e))
            }
        }
    }
}
