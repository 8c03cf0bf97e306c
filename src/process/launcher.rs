//! OS process launching for the dependency and the main process.
//!
//! The dependency is spawned and forgotten: its handle is dropped without
//! killing it and its exit status is never collected by the launcher. The main
//! process is "handed over" to, which on Unix means `exec` so that it replaces
//! the launcher and owns the container's exit status.

use crate::error::{AppError, Result};
use std::env;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;

/// A program invocation: executable, arguments and optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Builds a spec from whitespace-separated words, e.g. `"python3 bot.py"`.
    /// Returns `None` when there are no words.
    pub fn from_words<I, S>(words: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words = words.into_iter().map(Into::into);
        let program = words.next()?;
        Some(Self::new(program).args(words))
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Starts the two processes the orchestrator sequences.
pub trait ProcessLauncher {
    /// Starts `spec` in the background and returns its pid.
    fn spawn_background(&mut self, spec: &CommandSpec) -> std::io::Result<u32>;

    /// Runs `spec` as the main process and returns the exit code the launcher should
    /// terminate with. An exec-based implementation only returns on failure.
    fn hand_over(&mut self, spec: &CommandSpec) -> impl Future<Output = Result<u8>> + Send;
}

/// Launcher backed by `std::process`, with `tokio::process` for the waiting path.
pub struct SystemLauncher {
    exec: bool,
    log_guard: Option<WorkerGuard>,
}

impl SystemLauncher {
    /// `exec` selects between replacing the launcher (Unix only) and waiting on a child.
    pub fn new(exec: bool) -> Self {
        Self {
            exec,
            log_guard: None,
        }
    }

    /// Keeps the file-log writer alive until hand-over, where it is flushed.
    pub fn with_log_guard(mut self, guard: Option<WorkerGuard>) -> Self {
        self.log_guard = guard;
        self
    }

    fn launch_error(spec: &CommandSpec, source: std::io::Error) -> AppError {
        error!("Failed to launch {}: {}", spec.program, source);
        AppError::Launch {
            program: spec.program.clone(),
            source: Arc::new(source),
        }
    }

    async fn run_and_wait(&mut self, spec: &CommandSpec) -> Result<u8> {
        let mut child = tokio::process::Command::from(spec.to_command())
            .spawn()
            .map_err(|e| Self::launch_error(spec, e))?;
        info!(
            "Main process started (pid {:?}), waiting for it to exit",
            child.id()
        );

        let status = child.wait().await?;
        let code = exit_code_of(status);
        info!("Main process exited with code {}", code);
        Ok(code)
    }

    #[cfg(unix)]
    fn exec(&mut self, spec: &CommandSpec) -> Result<u8> {
        use std::os::unix::process::CommandExt;

        info!("Replacing launcher with: {}", spec);
        // Buffered file logs would be lost once the image is replaced.
        drop(self.log_guard.take());
        let err = spec.to_command().exec();
        Err(Self::launch_error(spec, err))
    }
}

impl ProcessLauncher for SystemLauncher {
    fn spawn_background(&mut self, spec: &CommandSpec) -> std::io::Result<u32> {
        let child = spec.to_command().stdin(Stdio::null()).spawn()?;
        let pid = child.id();
        debug!("Spawned background process {} ({})", pid, spec);
        // Dropping a std Child neither kills nor reaps it.
        drop(child);
        Ok(pid)
    }

    async fn hand_over(&mut self, spec: &CommandSpec) -> Result<u8> {
        #[cfg(unix)]
        if self.exec {
            return self.exec(spec);
        }

        #[cfg(not(unix))]
        if self.exec {
            debug!("exec is not available on this platform; waiting on the child instead");
        }

        self.run_and_wait(spec).await
    }
}

/// Converts an exit status into a shell-style exit code (128 + signal when killed).
pub fn exit_code_of(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return (code & 0xff) as u8;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return (128 + (signal & 0x7f)) as u8;
        }
    }

    1
}

/// Resolves `program` the way a shell would: as a path when it contains a
/// separator, otherwise by searching `PATH`.
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|full| full.is_file())
}
