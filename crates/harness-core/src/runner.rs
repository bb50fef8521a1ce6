//! External synchronization tool invocation.
//!
//! The tool under test is an opaque executable. The runner launches it with
//! the fixture's working directory, a minimal explicit environment, and a
//! bounded timeout; it captures exit status and streamed output verbatim
//! and never interprets them. A non-zero exit is data for the validator,
//! not a runner failure.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fixture::RepositoryFixture;

/// Poll interval while waiting for the child to exit.
const WAIT_POLL: Duration = Duration::from_millis(25);

/// Grace period between TERM and KILL on timeout.
const KILL_GRACE: Duration = Duration::from_millis(200);

fn default_timeout_secs() -> u64 {
    120
}

/// Description of one external operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Operation {
    /// Operation name, used in reports and error messages
    pub name: String,
    /// Path to the executable under test
    pub program: PathBuf,
    /// Arguments passed verbatim
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables the scenario declares it needs. Nothing else
    /// beyond PATH and HOME is inherited from the ambient environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Time bound in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Operation {
    /// Create an operation with default timeout and no arguments.
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Declare an environment variable the operation needs.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Override the time bound.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }
}

/// Captured outcome of one external operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    /// Exit code, preserved verbatim (-1 when killed by a signal)
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Wall-clock duration of the invocation
    pub duration: Duration,
}

impl OperationResult {
    /// Whether the tool reported success.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `operation` with the fixture's path as working directory.
///
/// Blocks until the process exits or the timeout fires. On timeout the
/// process group is terminated (TERM, then KILL) so no children are left
/// behind, and [`Error::Timeout`] is returned.
pub fn run(fixture: &RepositoryFixture, operation: &Operation) -> Result<OperationResult> {
    let mut cmd = Command::new(&operation.program);
    cmd.args(&operation.args)
        .current_dir(&fixture.path)
        .env_clear()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Minimal controlled environment: the tool gets PATH and HOME so git
    // and shell lookups work, plus whatever the scenario declared.
    for key in ["PATH", "HOME"] {
        if let Ok(value) = std::env::var(key) {
            cmd.env(key, value);
        }
    }
    cmd.envs(&operation.env);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    tracing::info!(
        operation = %operation.name,
        program = %operation.program.display(),
        args = ?operation.args,
        cwd = %fixture.path.display(),
        "running external operation"
    );

    let start = Instant::now();
    let mut child = cmd.spawn()?;
    let pid = child.id();

    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    let deadline = start + Duration::from_secs(operation.timeout_secs);
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            tracing::warn!(operation = %operation.name, pid, "operation timed out, terminating");
            kill_tree(pid);
            let _ = child.wait();
            return Err(Error::Timeout {
                name: operation.name.clone(),
                seconds: operation.timeout_secs,
            });
        }
        thread::sleep(WAIT_POLL);
    };

    let result = OperationResult {
        exit_code: status.code().unwrap_or(-1),
        stdout: join_reader(stdout),
        stderr: join_reader(stderr),
        duration: start.elapsed(),
    };
    tracing::debug!(
        operation = %operation.name,
        exit_code = result.exit_code,
        duration_ms = result.duration.as_millis() as u64,
        "operation finished"
    );
    Ok(result)
}

fn spawn_reader<R: Read + Send + 'static>(
    source: Option<R>,
) -> Option<thread::JoinHandle<String>> {
    source.map(|mut r| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = r.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).to_string()
        })
    })
}

fn join_reader(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Terminate a process and its children by process group.
fn kill_tree(pid: u32) {
    #[cfg(unix)]
    {
        // The child was started in its own process group, so a negative
        // PID reaches it and any children it spawned.
        let group = format!("-{pid}");
        let _ = Command::new("kill").args(["-TERM", &group]).output();
        thread::sleep(KILL_GRACE);
        let _ = Command::new("kill").args(["-KILL", &group]).output();
    }
    #[cfg(windows)]
    {
        let _ = Command::new("taskkill")
            .args(["/T", "/F", "/PID", &pid.to_string()])
            .output();
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = pid;
    }
}
