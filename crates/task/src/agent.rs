//! Execution agents: the sandbox a transpiled test runs in

use async_trait::async_trait;
use conformer_config::CommandSpec;
use conformer_core::{Error, Result, TestAttributes};
use parking_lot::Mutex;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Environment variable carrying the test's absolute path to the agent
pub const TEST_PATH_ENV: &str = "CONFORMER_TEST_PATH";

/// What the agent is asked to evaluate
#[derive(Debug, Clone)]
pub struct EvalRequest {
    pub attrs: TestAttributes,
    /// Transpiled source
    pub contents: String,
    /// Absolute path of the original test file
    pub file: PathBuf,
}

/// What the agent reports back for a finished evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentReport {
    /// Script-level error, if the test threw
    pub error: Option<serde_json::Value>,
    pub stdout: Option<String>,
}

impl AgentReport {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            error: None,
            stdout: Some(stdout.into()),
        }
    }
}

/// A sandboxed evaluator shared by every invocation of a runner.
///
/// `evaluate` must stop promptly once `cancel` fires. `terminate` is called
/// by the runner when a deadline elapses and must not block.
#[async_trait]
pub trait ExecutionAgent: Send + Sync {
    async fn evaluate(&self, request: EvalRequest, cancel: CancellationToken) -> Result<AgentReport>;

    fn terminate(&self);
}

/// Runs each test as a host process.
///
/// The transpiled source is written to a temporary script whose path is
/// appended to the configured command. Stdout becomes the test output; a
/// non-zero exit or anything on stderr is the test's error. Stderr that
/// parses as JSON is reported as that value.
pub struct ProcessAgent {
    command: CommandSpec,
    generation: Mutex<CancellationToken>,
}

impl ProcessAgent {
    pub fn new(command: CommandSpec) -> Self {
        Self {
            command,
            generation: Mutex::new(CancellationToken::new()),
        }
    }

    fn write_script(&self, request: &EvalRequest) -> Result<tempfile::NamedTempFile> {
        let suffix = if request.attrs.is_module() { ".mjs" } else { ".js" };
        let mut script = tempfile::Builder::new()
            .prefix("conformer-")
            .suffix(suffix)
            .tempfile()
            .map_err(|e| Error::file_system(std::env::temp_dir(), "create agent script", e))?;

        script
            .write_all(request.contents.as_bytes())
            .and_then(|()| script.flush())
            .map_err(|e| Error::file_system(script.path(), "write agent script", e))?;
        Ok(script)
    }

    fn build_command(&self, script: &std::path::Path, request: &EvalRequest) -> Command {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args)
            .arg(script)
            .env(TEST_PATH_ENV, &request.file)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // own process group so a kill reaches whatever the test spawned
        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }
}

impl std::fmt::Debug for ProcessAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessAgent")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ExecutionAgent for ProcessAgent {
    async fn evaluate(&self, request: EvalRequest, cancel: CancellationToken) -> Result<AgentReport> {
        let generation = self.generation.lock().clone();
        let script = self.write_script(&request)?;

        let child = self
            .build_command(script.path(), &request)
            .spawn()
            .map_err(|e| {
                Error::agent(format!(
                    "failed to spawn agent '{}': {e}",
                    self.command.program
                ))
            })?;

        tracing::trace!(
            program = %self.command.program,
            pid = ?child.id(),
            file = %request.file.display(),
            "agent process started"
        );

        // dropping the wait future kills the child (kill_on_drop)
        let output = tokio::select! {
            output = child.wait_with_output() => output.map_err(|e| {
                Error::agent(format!("failed to collect agent output: {e}"))
            })?,
            () = cancel.cancelled() => {
                return Err(Error::agent("evaluation cancelled"));
            }
            () = generation.cancelled() => {
                return Err(Error::agent("agent terminated during evaluation"));
            }
        };
        drop(script);

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() && stderr.is_empty() {
            return Ok(AgentReport::success(stdout));
        }

        let error = if stderr.is_empty() {
            serde_json::Value::String(format!("agent exited with {}", output.status))
        } else {
            serde_json::from_str(&stderr).unwrap_or(serde_json::Value::String(stderr))
        };

        Ok(AgentReport {
            error: Some(error),
            stdout: Some(stdout),
        })
    }

    fn terminate(&self) {
        let previous = std::mem::replace(&mut *self.generation.lock(), CancellationToken::new());
        previous.cancel();
        tracing::debug!(program = %self.command.program, "agent terminated");
    }
}
