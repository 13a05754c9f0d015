use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Trait for executing system commands, allowing for mocking in tests
pub trait CommandExecutor: Send + Sync {
    /// Execute a command with arguments and return its captured output
    fn execute(&self, command: &str, args: &[&str], working_dir: &Path) -> Result<Output>;

    /// Execute a command, feeding `input` on stdin, and return its captured output
    fn execute_with_input(
        &self,
        command: &str,
        args: &[&str],
        input: &str,
        working_dir: &Path,
    ) -> Result<Output>;
}

/// Real command executor using std::process::Command
pub struct RealCommandExecutor;

impl RealCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor for RealCommandExecutor {
    fn execute(&self, command: &str, args: &[&str], working_dir: &Path) -> Result<Output> {
        tracing::debug!(command, ?args, dir = %working_dir.display(), "spawning");

        let output = Command::new(command)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute '{}'", command))?;

        Ok(output)
    }

    fn execute_with_input(
        &self,
        command: &str,
        args: &[&str],
        input: &str,
        working_dir: &Path,
    ) -> Result<Output> {
        tracing::debug!(command, ?args, dir = %working_dir.display(), "spawning with stdin");

        let mut child = Command::new(command)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to execute '{}'", command))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .with_context(|| format!("Failed to write stdin of '{}'", command))?;
            // stdin is dropped here so the child sees EOF
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for '{}'", command))?;

        Ok(output)
    }
}

/// Mock command executor for testing
///
/// Outputs are keyed by the full command line (`"terraform workspace show"`),
/// consumed in registration order. Unmatched commands succeed with empty output.
#[cfg(test)]
pub struct MockCommandExecutor {
    outputs: std::sync::Mutex<Vec<MockCommandResult>>,
    invocations: std::sync::Mutex<Vec<MockInvocation>>,
}

#[cfg(test)]
#[derive(Clone, Debug)]
pub struct MockCommandResult {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[cfg(test)]
impl MockCommandResult {
    pub fn ok(command: &str, stdout: &str) -> Self {
        Self {
            command: command.to_string(),
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failed(command: &str, exit_code: i32, stderr: &str) -> Self {
        Self {
            command: command.to_string(),
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// A command line the mock was asked to run, with the stdin it was given
#[cfg(test)]
#[derive(Clone, Debug, PartialEq)]
pub struct MockInvocation {
    pub command_line: String,
    pub input: Option<String>,
}

#[cfg(test)]
impl MockCommandExecutor {
    pub fn new() -> Self {
        Self::with_outputs(Vec::new())
    }

    pub fn with_outputs(outputs: Vec<MockCommandResult>) -> Self {
        Self {
            outputs: std::sync::Mutex::new(outputs),
            invocations: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> Vec<MockInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Command lines invoked so far, in order
    pub fn command_lines(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .map(|i| i.command_line)
            .collect()
    }

    fn respond(&self, command: &str, args: &[&str], input: Option<&str>) -> Output {
        let command_line = std::iter::once(command)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");

        self.invocations.lock().unwrap().push(MockInvocation {
            command_line: command_line.clone(),
            input: input.map(str::to_string),
        });

        let mut outputs = self.outputs.lock().unwrap();
        if let Some(index) = outputs.iter().position(|r| r.command == command_line) {
            let mock_result = outputs.remove(index);
            return Output {
                status: create_exit_status(mock_result.exit_code),
                stdout: mock_result.stdout.into_bytes(),
                stderr: mock_result.stderr.into_bytes(),
            };
        }

        // Default: successful empty output
        Output {
            status: create_exit_status(0),
            stdout: Vec::new(),
            stderr: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Default for MockCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl CommandExecutor for MockCommandExecutor {
    fn execute(&self, command: &str, args: &[&str], _working_dir: &Path) -> Result<Output> {
        Ok(self.respond(command, args, None))
    }

    fn execute_with_input(
        &self,
        command: &str,
        args: &[&str],
        input: &str,
        _working_dir: &Path,
    ) -> Result<Output> {
        Ok(self.respond(command, args, Some(input)))
    }
}

#[cfg(test)]
fn create_exit_status(code: i32) -> std::process::ExitStatus {
    // ExitStatus can't be constructed directly
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        // Raw wait status: exit code lives in the second byte
        std::process::ExitStatus::from_raw(code << 8)
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(code as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_mock_executor_returns_configured_output() {
        let executor = MockCommandExecutor::with_outputs(vec![MockCommandResult::ok(
            "terraform workspace show",
            "prod\n",
        )]);

        let output = executor
            .execute("terraform", &["workspace", "show"], &PathBuf::from("."))
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "prod\n");
    }

    #[test]
    fn test_mock_executor_default_success() {
        let executor = MockCommandExecutor::new();
        let output = executor
            .execute("unknown", &[], &PathBuf::from("."))
            .unwrap();
        assert!(output.status.success());
    }

    #[test]
    fn test_mock_executor_failure_exit_code() {
        let executor = MockCommandExecutor::with_outputs(vec![MockCommandResult::failed(
            "terraform import a b",
            1,
            "boom",
        )]);

        let output = executor
            .execute("terraform", &["import", "a", "b"], &PathBuf::from("."))
            .unwrap();
        assert!(!output.status.success());
        assert_eq!(output.status.code(), Some(1));
        assert_eq!(String::from_utf8_lossy(&output.stderr), "boom");
    }

    #[test]
    fn test_mock_executor_records_input() {
        let executor = MockCommandExecutor::new();
        executor
            .execute_with_input("terraform", &["console"], "var.x\n", &PathBuf::from("."))
            .unwrap();

        assert_eq!(
            executor.invocations(),
            vec![MockInvocation {
                command_line: "terraform console".to_string(),
                input: Some("var.x\n".to_string()),
            }]
        );
    }
}
