use crate::config::ImporterConfig;
use crate::error::{ImportError, ImportResult};
use crate::import::{ImportOperation, ImportSink};
use crate::traits::CommandExecutor;
use std::path::PathBuf;
use std::process::Output;
use std::sync::Arc;

/// Terraform/OpenTofu CLI wrapper.
///
/// Every invocation runs `binary` inside `working_dir`; both come from the
/// resolved [`ImporterConfig`] so nothing depends on the process' ambient cwd.
pub struct TerraformCli {
    command: Arc<dyn CommandExecutor>,
    binary: String,
    working_dir: PathBuf,
}

impl TerraformCli {
    pub fn new(command: Arc<dyn CommandExecutor>, config: &ImporterConfig) -> Self {
        Self {
            command,
            binary: config.binary.clone(),
            working_dir: config.working_dir.clone(),
        }
    }

    /// `terraform workspace show`
    pub fn current_workspace(&self) -> ImportResult<String> {
        let output = self
            .command
            .execute(&self.binary, &["workspace", "show"], &self.working_dir)
            .map_err(|e| ImportError::WorkspaceUnavailable(format!("{:#}", e)))?;

        if !output.status.success() {
            return Err(ImportError::WorkspaceUnavailable(failure_detail(&output)));
        }

        let workspace = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if workspace.is_empty() {
            return Err(ImportError::WorkspaceUnavailable(format!(
                "'{} workspace show' printed nothing",
                self.binary
            )));
        }

        Ok(workspace)
    }

    /// Evaluate `var.<name>` through `terraform console`.
    ///
    /// The value is trimmed and unquoted. Empty output is an error.
    pub fn variable(&self, name: &str) -> ImportResult<String> {
        let expression = format!("var.{}\n", name);
        let command_line = format!("{} console", self.binary);

        let output = self
            .command
            .execute_with_input(&self.binary, &["console"], &expression, &self.working_dir)
            .map_err(|e| ImportError::ToolFailed {
                command: command_line.clone(),
                message: format!("{:#}", e),
                exit_code: None,
            })?;

        if !output.status.success() {
            return Err(ImportError::ToolFailed {
                command: command_line,
                message: failure_detail(&output),
                exit_code: output.status.code(),
            });
        }

        let value = parse_console_value(&String::from_utf8_lossy(&output.stdout));
        if value.is_empty() {
            return Err(ImportError::ToolFailed {
                command: command_line,
                message: format!("var.{} evaluated to an empty value", name),
                exit_code: output.status.code(),
            });
        }

        Ok(value)
    }

    /// `terraform import <address> <id>`
    pub fn import(&self, address: &str, id: &str) -> ImportResult<()> {
        let output = self
            .command
            .execute(&self.binary, &["import", address, id], &self.working_dir)
            .map_err(|e| ImportError::ToolFailed {
                command: self.import_command_line(address, id),
                message: format!("{:#}", e),
                exit_code: None,
            })?;

        if !output.status.success() {
            return Err(ImportError::ToolFailed {
                command: self.import_command_line(address, id),
                message: failure_detail(&output),
                exit_code: output.status.code(),
            });
        }

        Ok(())
    }

    fn import_command_line(&self, address: &str, id: &str) -> String {
        format!("{} import {} {}", self.binary, address, id)
    }
}

impl ImportSink for TerraformCli {
    fn apply(&self, operation: &ImportOperation) -> ImportResult<()> {
        self.import(&operation.address, &operation.id)
    }

    fn describe(&self, operation: &ImportOperation) -> String {
        self.import_command_line(&operation.address, &operation.id)
    }
}

/// Strip whitespace and the quotes `terraform console` puts around strings
pub fn parse_console_value(stdout: &str) -> String {
    let trimmed = stdout.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.to_string()
}

/// Prefer stderr, fall back to stdout, then to the exit status
fn failure_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !stdout.is_empty() {
        return stdout;
    }

    format!("exited with {}", output.status)
}
