//! Derives the name prefix shared by the state-backend resources.

use crate::config::ImporterConfig;
use crate::error::ImportResult;
use crate::executor::TerraformCli;

/// Literal segment between project and workspace in backend resource names
pub const STATE_FILES_SEGMENT: &str = "state-files";

/// `{project}-state-files-{workspace}`
pub fn resource_prefix(project: &str, workspace: &str) -> String {
    format!("{}-{}-{}", project, STATE_FILES_SEGMENT, workspace)
}

/// Identities resolved at the start of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNames {
    pub project: String,
    pub workspace: String,
    pub prefix: String,
}

impl ResolvedNames {
    pub fn new(project: impl Into<String>, workspace: impl Into<String>) -> Self {
        let project = project.into();
        let workspace = workspace.into();
        let prefix = resource_prefix(&project, &workspace);
        Self {
            project,
            workspace,
            prefix,
        }
    }
}

pub struct NamingResolver<'a> {
    tool: &'a TerraformCli,
    config: &'a ImporterConfig,
}

impl<'a> NamingResolver<'a> {
    pub fn new(tool: &'a TerraformCli, config: &'a ImporterConfig) -> Self {
        Self { tool, config }
    }

    /// Explicit override first, otherwise the state tool's current workspace.
    /// Failure here is fatal for the run.
    pub fn resolve_workspace(&self) -> ImportResult<String> {
        if let Some(workspace) = &self.config.workspace {
            tracing::debug!(workspace = %workspace, "using workspace override");
            return Ok(workspace.clone());
        }

        let workspace = self.tool.current_workspace()?;
        tracing::debug!(workspace = %workspace, "resolved current workspace");
        Ok(workspace)
    }

    /// Reads the project variable, falling back to the configured default on any failure
    pub fn resolve_project(&self) -> String {
        match self.tool.variable(&self.config.project_variable) {
            Ok(project) => project,
            Err(e) => {
                tracing::warn!(
                    variable = %self.config.project_variable,
                    fallback = %self.config.default_project,
                    error = %e,
                    "project name unavailable, using default"
                );
                self.config.default_project.clone()
            }
        }
    }

    pub fn resolve(&self) -> ImportResult<ResolvedNames> {
        let workspace = self.resolve_workspace()?;
        let project = self.resolve_project();
        Ok(ResolvedNames::new(project, workspace))
    }
}
