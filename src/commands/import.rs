use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::config::{ConfigOverrides, ImporterConfig};
use crate::context::Context;
use crate::discovery::{DiscoveredBackend, Discoverer, ResourceKind};
use crate::error::ImportError;
use crate::executor::TerraformCli;
use crate::import::{ExecutionReport, ImportExecutor, ImportPlan, ReportStatus, RunMode};
use crate::naming::{NamingResolver, ResolvedNames};

/// Import an existing state backend (S3 bucket + IAM role) into Terraform state
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Show what would be imported without actually doing it
    #[arg(long, env = "TFSTATE_IMPORT_DRY_RUN")]
    pub dry_run: bool,

    /// Workspace to import into (default: current terraform workspace)
    #[arg(short, long, env = "TFSTATE_IMPORT_WORKSPACE")]
    pub workspace: Option<String>,

    /// AWS profile to use (default: mfa)
    #[arg(short, long, env = "TFSTATE_IMPORT_PROFILE")]
    pub profile: Option<String>,

    /// AWS region (default: the profile's region)
    #[arg(short, long, env = "TFSTATE_IMPORT_REGION")]
    pub region: Option<String>,

    /// Terraform-compatible binary to run (e.g. terraform, tofu)
    #[arg(long, env = "TFSTATE_IMPORT_BINARY")]
    pub binary: Option<String>,

    /// Directory containing the Terraform configuration (default: current directory)
    #[arg(short = 'C', long, env = "TFSTATE_IMPORT_WORKING_DIR")]
    pub working_dir: Option<PathBuf>,

    /// Config file (default: .tfstate-import.yaml in the working directory)
    #[arg(long, env = "TFSTATE_IMPORT_CONFIG")]
    pub config: Option<PathBuf>,
}

impl ImportCommand {
    pub fn execute(self, ctx: &Context) -> Result<ExecutionReport> {
        let mode = RunMode::from_dry_run(self.dry_run);
        let config = ImporterConfig::load(self.into_overrides())?;
        tracing::debug!(?config, ?mode, "resolved configuration");

        let report = Self::run(ctx, &config, mode)?;
        Ok(report)
    }

    fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            workspace: self.workspace,
            profile: self.profile,
            region: self.region,
            binary: self.binary,
            working_dir: self.working_dir,
            config_path: self.config,
        }
    }

    /// One bootstrap run: names, session, gate, discovery, plan, imports
    pub fn run(
        ctx: &Context,
        config: &ImporterConfig,
        mode: RunMode,
    ) -> Result<ExecutionReport> {
        let tool = Arc::new(TerraformCli::new(ctx.command.clone(), config));
        let resolver = NamingResolver::new(&tool, config);

        let names = resolver.resolve()?;
        let inventory = ctx.inventory.connect(config)?;

        let required = Self::import_required(&tool, config);
        // A Ctrl-C that killed `console` must not read as a false flag
        Self::ensure_not_interrupted(ctx, 0)?;

        if !required {
            ctx.output.info(&format!(
                "Import not needed: var.{} is not set to true",
                config.import_flag_variable
            ));
            return Ok(ExecutionReport::not_required());
        }

        Self::display_header(ctx, config, &names, mode);

        let discoverer = Discoverer::new(inventory, ctx.output.clone());
        let discovered = discoverer.discover_backend(&names.prefix);
        Self::warn_missing(ctx, &discovered);

        let plan = ImportPlan::from_discovery(&discovered);
        Self::ensure_not_interrupted(ctx, plan.len())?;

        let executor =
            ImportExecutor::with_interrupt(tool, ctx.output.clone(), ctx.interrupted.clone());
        let report = executor.execute(&plan, mode)?;

        Self::display_summary(ctx, &report, mode);
        Ok(report)
    }

    fn ensure_not_interrupted(ctx: &Context, remaining: usize) -> Result<()> {
        if ctx.interrupted.load(Ordering::SeqCst) {
            return Err(ImportError::Interrupted {
                completed: 0,
                remaining,
            }
            .into());
        }
        Ok(())
    }

    /// The import flag must evaluate to `true`; anything else, including
    /// failure to evaluate it, means the run does nothing.
    fn import_required(tool: &TerraformCli, config: &ImporterConfig) -> bool {
        match tool.variable(&config.import_flag_variable) {
            Ok(value) => value.eq_ignore_ascii_case("true"),
            Err(e) => {
                tracing::warn!(
                    variable = %config.import_flag_variable,
                    error = %e,
                    "import flag unavailable, treating as false"
                );
                false
            }
        }
    }

    fn display_header(ctx: &Context, config: &ImporterConfig, names: &ResolvedNames, mode: RunMode) {
        ctx.output.section("State backend import");
        ctx.output.key_value("Workspace", &names.workspace);
        ctx.output.key_value("AWS profile", &config.profile);
        ctx.output.key_value("Project", &names.project);
        ctx.output.key_value("Resource prefix", &names.prefix);
        if mode == RunMode::DryRun {
            ctx.output.key_value("Mode", "dry run");
        }
        ctx.output.blank();
    }

    fn warn_missing(ctx: &Context, discovered: &DiscoveredBackend) {
        let missing = [
            (ResourceKind::StorageBucket, discovered.bucket.is_none()),
            (ResourceKind::AccessRole, discovered.role.is_none()),
        ];

        for (kind, is_missing) in missing {
            if is_missing {
                ctx.output.warning(&format!(
                    "No {} found matching the expected prefix",
                    kind
                ));
            }
        }
    }

    fn display_summary(ctx: &Context, report: &ExecutionReport, mode: RunMode) {
        if report.status != ReportStatus::Completed {
            return;
        }

        match mode {
            RunMode::DryRun => ctx.output.info(&format!(
                "Dry run complete: {} imports would run",
                report.skipped()
            )),
            RunMode::Apply if report.failed() == 0 => ctx.output.success(&format!(
                "Imported {} resources",
                report.imported()
            )),
            RunMode::Apply => ctx.output.warning(&format!(
                "Imported {} resources, {} failed; fix them and rerun",
                report.imported(),
                report.failed()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{InventoryProvider, ResourceInventory};
    use crate::error::ImportResult;
    use crate::import::runner::ImportOutcome;
    use crate::test_helpers::FakeInventory;
    use crate::traits::{MockCommandExecutor, MockCommandResult, MockOutput, OutputMessage};
    use std::sync::Mutex;

    /// Hands out one prepared inventory and counts connections
    struct StaticProvider {
        inventory: Arc<FakeInventory>,
        connections: Mutex<usize>,
        fail: bool,
    }

    impl StaticProvider {
        fn new(inventory: FakeInventory) -> Self {
            Self {
                inventory: Arc::new(inventory),
                connections: Mutex::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(FakeInventory::new())
            }
        }
    }

    impl InventoryProvider for StaticProvider {
        fn connect(&self, config: &ImporterConfig) -> ImportResult<Arc<dyn ResourceInventory>> {
            *self.connections.lock().unwrap() += 1;
            if self.fail {
                return Err(ImportError::Credentials {
                    profile: config.profile.clone(),
                    message: "The config profile could not be found".to_string(),
                });
            }
            Ok(self.inventory.clone())
        }
    }

    fn acme_inventory() -> FakeInventory {
        FakeInventory::new()
            .with_buckets(&["unrelated", "acme-state-files-prod-a1b2"])
            .with_role_pages(vec![vec!["admin"], vec!["acme-state-files-prod-role"]])
    }

    /// workspace show, console (project), console (flag)
    fn tool_outputs(flag: &str) -> Vec<MockCommandResult> {
        vec![
            MockCommandResult::ok("terraform workspace show", "prod\n"),
            MockCommandResult::ok("terraform console", "\"acme\"\n"),
            MockCommandResult::ok("terraform console", &format!("{}\n", flag)),
        ]
    }

    struct Harness {
        output: Arc<MockOutput>,
        command: Arc<MockCommandExecutor>,
        provider: Arc<StaticProvider>,
        ctx: Context,
    }

    fn harness(outputs: Vec<MockCommandResult>, provider: StaticProvider) -> Harness {
        let output = Arc::new(MockOutput::new());
        let command = Arc::new(MockCommandExecutor::with_outputs(outputs));
        let provider = Arc::new(provider);
        let ctx = Context::test_with(output.clone(), command.clone(), provider.clone());
        Harness {
            output,
            command,
            provider,
            ctx,
        }
    }

    fn import_lines(command: &MockCommandExecutor) -> Vec<String> {
        command
            .command_lines()
            .into_iter()
            .filter(|line| line.starts_with("terraform import"))
            .collect()
    }

    #[test]
    fn test_apply_imports_full_backend() {
        let h = harness(tool_outputs("true"), StaticProvider::new(acme_inventory()));

        let report =
            ImportCommand::run(&h.ctx, &ImporterConfig::default(), RunMode::Apply).unwrap();

        assert_eq!(report.status, ReportStatus::Completed);
        assert_eq!(report.imported(), 7);

        let imports = import_lines(&h.command);
        assert_eq!(imports.len(), 7);
        assert_eq!(
            imports[0],
            "terraform import aws_s3_bucket.terraform_state acme-state-files-prod-a1b2"
        );
        assert_eq!(
            imports[6],
            "terraform import aws_iam_role_policy.terraform_state_policy acme-state-files-prod-role:terraform-state-files-policy"
        );
        assert!(h.output.contains_message(&OutputMessage::KeyValue(
            "Resource prefix".to_string(),
            "acme-state-files-prod".to_string()
        )));
    }

    #[test]
    fn test_dry_run_runs_no_imports() {
        let h = harness(tool_outputs("true"), StaticProvider::new(acme_inventory()));

        let report =
            ImportCommand::run(&h.ctx, &ImporterConfig::default(), RunMode::DryRun).unwrap();

        assert_eq!(report.skipped(), 7);
        assert!(import_lines(&h.command).is_empty());
        assert!(h.output.to_text().contains("[DRY RUN] Would run: terraform import"));
    }

    #[test]
    fn test_flag_false_skips_discovery_and_imports() {
        let h = harness(tool_outputs("false"), StaticProvider::new(acme_inventory()));

        let report =
            ImportCommand::run(&h.ctx, &ImporterConfig::default(), RunMode::Apply).unwrap();

        assert_eq!(report, ExecutionReport::not_required());
        assert!(import_lines(&h.command).is_empty());
        assert_eq!(h.provider.inventory.bucket_requests(), 0);
        assert_eq!(h.provider.inventory.role_page_requests(), 0);
        assert!(h.output.contains_message(&OutputMessage::Info(
            "Import not needed: var.import_existing_resources is not set to true".to_string()
        )));
    }

    #[test]
    fn test_flag_unavailable_is_treated_as_false() {
        let outputs = vec![
            MockCommandResult::ok("terraform workspace show", "prod\n"),
            MockCommandResult::ok("terraform console", "\"acme\"\n"),
            MockCommandResult::failed("terraform console", 1, "Error: undeclared variable"),
        ];
        let h = harness(outputs, StaticProvider::new(acme_inventory()));

        let report =
            ImportCommand::run(&h.ctx, &ImporterConfig::default(), RunMode::Apply).unwrap();

        assert_eq!(report.status, ReportStatus::NotRequired);
        assert_eq!(h.provider.inventory.bucket_requests(), 0);
    }

    #[test]
    fn test_bucket_without_role_imports_nothing() {
        let inventory = FakeInventory::new()
            .with_buckets(&["acme-state-files-prod-a1b2"])
            .with_role_pages(vec![vec!["admin"]]);
        let h = harness(tool_outputs("true"), StaticProvider::new(inventory));

        let report =
            ImportCommand::run(&h.ctx, &ImporterConfig::default(), RunMode::Apply).unwrap();

        assert_eq!(report.status, ReportStatus::NothingToImport);
        assert!(import_lines(&h.command).is_empty());
        assert!(h.output.contains_message(&OutputMessage::Info(
            "No resources found to import".to_string()
        )));
        assert!(h.output.contains_message(&OutputMessage::Warning(
            "No IAM role found matching the expected prefix".to_string()
        )));
    }

    #[test]
    fn test_failed_import_is_reported_not_propagated() {
        let mut outputs = tool_outputs("true");
        outputs.push(MockCommandResult::failed(
            "terraform import aws_s3_bucket_public_access_block.terraform_state_pab acme-state-files-prod-a1b2",
            1,
            "Error: Cannot import non-existent remote object",
        ));
        let h = harness(outputs, StaticProvider::new(acme_inventory()));

        let report =
            ImportCommand::run(&h.ctx, &ImporterConfig::default(), RunMode::Apply).unwrap();

        assert_eq!(import_lines(&h.command).len(), 7);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.records[3].outcome,
            ImportOutcome::Failed("Error: Cannot import non-existent remote object".to_string())
        );
    }

    #[test]
    fn test_workspace_failure_is_fatal_before_session() {
        let outputs = vec![MockCommandResult::failed(
            "terraform workspace show",
            127,
            "terraform: command not found",
        )];
        let h = harness(outputs, StaticProvider::new(acme_inventory()));

        let err = ImportCommand::run(&h.ctx, &ImporterConfig::default(), RunMode::Apply)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::WorkspaceUnavailable(_))
        ));
        assert_eq!(*h.provider.connections.lock().unwrap(), 0);
    }

    #[test]
    fn test_session_failure_is_fatal() {
        let h = harness(tool_outputs("true"), StaticProvider::failing());

        let err = ImportCommand::run(&h.ctx, &ImporterConfig::default(), RunMode::Apply)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::Credentials { .. })
        ));
        assert!(import_lines(&h.command).is_empty());
    }

    #[test]
    fn test_workspace_override_changes_prefix() {
        let outputs = vec![
            MockCommandResult::ok("terraform console", "\"acme\"\n"),
            MockCommandResult::ok("terraform console", "true\n"),
        ];
        let inventory = FakeInventory::new()
            .with_buckets(&["acme-state-files-staging-x"])
            .with_role_pages(vec![vec!["acme-state-files-staging-role"]]);
        let h = harness(outputs, StaticProvider::new(inventory));
        let config = ImporterConfig {
            workspace: Some("staging".to_string()),
            ..ImporterConfig::default()
        };

        let report = ImportCommand::run(&h.ctx, &config, RunMode::Apply).unwrap();

        assert_eq!(report.imported(), 7);
        assert!(
            !h.command
                .command_lines()
                .contains(&"terraform workspace show".to_string())
        );
    }

    #[test]
    fn test_interrupt_during_gate_is_not_treated_as_false_flag() {
        let h = harness(tool_outputs("false"), StaticProvider::new(acme_inventory()));
        h.ctx.interrupted.store(true, Ordering::SeqCst);

        let err = ImportCommand::run(&h.ctx, &ImporterConfig::default(), RunMode::Apply)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::Interrupted { .. })
        ));
        assert!(!h.output.to_text().contains("Import not needed"));
        assert_eq!(h.provider.inventory.bucket_requests(), 0);
    }

    #[test]
    fn test_interrupt_during_discovery_with_nothing_found() {
        let h = harness(
            tool_outputs("true"),
            StaticProvider::new(FakeInventory::new()),
        );
        h.provider
            .inventory
            .raise_interrupt_on_listing(h.ctx.interrupted.clone());

        let err = ImportCommand::run(&h.ctx, &ImporterConfig::default(), RunMode::Apply)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::Interrupted { remaining: 0, .. })
        ));
        assert!(!h.output.contains_message(&OutputMessage::Info(
            "No resources found to import".to_string()
        )));
        assert!(import_lines(&h.command).is_empty());
    }

    #[test]
    fn test_interrupt_before_first_import_aborts() {
        let h = harness(tool_outputs("true"), StaticProvider::new(acme_inventory()));
        h.ctx.interrupted.store(true, Ordering::SeqCst);

        let err = ImportCommand::run(&h.ctx, &ImporterConfig::default(), RunMode::Apply)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::Interrupted { completed: 0, .. })
        ));
        assert!(import_lines(&h.command).is_empty());
    }
}
