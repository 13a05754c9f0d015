use super::plan::{ImportOperation, ImportPlan};
use crate::error::{ImportError, ImportResult};
use crate::traits::Output;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether imports are actually performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    DryRun,
    Apply,
}

impl RunMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run { RunMode::DryRun } else { RunMode::Apply }
    }
}

/// Something that can bind an existing resource to a Terraform address
pub trait ImportSink: Send + Sync {
    fn apply(&self, operation: &ImportOperation) -> ImportResult<()>;

    /// Human-readable form of the invocation, for progress output
    fn describe(&self, operation: &ImportOperation) -> String {
        format!("import {} {}", operation.address, operation.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported,
    Failed(String),
    SkippedDryRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub operation: ImportOperation,
    pub outcome: ImportOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    /// The import flag was not set; nothing was looked at
    NotRequired,
    /// Discovery did not produce a complete backend
    NothingToImport,
    /// The plan was walked to the end
    Completed,
}

/// Ordered outcome of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub status: ReportStatus,
    pub records: Vec<ImportRecord>,
}

impl ExecutionReport {
    pub fn not_required() -> Self {
        Self {
            status: ReportStatus::NotRequired,
            records: Vec::new(),
        }
    }

    pub fn nothing_to_import() -> Self {
        Self {
            status: ReportStatus::NothingToImport,
            records: Vec::new(),
        }
    }

    pub fn imported(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Imported))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::SkippedDryRun))
    }

    fn count(&self, predicate: impl Fn(&ImportOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

/// Walks an import plan one operation at a time.
///
/// A failed import is recorded and the loop moves on; nothing is retried.
/// Setting `interrupted` abandons the remaining operations.
pub struct ImportExecutor {
    sink: Arc<dyn ImportSink>,
    output: Arc<dyn Output>,
    interrupted: Arc<AtomicBool>,
}

impl ImportExecutor {
    #[cfg(test)]
    pub fn new(sink: Arc<dyn ImportSink>, output: Arc<dyn Output>) -> Self {
        Self::with_interrupt(sink, output, Arc::new(AtomicBool::new(false)))
    }

    pub fn with_interrupt(
        sink: Arc<dyn ImportSink>,
        output: Arc<dyn Output>,
        interrupted: Arc<AtomicBool>,
    ) -> Self {
        Self {
            sink,
            output,
            interrupted,
        }
    }

    pub fn execute(&self, plan: &ImportPlan, mode: RunMode) -> ImportResult<ExecutionReport> {
        if plan.is_empty() {
            self.output.info("No resources found to import");
            return Ok(ExecutionReport::nothing_to_import());
        }

        self.output
            .info(&format!("Found {} resources to import:", plan.len()));
        self.output.blank();

        let mut records = Vec::with_capacity(plan.len());

        for (index, operation) in plan.operations().iter().enumerate() {
            self.check_interrupt(index, plan.len())?;

            let outcome = self.run_one(operation, mode);
            records.push(ImportRecord {
                operation: operation.clone(),
                outcome,
            });
        }

        // Ctrl-C during the last import also reaches the tool, which then fails it
        self.check_interrupt(plan.len(), plan.len())?;

        Ok(ExecutionReport {
            status: ReportStatus::Completed,
            records,
        })
    }

    fn check_interrupt(&self, completed: usize, total: usize) -> ImportResult<()> {
        if self.interrupted.load(Ordering::SeqCst) {
            return Err(ImportError::Interrupted {
                completed,
                remaining: total - completed,
            });
        }
        Ok(())
    }

    fn run_one(&self, operation: &ImportOperation, mode: RunMode) -> ImportOutcome {
        let command = self.sink.describe(operation);

        if mode == RunMode::DryRun {
            self.output
                .dimmed(&format!("[DRY RUN] Would run: {}", command));
            return ImportOutcome::SkippedDryRun;
        }

        self.output.info(&format!("Running: {}", command));
        tracing::debug!(%operation, "importing");

        let outcome = match self.sink.apply(operation) {
            Ok(()) => {
                self.output
                    .success(&format!("Successfully imported {}", operation.address));
                ImportOutcome::Imported
            }
            Err(e) => {
                let detail = match e {
                    ImportError::ToolFailed { message, .. } => message,
                    other => other.to_string(),
                };
                tracing::warn!(address = %operation.address, "import failed");
                self.output.error(&format!(
                    "Failed to import {}: {}",
                    operation.address, detail
                ));
                ImportOutcome::Failed(detail)
            }
        };

        self.output.blank();
        outcome
    }
}
