pub mod plan;
pub mod runner;

pub use plan::{ImportOperation, ImportPlan};
pub use runner::{ExecutionReport, ImportExecutor, ImportSink, ReportStatus, RunMode};
