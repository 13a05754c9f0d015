use crate::discovery::{AwsInventoryProvider, InventoryProvider};
use crate::traits::{CommandExecutor, Output, RealCommandExecutor, TerminalOutput};
#[cfg(test)]
use crate::traits::{MockCommandExecutor, MockOutput};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Application context that holds all dependencies for dependency injection
pub struct Context {
    pub output: Arc<dyn Output>,
    pub command: Arc<dyn CommandExecutor>,
    pub inventory: Arc<dyn InventoryProvider>,
    /// Raised by the Ctrl-C handler
    pub interrupted: Arc<AtomicBool>,
}

impl Context {
    /// Create a new context with real implementations (for production use)
    pub fn new() -> Self {
        Self {
            output: Arc::new(TerminalOutput),
            command: Arc::new(RealCommandExecutor::new()),
            inventory: Arc::new(AwsInventoryProvider),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a test context with specific mock implementations
    #[cfg(test)]
    pub fn test_with(
        output: Arc<MockOutput>,
        command: Arc<MockCommandExecutor>,
        inventory: Arc<dyn InventoryProvider>,
    ) -> Self {
        Self {
            output,
            command,
            inventory,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
