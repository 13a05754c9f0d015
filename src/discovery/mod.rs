//! Locates the state-backend resources by name prefix.
//!
//! Discovery never fails a run: listing errors are reported as warnings and
//! treated as "not found", since the usual bootstrap case is that nothing
//! exists yet.

pub mod aws;

pub use aws::AwsInventoryProvider;

use crate::config::ImporterConfig;
use crate::error::ImportResult;
use crate::traits::Output;
use anyhow::Result;
use std::fmt;
use std::sync::Arc;

/// Kinds of resources that make up a state backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    StorageBucket,
    AccessRole,
}

impl ResourceKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::StorageBucket => "S3 bucket",
            ResourceKind::AccessRole => "IAM role",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One page of a role listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePage {
    pub names: Vec<String>,
    /// Marker for the next page; `None` once the listing is exhausted
    pub next_marker: Option<String>,
}

/// Read-only enumeration of cloud resources, mockable in tests
pub trait ResourceInventory: Send + Sync {
    /// Every bucket name visible to the credentials, in listing order
    fn list_buckets(&self) -> Result<Vec<String>>;

    /// One page of role names starting at `marker`
    fn list_roles(&self, marker: Option<&str>) -> Result<RolePage>;
}

/// Opens an inventory session for a run's configuration.
///
/// Failing to open the session is fatal for the run.
pub trait InventoryProvider: Send + Sync {
    fn connect(&self, config: &ImporterConfig) -> ImportResult<Arc<dyn ResourceInventory>>;
}

/// Result of discovering both backend resources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredBackend {
    pub bucket: Option<String>,
    pub role: Option<String>,
}

pub struct Discoverer {
    inventory: Arc<dyn ResourceInventory>,
    output: Arc<dyn Output>,
}

impl Discoverer {
    pub fn new(inventory: Arc<dyn ResourceInventory>, output: Arc<dyn Output>) -> Self {
        Self { inventory, output }
    }

    /// First resource of `kind` whose name starts with `prefix`, if any
    pub fn discover(&self, kind: ResourceKind, prefix: &str) -> Option<String> {
        let result = match kind {
            ResourceKind::StorageBucket => self.find_bucket(prefix),
            ResourceKind::AccessRole => self.find_role(prefix),
        };

        match result {
            Ok(Some(name)) => {
                self.output.success(&format!("Found {}: {}", kind, name));
                Some(name)
            }
            Ok(None) => {
                tracing::debug!(%kind, prefix, "no match");
                None
            }
            Err(e) => {
                tracing::warn!(%kind, error = %format!("{:#}", e), "listing failed");
                self.output
                    .warning(&format!("Error discovering {}: {:#}", kind, e));
                None
            }
        }
    }

    /// Discover the bucket, then the role
    pub fn discover_backend(&self, prefix: &str) -> DiscoveredBackend {
        DiscoveredBackend {
            bucket: self.discover(ResourceKind::StorageBucket, prefix),
            role: self.discover(ResourceKind::AccessRole, prefix),
        }
    }

    fn find_bucket(&self, prefix: &str) -> Result<Option<String>> {
        let buckets = self.inventory.list_buckets()?;
        tracing::debug!(count = buckets.len(), "listed buckets");
        Ok(first_match(buckets, prefix))
    }

    fn find_role(&self, prefix: &str) -> Result<Option<String>> {
        let mut marker: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.inventory.list_roles(marker.as_deref())?;
            pages += 1;

            if let Some(found) = first_match(page.names, prefix) {
                tracing::debug!(pages, "role found");
                return Ok(Some(found));
            }

            match page.next_marker {
                Some(next) => marker = Some(next),
                None => {
                    tracing::debug!(pages, "role listing exhausted");
                    return Ok(None);
                }
            }
        }
    }
}

fn first_match(names: Vec<String>, prefix: &str) -> Option<String> {
    names.into_iter().find(|name| name.starts_with(prefix))
}
