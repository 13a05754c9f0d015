//! Test doubles for the cloud inventory and the import sink
//!
//! `FakeInventory` serves scripted bucket/role listings and counts requests,
//! `RecordingSink` records every import it is asked to apply.

#![cfg(test)]

use crate::discovery::{ResourceInventory, RolePage};
use crate::error::{ImportError, ImportResult};
use crate::import::{ImportOperation, ImportSink};
use anyhow::{Result, anyhow};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory inventory with scripted listings
pub struct FakeInventory {
    buckets: std::result::Result<Vec<String>, String>,
    role_pages: std::result::Result<Vec<Vec<String>>, String>,
    bucket_requests: Mutex<usize>,
    role_requests: Mutex<usize>,
    interrupt_on_listing: Mutex<Option<Arc<AtomicBool>>>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self {
            buckets: Ok(Vec::new()),
            role_pages: Ok(Vec::new()),
            bucket_requests: Mutex::new(0),
            role_requests: Mutex::new(0),
            interrupt_on_listing: Mutex::new(None),
        }
    }

    pub fn with_buckets(mut self, names: &[&str]) -> Self {
        self.buckets = Ok(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Each inner vec is served as one page, in order
    pub fn with_role_pages(mut self, pages: Vec<Vec<&str>>) -> Self {
        self.role_pages = Ok(pages
            .into_iter()
            .map(|page| page.into_iter().map(str::to_string).collect())
            .collect());
        self
    }

    pub fn failing_buckets(mut self, message: &str) -> Self {
        self.buckets = Err(message.to_string());
        self
    }

    pub fn failing_roles(mut self, message: &str) -> Self {
        self.role_pages = Err(message.to_string());
        self
    }

    /// Raise `flag` as soon as buckets are listed, as a Ctrl-C mid-discovery would
    pub fn raise_interrupt_on_listing(&self, flag: Arc<AtomicBool>) {
        *self.interrupt_on_listing.lock().unwrap() = Some(flag);
    }

    pub fn bucket_requests(&self) -> usize {
        *self.bucket_requests.lock().unwrap()
    }

    pub fn role_page_requests(&self) -> usize {
        *self.role_requests.lock().unwrap()
    }
}

impl Default for FakeInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceInventory for FakeInventory {
    fn list_buckets(&self) -> Result<Vec<String>> {
        *self.bucket_requests.lock().unwrap() += 1;
        if let Some(flag) = self.interrupt_on_listing.lock().unwrap().as_ref() {
            flag.store(true, Ordering::SeqCst);
        }
        self.buckets.clone().map_err(|e| anyhow!(e))
    }

    fn list_roles(&self, marker: Option<&str>) -> Result<RolePage> {
        *self.role_requests.lock().unwrap() += 1;

        let pages = self.role_pages.as_ref().map_err(|e| anyhow!(e.clone()))?;
        // Markers are page indexes rendered as strings
        let index: usize = match marker {
            Some(m) => m.parse()?,
            None => 0,
        };

        let names = pages.get(index).cloned().unwrap_or_default();
        let next_marker = if index + 1 < pages.len() {
            Some((index + 1).to_string())
        } else {
            None
        };

        Ok(RolePage { names, next_marker })
    }
}

/// Import sink that records every operation and fails on chosen addresses
pub struct RecordingSink {
    applied: Mutex<Vec<ImportOperation>>,
    failing: Vec<String>,
    interrupt: Option<(usize, Arc<AtomicBool>)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            applied: Mutex::new(Vec::new()),
            failing: Vec::new(),
            interrupt: None,
        }
    }

    pub fn failing_at(addresses: &[&str]) -> Self {
        Self {
            failing: addresses.iter().map(|a| a.to_string()).collect(),
            ..Self::new()
        }
    }

    /// Raise `flag` once `count` operations have been applied
    pub fn interrupt_after(mut self, count: usize, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some((count, flag));
        self
    }

    pub fn applied(&self) -> Vec<ImportOperation> {
        self.applied.lock().unwrap().clone()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSink for RecordingSink {
    fn apply(&self, operation: &ImportOperation) -> ImportResult<()> {
        let mut applied = self.applied.lock().unwrap();
        applied.push(operation.clone());

        if let Some((count, flag)) = &self.interrupt {
            if applied.len() >= *count {
                flag.store(true, Ordering::SeqCst);
            }
        }

        if self.failing.contains(&operation.address) {
            return Err(ImportError::ToolFailed {
                command: format!("import {} {}", operation.address, operation.id),
                message: "Error: Cannot import non-existent remote object".to_string(),
                exit_code: Some(1),
            });
        }

        Ok(())
    }
}
