// crates/data-lifecycle-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Config Store
// Description: Paged in-memory config store for tests and dry runs.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryConfigStore`] keeps items in insertion order and pages them with
//! a plain offset cursor. It can be told to fail scans or checkpoint writes
//! so failure paths of the row loop can be exercised.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::core::RawItem;
use crate::core::RawValue;
use crate::core::TableKey;
use crate::interfaces::ConfigStore;
use crate::interfaces::ConfigStoreError;
use crate::interfaces::ScanPage;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Default number of items per scan page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Shared state behind the store handle.
#[derive(Debug, Default)]
struct StoreState {
    /// Items in insertion order.
    items: Vec<RawItem>,
    /// Tables whose checkpoint writes fail.
    failing_updates: Vec<TableKey>,
    /// Fail every scan when set.
    fail_scans: bool,
}

/// In-memory config store for tests and examples.
#[derive(Debug, Clone)]
pub struct InMemoryConfigStore {
    /// Store state protected by a mutex.
    state: Arc<Mutex<StoreState>>,
    /// Items per scan page.
    page_size: usize,
}

impl Default for InMemoryConfigStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl InMemoryConfigStore {
    /// Creates a store holding `items`.
    #[must_use]
    pub fn new(items: Vec<RawItem>) -> Self {
        Self::with_page_size(items, DEFAULT_PAGE_SIZE)
    }

    /// Creates a store with an explicit page size (minimum 1).
    #[must_use]
    pub fn with_page_size(items: Vec<RawItem>, page_size: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                items,
                ..StoreState::default()
            })),
            page_size: page_size.max(1),
        }
    }

    /// Makes checkpoint writes for `key` fail.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError`] when the store mutex is poisoned.
    pub fn fail_updates_for(&self, key: TableKey) -> Result<(), ConfigStoreError> {
        self.lock()?.failing_updates.push(key);
        Ok(())
    }

    /// Makes every scan fail.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError`] when the store mutex is poisoned.
    pub fn fail_scans(&self) -> Result<(), ConfigStoreError> {
        self.lock()?.fail_scans = true;
        Ok(())
    }

    /// Returns a snapshot of the stored items.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError`] when the store mutex is poisoned.
    pub fn items(&self) -> Result<Vec<RawItem>, ConfigStoreError> {
        Ok(self.lock()?.items.clone())
    }

    /// Returns the stored checkpoint text for `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError`] when the store mutex is poisoned.
    pub fn checkpoint(&self, key: &TableKey) -> Result<Option<String>, ConfigStoreError> {
        let guard = self.lock()?;
        let checkpoint = guard
            .items
            .iter()
            .find(|item| TableKey::from_raw(item).as_ref() == Some(key))
            .and_then(|item| item.get("checkpoint"))
            .map(ToString::to_string);
        Ok(checkpoint)
    }

    /// Acquires the state lock.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreState>, ConfigStoreError> {
        self.state
            .lock()
            .map_err(|_| ConfigStoreError::Store("config store mutex poisoned".to_string()))
    }
}

impl ConfigStore for InMemoryConfigStore {
    type Cursor = usize;

    fn scan_page(&self, cursor: Option<usize>) -> Result<ScanPage<usize>, ConfigStoreError> {
        let guard = self.lock()?;
        if guard.fail_scans {
            return Err(ConfigStoreError::Io("scan rejected".to_string()));
        }
        let start = cursor.unwrap_or(0).min(guard.items.len());
        let end = start.saturating_add(self.page_size).min(guard.items.len());
        let items = guard.items[start .. end].to_vec();
        let next = (end < guard.items.len()).then_some(end);
        Ok(ScanPage {
            items,
            next,
        })
    }

    fn update_checkpoint(&self, key: &TableKey, checkpoint: &str) -> Result<(), ConfigStoreError> {
        let mut guard = self.lock()?;
        if guard.failing_updates.contains(key) {
            return Err(ConfigStoreError::Io(format!("checkpoint update rejected for {key}")));
        }
        let slot = guard.items.iter_mut().find(|item| TableKey::from_raw(item).as_ref() == Some(key));
        match slot {
            Some(item) => {
                item.insert("checkpoint".to_string(), RawValue::text(checkpoint));
            }
            None => {
                let mut item = RawItem::new();
                item.insert("schema_name".to_string(), RawValue::text(key.schema_name.as_str()));
                item.insert("table_name".to_string(), RawValue::text(key.table_name.as_str()));
                item.insert("checkpoint".to_string(), RawValue::text(checkpoint));
                guard.items.push(item);
            }
        }
        Ok(())
    }
}
