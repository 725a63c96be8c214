//! Batch mutator
//!
//! Applies grouped machine status and item quantity updates to the live
//! inventory stores. Holds no state of its own. Each list becomes exactly one
//! store request; an empty list becomes none.

use crate::clock::Clock;
use crate::error::{BatchMutationError, BatchTarget};
use crate::inventory::{ItemLocationsWrite, ItemStore, MachineStatusWrite, MachineStore};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use stockcheck_model::{from_single_quantity, MachineStatus};

/// Set a machine's status
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MachineUpdate {
    /// Machine id
    pub machine_id: String,
    /// Status to write
    pub status: MachineStatus,
}

impl MachineUpdate {
    /// Create new machine update
    #[inline]
    #[must_use]
    pub fn new(machine_id: impl Into<String>, status: MachineStatus) -> Self {
        Self {
            machine_id: machine_id.into(),
            status,
        }
    }
}

/// Replace an item's single quantity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemQuantityUpdate {
    /// Item id
    pub item_id: String,
    /// Quantity to write (replacement, not delta)
    pub quantity: i64,
}

impl ItemQuantityUpdate {
    /// Create new item update
    #[inline]
    #[must_use]
    pub fn new(item_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// Applier of grouped inventory writes
#[async_trait]
pub trait BatchMutator: Send + Sync {
    /// Apply machine status updates as a single request, returning the
    /// number of writes sent
    ///
    /// # Errors
    /// `BatchMutationError` if the batch as a whole failed
    async fn apply_machine_updates(&self, updates: &[MachineUpdate]) -> Result<usize, BatchMutationError>;

    /// Apply item quantity replacements as a single request, returning the
    /// number of writes sent. Items the store does not know are skipped.
    ///
    /// # Errors
    /// `BatchMutationError` if the batch as a whole failed
    async fn apply_item_quantity_updates(
        &self,
        updates: &[ItemQuantityUpdate],
    ) -> Result<usize, BatchMutationError>;
}

/// [`BatchMutator`] over a [`MachineStore`] and an [`ItemStore`]
#[derive(Clone)]
pub struct StoreBatchMutator {
    machines: Arc<dyn MachineStore>,
    items: Arc<dyn ItemStore>,
    clock: Arc<dyn Clock>,
}

impl StoreBatchMutator {
    /// Create new mutator
    #[inline]
    #[must_use]
    pub fn new(machines: Arc<dyn MachineStore>, items: Arc<dyn ItemStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            machines,
            items,
            clock,
        }
    }
}

impl fmt::Debug for StoreBatchMutator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreBatchMutator")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BatchMutator for StoreBatchMutator {
    async fn apply_machine_updates(&self, updates: &[MachineUpdate]) -> Result<usize, BatchMutationError> {
        if updates.is_empty() {
            return Ok(0);
        }

        let writes = updates
            .iter()
            .map(|u| MachineStatusWrite {
                id: u.machine_id.clone(),
                status: u.status,
            })
            .collect();

        self.machines
            .update_batch(writes)
            .await
            .map_err(|e| BatchMutationError::new(BatchTarget::Machines, updates.len(), e.to_string()))?;

        tracing::debug!(count = updates.len(), "Applied machine status batch");
        Ok(updates.len())
    }

    async fn apply_item_quantity_updates(
        &self,
        updates: &[ItemQuantityUpdate],
    ) -> Result<usize, BatchMutationError> {
        if updates.is_empty() {
            return Ok(0);
        }

        let fail = |e: crate::error::StoreError| {
            BatchMutationError::new(BatchTarget::Items, updates.len(), e.to_string())
        };

        let ids: Vec<String> = updates.iter().map(|u| u.item_id.clone()).collect();
        let current = self.items.get_many(&ids).await.map_err(fail)?;

        let now = self.clock.now();
        let mut writes = Vec::with_capacity(updates.len());
        for update in updates {
            let Some(item) = current.iter().find(|i| i.id == update.item_id) else {
                tracing::warn!(item_id = %update.item_id, "Skipping quantity update for unknown item");
                continue;
            };
            writes.push(ItemLocationsWrite {
                id: item.id.clone(),
                locations: from_single_quantity(&item.locations, update.quantity),
                updated_at: now,
            });
        }

        if writes.is_empty() {
            return Ok(0);
        }

        let written = writes.len();
        self.items.update_batch(writes).await.map_err(fail)?;

        tracing::debug!(count = written, "Applied item quantity batch");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::memory::{InMemoryItemStore, InMemoryMachineStore};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use stockcheck_model::{LocationQuantity, Machine, StockItem};

    fn fixture() -> (Arc<InMemoryMachineStore>, Arc<InMemoryItemStore>, StoreBatchMutator) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()));
        let machines = Arc::new(InMemoryMachineStore::new(vec![
            Machine::new("m1", "Crane A", MachineStatus::Online),
            Machine::new("m2", "Crane B", MachineStatus::Online),
        ]));
        let items = Arc::new(InMemoryItemStore::new(vec![
            StockItem::new("i1", "Bear", 10),
            StockItem::new("i2", "Duck", 0).with_locations(vec![
                LocationQuantity::new("Front", 2),
                LocationQuantity::new("Back", 3),
            ]),
        ]));
        let mutator = StoreBatchMutator::new(machines.clone(), items.clone(), clock);
        (machines, items, mutator)
    }

    #[tokio::test]
    async fn empty_lists_issue_no_requests() {
        let (machines, items, mutator) = fixture();
        assert_eq!(mutator.apply_machine_updates(&[]).await.unwrap(), 0);
        assert_eq!(mutator.apply_item_quantity_updates(&[]).await.unwrap(), 0);
        assert!(machines.received_batches().is_empty());
        assert!(items.received_batches().is_empty());
    }

    #[tokio::test]
    async fn machine_updates_are_one_request() {
        let (machines, _, mutator) = fixture();
        mutator
            .apply_machine_updates(&[
                MachineUpdate::new("m1", MachineStatus::Offline),
                MachineUpdate::new("m2", MachineStatus::Maintenance),
            ])
            .await
            .unwrap();

        let batches = machines.received_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(machines.get("m2").unwrap().status, MachineStatus::Maintenance);
    }

    #[tokio::test]
    async fn item_updates_rewrite_primary_location() {
        let (_, items, mutator) = fixture();
        mutator
            .apply_item_quantity_updates(&[ItemQuantityUpdate::new("i2", 7)])
            .await
            .unwrap();

        let item = items.get("i2").unwrap();
        assert_eq!(
            item.locations,
            vec![LocationQuantity::new("Front", 7), LocationQuantity::new("Back", 0)]
        );
        assert_eq!(item.quantity(), 7);
        assert!(item.updated_at.is_some());
    }

    #[tokio::test]
    async fn unknown_items_are_skipped() {
        let (_, items, mutator) = fixture();
        let written = mutator
            .apply_item_quantity_updates(&[
                ItemQuantityUpdate::new("ghost", 1),
                ItemQuantityUpdate::new("i1", 4),
            ])
            .await
            .unwrap();

        assert_eq!(written, 1);
        let batches = items.received_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(items.get("i1").unwrap().quantity(), 4);
    }

    #[tokio::test]
    async fn failed_batch_reports_attempted_count() {
        let (machines, _, mutator) = fixture();
        machines.fail_next_batch();

        let err = mutator
            .apply_machine_updates(&[MachineUpdate::new("m1", MachineStatus::Error)])
            .await
            .unwrap_err();

        assert_eq!(err.target, BatchTarget::Machines);
        assert_eq!(err.attempted, 1);
        assert_eq!(machines.get("m1").unwrap().status, MachineStatus::Online);
    }
}
