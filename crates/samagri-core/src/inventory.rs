//! # Inventory Policy
//!
//! Derives [`InventoryStatus`] from quantity and guards stock arithmetic.
//! Every inventory write, whether a sale debit or a manual adjustment,
//! goes through [`StockPolicy`] so status and quantity change together.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::InventoryStatus;

/// Default LOW_WATER threshold.
pub const DEFAULT_LOW_WATER: i64 = 10;

/// Stock classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockPolicy {
    low_water: i64,
}

impl Default for StockPolicy {
    fn default() -> Self {
        StockPolicy {
            low_water: DEFAULT_LOW_WATER,
        }
    }
}

impl StockPolicy {
    /// Creates a policy. Negative thresholds are treated as zero.
    pub fn new(low_water: i64) -> Self {
        StockPolicy {
            low_water: low_water.max(0),
        }
    }

    pub fn low_water(&self) -> i64 {
        self.low_water
    }

    /// Status for a quantity.
    ///
    /// ```rust
    /// use samagri_core::inventory::StockPolicy;
    /// use samagri_core::InventoryStatus;
    ///
    /// let policy = StockPolicy::new(10);
    /// assert_eq!(policy.status_for(0), InventoryStatus::OutOfStock);
    /// assert_eq!(policy.status_for(10), InventoryStatus::LowStock);
    /// assert_eq!(policy.status_for(11), InventoryStatus::InStock);
    /// ```
    pub fn status_for(&self, quantity: i64) -> InventoryStatus {
        if quantity <= 0 {
            InventoryStatus::OutOfStock
        } else if quantity <= self.low_water {
            InventoryStatus::LowStock
        } else {
            InventoryStatus::InStock
        }
    }

    /// Quantity left after selling `requested` units out of `available`.
    pub fn debit(&self, product_id: i64, available: i64, requested: i64) -> CoreResult<i64> {
        if available < requested {
            return Err(CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            });
        }
        Ok(available - requested)
    }

    /// Quantity after applying a signed adjustment.
    ///
    /// A result below zero is reported as insufficient stock for the
    /// removed amount. A delta that would push the quantity past `i64::MAX`
    /// is out of range.
    pub fn apply_delta(&self, product_id: i64, current: i64, delta: i64) -> CoreResult<i64> {
        let next = current.checked_add(delta).ok_or_else(|| ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: current.saturating_neg(),
            max: i64::MAX.saturating_sub(current),
        })?;
        if next < 0 {
            return Err(CoreError::InsufficientStock {
                product_id,
                available: current,
                requested: delta.saturating_neg(),
            });
        }
        Ok(next)
    }
}
