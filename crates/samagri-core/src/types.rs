//! # Domain Types
//!
//! Core domain types used throughout the Apana Samagri POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐ 1:1 ┌─────────────────┐                            │
//! │  │    Product      │────►│   Inventory     │  status derived from qty   │
//! │  │  sku (unique)   │     │  quantity ≥ 0   │                            │
//! │  │  price          │     │  status         │                            │
//! │  └────────┬────────┘     └─────────────────┘                            │
//! │           │ price snapshot                                              │
//! │  ┌────────▼────────┐ owns ┌─────────────────┐                           │
//! │  │ TransactionItem │◄─────│  Transaction    │──► Customer (back-ref)    │
//! │  │  quantity ≥ 1   │      │  total_amount   │──► User     (back-ref)    │
//! │  │  price          │      └─────────────────┘                           │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## System-Managed Fields
//! Every entity has a surrogate `id` assigned by the store, `created_at`,
//! `updated_at` and a nullable `deleted_at` soft-delete marker. A row with
//! `deleted_at` set is invisible to every "live" lookup.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    pub description: Option<String>,

    /// Current unit price. Sales snapshot this value.
    #[ts(as = "String")]
    pub price: Money,

    /// Stock Keeping Unit - globally unique business identifier.
    pub sku: String,

    pub category: Option<String>,

    pub image_url: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether the product is visible to sales and lookups.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Input for registering a product.
///
/// Registration also creates the product's inventory row (quantity 0,
/// `out_of_stock`) at `location`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[ts(as = "String")]
    pub price: Money,
    pub sku: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

// =============================================================================
// Inventory
// =============================================================================

/// Stock classification, derived from quantity after every write.
///
/// ## State Machine
/// ```text
/// quantity = 0              → OutOfStock
/// 0 < quantity ≤ LOW_WATER  → LowStock
/// quantity > LOW_WATER      → InStock
/// ```
/// See [`crate::inventory::StockPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InventoryStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl InventoryStatus {
    /// Column value, matching the CHECK constraint on `inventories.status`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            InventoryStatus::InStock => "in_stock",
            InventoryStatus::LowStock => "low_stock",
            InventoryStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InventoryStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_stock" => Ok(InventoryStatus::InStock),
            "low_stock" => Ok(InventoryStatus::LowStock),
            "out_of_stock" => Ok(InventoryStatus::OutOfStock),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec![
                    "in_stock".to_string(),
                    "low_stock".to_string(),
                    "out_of_stock".to_string(),
                ],
            }),
        }
    }
}

/// Stock record for one product. Exactly one row per product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Inventory {
    pub id: i64,
    pub product_id: i64,
    /// Units on hand. Never negative.
    pub quantity: i64,
    pub status: InventoryStatus,
    pub location: String,
    #[ts(as = "String")]
    pub last_stock_update: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Audit note written by every stock adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockAdjustment {
    pub id: i64,
    pub product_id: i64,
    /// Signed change applied to the quantity.
    pub delta: i64,
    pub quantity_after: i64,
    pub reason: String,
    /// Who made the adjustment, when known.
    pub user_id: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Unique across customers.
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "Option<String>")]
    pub birth_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub birth_date: Option<NaiveDate>,
}

// =============================================================================
// User
// =============================================================================

/// Role carried by an authenticated user. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Cashier,
    Manager,
}

impl UserRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Cashier => "cashier",
            UserRole::Manager => "manager",
        }
    }

    /// Admins and managers maintain the catalog and adjust stock.
    pub const fn can_manage(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "cashier" => Ok(UserRole::Cashier),
            "manager" => Ok(UserRole::Manager),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec![
                    "admin".to_string(),
                    "cashier".to_string(),
                    "manager".to_string(),
                ],
            }),
        }
    }
}

/// A staff account. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a user. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

// =============================================================================
// Transaction
// =============================================================================

/// One committed sale. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transaction {
    pub id: i64,
    pub customer_id: i64,
    /// The user who recorded the sale.
    pub user_id: i64,
    /// Σ item.price × item.quantity
    #[ts(as = "String")]
    pub total_amount: Money,
    /// Items in the order the cashier entered them.
    pub items: Vec<TransactionItem>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Recomputes the total from the items.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(TransactionItem::line_total).sum()
    }
}

/// A line of a committed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionItem {
    pub id: i64,
    pub transaction_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Product price at the time of sale. Immutable once written.
    #[ts(as = "String")]
    pub price: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl TransactionItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_status_round_trips_through_column_value() {
        for status in [
            InventoryStatus::InStock,
            InventoryStatus::LowStock,
            InventoryStatus::OutOfStock,
        ] {
            assert_eq!(status.as_str().parse::<InventoryStatus>().unwrap(), status);
        }
        assert!("sold_out".parse::<InventoryStatus>().is_err());
    }

    #[test]
    fn test_user_role_parsing() {
        assert_eq!("manager".parse::<UserRole>().unwrap(), UserRole::Manager);
        assert!("owner".parse::<UserRole>().is_err());
        assert!(UserRole::Admin.can_manage());
        assert!(!UserRole::Cashier.can_manage());
    }

    #[test]
    fn test_user_never_serializes_password_hash() {
        let now = Utc::now();
        let user = User {
            id: 1,
            email: "a@b.co".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            role: UserRole::Cashier,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains("\"role\":\"cashier\""));
    }

    #[test]
    fn test_transaction_items_total() {
        let now = Utc::now();
        let item = |id, quantity, cents| TransactionItem {
            id,
            transaction_id: 1,
            product_id: id,
            quantity,
            price: Money::from_cents(cents),
            created_at: now,
        };
        let tx = Transaction {
            id: 1,
            customer_id: 7,
            user_id: 1,
            total_amount: Money::from_cents(800),
            items: vec![item(1, 2, 250), item(2, 1, 300)],
            created_at: now,
            updated_at: now,
        };
        assert_eq!(tx.items_total(), tx.total_amount);
    }
}
