//! # API Data Transfer Objects
//!
//! Request and response shapes shared by the HTTP adapter and the services.
//! TypeScript bindings are generated for the POS frontend with `ts-rs`.
//!
//! ## Sale Request / Response
//! ```text
//! POST /transactions
//! {                                         201 Created
//!   "customer_id": 7,                       {
//!   "items": [                                "id": 42, "customer_id": 7,
//!     {"product_id": 1,                       "user_id": 3,
//!      "quantity": 2,                         "total_amount": "5.00",
//!      "price": 2.50}      ───────────►       "items": [{"id": 90, "product_id": 1,
//!   ]                                                   "quantity": 2, "price": "2.50",
//! }                                                     "line_total": "5.00"}],
//!                                             "created_at": "...", "updated_at": "..."
//!                                           }
//! ```
//! The client `price` is informational; the response carries the server's
//! price snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Inventory, InventoryStatus, Product, Transaction, TransactionItem};

// =============================================================================
// Sales
// =============================================================================

/// One requested line of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionItemRequest {
    pub product_id: i64,
    pub quantity: i64,
    /// Client-proposed unit price. Validated for range, never trusted.
    #[ts(as = "String")]
    pub price: Money,
}

/// Body of `POST /transactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionRequest {
    pub customer_id: i64,
    pub items: Vec<TransactionItemRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub price: Money,
    #[ts(as = "String")]
    pub line_total: Money,
}

impl From<TransactionItem> for TransactionItemResponse {
    fn from(item: TransactionItem) -> Self {
        TransactionItemResponse {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
            line_total: item.line_total(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionResponse {
    pub id: i64,
    pub customer_id: i64,
    pub user_id: i64,
    #[ts(as = "String")]
    pub total_amount: Money,
    pub items: Vec<TransactionItemResponse>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        TransactionResponse {
            id: tx.id,
            customer_id: tx.customer_id,
            user_id: tx.user_id,
            total_amount: tx.total_amount,
            items: tx.items.into_iter().map(Into::into).collect(),
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        }
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// Body of `POST /inventory/{product_id}/adjust`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockAdjustmentRequest {
    /// Signed change; positive for receiving, negative for shrinkage.
    pub delta: i64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryResponse {
    pub product_id: i64,
    pub product_name: String,
    pub sku: String,
    pub quantity: i64,
    pub status: InventoryStatus,
    pub location: String,
    #[ts(as = "String")]
    pub last_stock_update: DateTime<Utc>,
}

impl InventoryResponse {
    pub fn new(product: &Product, inventory: Inventory) -> Self {
        InventoryResponse {
            product_id: product.id,
            product_name: product.name.clone(),
            sku: product.sku.clone(),
            quantity: inventory.quantity,
            status: inventory.status,
            location: inventory.location,
            last_stock_update: inventory.last_stock_update,
        }
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Raw paging parameters as they arrive on a query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        PageRequest {
            page: Some(page),
            page_size: Some(page_size),
        }
    }
}

/// Validated paging window. Build with [`crate::validation::validate_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: i64,
    pub page_size: i64,
}

impl Paging {
    /// Rows to skip before this page. Saturates for windows that did not
    /// come through `validate_page`.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page - 1).max(0).saturating_mul(self.page_size.max(0))
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// One page of a listing plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, paging: Paging, total: i64) -> Self {
        Page {
            items,
            page: paging.page,
            page_size: paging.page_size,
            total,
        }
    }

    /// Converts every item, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerFilter {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserFilter {
    pub role: Option<crate::types::UserRole>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct InventoryFilter {
    pub status: Option<InventoryStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TransactionFilter {
    pub customer_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_numeric_price() {
        let body = r#"{"customer_id":7,"items":[{"product_id":1,"quantity":2,"price":2.50}]}"#;
        let req: TransactionRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.customer_id, 7);
        assert_eq!(req.items[0].price, Money::from_cents(250));
    }

    #[test]
    fn test_response_renders_money_as_strings() {
        let now = Utc::now();
        let tx = Transaction {
            id: 1,
            customer_id: 7,
            user_id: 3,
            total_amount: Money::from_cents(500),
            items: vec![TransactionItem {
                id: 10,
                transaction_id: 1,
                product_id: 1,
                quantity: 2,
                price: Money::from_cents(250),
                created_at: now,
            }],
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(TransactionResponse::from(tx)).unwrap();
        assert_eq!(json["total_amount"], "5.00");
        assert_eq!(json["items"][0]["price"], "2.50");
        assert_eq!(json["items"][0]["line_total"], "5.00");
    }

    #[test]
    fn test_paging_offset() {
        let paging = Paging { page: 3, page_size: 20 };
        assert_eq!(paging.offset(), 40);
        assert_eq!(paging.limit(), 20);
    }
}
