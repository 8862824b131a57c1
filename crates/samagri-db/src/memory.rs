//! # In-Memory Gateway
//!
//! A process-local store that honours the same contract as the PostgreSQL
//! gateway: live-row visibility, uniqueness, foreign keys, the
//! non-negative quantity check, exclusive inventory row holds and atomic
//! commit. Used by tests and by `DB_DRIVER=memory`.
//!
//! ## Row Holds
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  row_locks: product_id → Arc<tokio::Mutex<()>>                          │
//! │                                                                         │
//! │  uow A: find_inventory_for_update(7) ── lock_owned() ── held ──┐        │
//! │  uow B: find_inventory_for_update(7) ── waits ...              │        │
//! │                                        │                       ▼        │
//! │                                        │            A.commit() applies  │
//! │                                        │            staged writes, then │
//! │                                        ▼            drops its guards    │
//! │                                  B proceeds, sees A's committed qty     │
//! │                                                                         │
//! │  Waiting longer than `lock_timeout` fails with DbError::Deadlock.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes made inside a unit of work are staged and become visible to
//! other readers only at commit. The unit of work itself reads its own
//! staged inventory.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use samagri_core::api::{
    CustomerFilter, InventoryFilter, Page, Paging, ProductFilter, TransactionFilter, UserFilter,
};
use samagri_core::{
    Customer, Inventory, InventoryStatus, NewCustomer, NewProduct, NewUser, Product,
    StockAdjustment, Transaction, TransactionItem, User,
};

use crate::error::{DbError, DbResult};
use crate::gateway::Gateway;
use crate::repository::{
    CustomerRepository, InventoryRepository, ProductRepository, TransactionRepository,
    UserRepository,
};
use crate::uow::{
    InventoryUpdate, NewStockAdjustment, NewTransaction, NewTransactionItem, UnitOfWork,
};

/// Default wait for an inventory row hold, matching the Postgres
/// statement timeout.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Store State
// =============================================================================

#[derive(Debug, Default)]
struct Tables {
    products: BTreeMap<i64, Product>,
    /// Keyed by product id; one row per product.
    inventories: BTreeMap<i64, Inventory>,
    customers: BTreeMap<i64, Customer>,
    users: BTreeMap<i64, User>,
    transactions: BTreeMap<i64, Transaction>,
    adjustments: Vec<StockAdjustment>,
    sequences: Sequences,
}

#[derive(Debug, Default)]
struct Sequences {
    product: i64,
    inventory: i64,
    customer: i64,
    user: i64,
    transaction: i64,
    item: i64,
    adjustment: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Debug)]
struct Shared {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
    lock_timeout: Duration,
}

impl Shared {
    fn tables(&self) -> DbResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| DbError::Internal("memory store lock poisoned".to_string()))
    }

    fn row_lock(&self, product_id: i64) -> DbResult<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self
            .row_locks
            .lock()
            .map_err(|_| DbError::Internal("memory row-lock table poisoned".to_string()))?;
        Ok(locks.entry(product_id).or_default().clone())
    }
}

/// In-process [`Gateway`]. Cheap to clone; clones share the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// A store whose row holds give up after `lock_timeout`.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        MemoryStore {
            shared: Arc::new(Shared {
                tables: Mutex::new(Tables::default()),
                row_locks: Mutex::new(HashMap::new()),
                lock_timeout,
            }),
        }
    }

    /// Stock adjustments recorded so far, oldest first.
    pub fn adjustments(&self) -> DbResult<Vec<StockAdjustment>> {
        Ok(self.shared.tables()?.adjustments.clone())
    }

    /// Sets a product's on-hand quantity outside any unit of work.
    /// Intended for fixtures.
    pub fn set_stock(&self, product_id: i64, quantity: i64, status: InventoryStatus) -> DbResult<()> {
        let mut tables = self.shared.tables()?;
        let inventory = tables
            .inventories
            .get_mut(&product_id)
            .ok_or_else(|| DbError::not_found("Inventory", product_id))?;
        let now = Utc::now();
        inventory.quantity = quantity;
        inventory.status = status;
        inventory.last_stock_update = now;
        inventory.updated_at = now;
        Ok(())
    }
}

fn paginate<T: Clone>(rows: Vec<&T>, paging: Paging) -> Page<T> {
    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .skip(paging.offset().max(0) as usize)
        .take(paging.limit().max(0) as usize)
        .cloned()
        .collect();
    Page::new(items, paging, total)
}

// =============================================================================
// Repositories
// =============================================================================

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn create(&self, product: &NewProduct) -> DbResult<Product> {
        let mut tables = self.shared.tables()?;
        let sku = product.sku.trim();

        if tables.products.values().any(|p| p.sku == sku) {
            return Err(DbError::duplicate("sku", sku));
        }

        let now = Utc::now();
        let id = next(&mut tables.sequences.product);
        let created = Product {
            id,
            name: product.name.trim().to_string(),
            description: product.description.clone(),
            price: product.price,
            sku: sku.to_string(),
            category: product.category.clone(),
            image_url: product.image_url.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let inventory_id = next(&mut tables.sequences.inventory);
        tables.inventories.insert(
            id,
            Inventory {
                id: inventory_id,
                product_id: id,
                quantity: 0,
                status: InventoryStatus::OutOfStock,
                location: product.location.clone().unwrap_or_default(),
                last_stock_update: now,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            },
        );
        tables.products.insert(id, created.clone());

        debug!(product_id = id, "Product registered with empty inventory");
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let tables = self.shared.tables()?;
        Ok(tables.products.get(&id).filter(|p| p.is_live()).cloned())
    }

    async fn list(&self, filter: &ProductFilter, paging: Paging) -> DbResult<Page<Product>> {
        let tables = self.shared.tables()?;
        let rows = tables
            .products
            .values()
            .filter(|p| p.is_live())
            .filter(|p| match &filter.category {
                Some(category) => p.category.as_ref() == Some(category),
                None => true,
            })
            .collect();
        Ok(paginate(rows, paging))
    }

    async fn soft_delete(&self, id: i64) -> DbResult<()> {
        let mut tables = self.shared.tables()?;
        let product = tables
            .products
            .get_mut(&id)
            .filter(|p| p.is_live())
            .ok_or_else(|| DbError::not_found("Product", id))?;
        let now = Utc::now();
        product.deleted_at = Some(now);
        product.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<Inventory>> {
        let tables = self.shared.tables()?;
        Ok(tables
            .inventories
            .values()
            .find(|i| i.id == id && i.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_product(&self, product_id: i64) -> DbResult<Option<Inventory>> {
        let tables = self.shared.tables()?;
        Ok(tables
            .inventories
            .get(&product_id)
            .filter(|i| i.deleted_at.is_none())
            .cloned())
    }

    async fn list(&self, filter: &InventoryFilter, paging: Paging) -> DbResult<Page<Inventory>> {
        let tables = self.shared.tables()?;
        let rows = tables
            .inventories
            .values()
            .filter(|i| i.deleted_at.is_none())
            .filter(|i| filter.status.map_or(true, |s| i.status == s))
            .collect();
        Ok(paginate(rows, paging))
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn create(&self, customer: &NewCustomer) -> DbResult<Customer> {
        let mut tables = self.shared.tables()?;
        let email = customer.email.trim();

        if tables.customers.values().any(|c| c.email == email) {
            return Err(DbError::duplicate("email", email));
        }

        let now = Utc::now();
        let id = next(&mut tables.sequences.customer);
        let created = Customer {
            id,
            first_name: customer.first_name.trim().to_string(),
            last_name: customer.last_name.trim().to_string(),
            email: email.to_string(),
            phone: customer.phone.clone(),
            address: customer.address.clone(),
            birth_date: customer.birth_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.customers.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> DbResult<Option<Customer>> {
        let tables = self.shared.tables()?;
        Ok(tables
            .customers
            .get(&id)
            .filter(|c| c.deleted_at.is_none())
            .cloned())
    }

    async fn list(&self, filter: &CustomerFilter, paging: Paging) -> DbResult<Page<Customer>> {
        let tables = self.shared.tables()?;
        let rows = tables
            .customers
            .values()
            .filter(|c| c.deleted_at.is_none())
            .filter(|c| filter.email.as_ref().map_or(true, |e| &c.email == e))
            .collect();
        Ok(paginate(rows, paging))
    }

    async fn soft_delete(&self, id: i64) -> DbResult<()> {
        let mut tables = self.shared.tables()?;
        let customer = tables
            .customers
            .get_mut(&id)
            .filter(|c| c.deleted_at.is_none())
            .ok_or_else(|| DbError::not_found("Customer", id))?;
        let now = Utc::now();
        customer.deleted_at = Some(now);
        customer.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &NewUser) -> DbResult<User> {
        let mut tables = self.shared.tables()?;
        let email = user.email.trim();

        if tables.users.values().any(|u| u.email == email) {
            return Err(DbError::duplicate("email", email));
        }

        let now = Utc::now();
        let id = next(&mut tables.sequences.user);
        let created = User {
            id,
            email: email.to_string(),
            password_hash: user.password_hash.clone(),
            first_name: user.first_name.trim().to_string(),
            last_name: user.last_name.trim().to_string(),
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let tables = self.shared.tables()?;
        Ok(tables
            .users
            .get(&id)
            .filter(|u| u.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let tables = self.shared.tables()?;
        let email = email.trim();
        Ok(tables
            .users
            .values()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned())
    }

    async fn list(&self, filter: &UserFilter, paging: Paging) -> DbResult<Page<User>> {
        let tables = self.shared.tables()?;
        let rows = tables
            .users
            .values()
            .filter(|u| u.deleted_at.is_none())
            .filter(|u| filter.role.map_or(true, |r| u.role == r))
            .collect();
        Ok(paginate(rows, paging))
    }

    async fn soft_delete(&self, id: i64) -> DbResult<()> {
        let mut tables = self.shared.tables()?;
        let user = tables
            .users
            .get_mut(&id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| DbError::not_found("User", id))?;
        let now = Utc::now();
        user.deleted_at = Some(now);
        user.updated_at = now;
        user.is_active = false;
        Ok(())
    }
}

#[async_trait]
impl TransactionRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<Transaction>> {
        let tables = self.shared.tables()?;
        Ok(tables.transactions.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &TransactionFilter,
        paging: Paging,
    ) -> DbResult<Page<Transaction>> {
        let tables = self.shared.tables()?;
        let rows = tables
            .transactions
            .values()
            .rev()
            .filter(|t| filter.customer_id.map_or(true, |c| t.customer_id == c))
            .collect();
        Ok(paginate(rows, paging))
    }
}

#[async_trait]
impl Gateway for MemoryStore {
    fn products(&self) -> &dyn ProductRepository {
        self
    }

    fn inventories(&self) -> &dyn InventoryRepository {
        self
    }

    fn customers(&self) -> &dyn CustomerRepository {
        self
    }

    fn users(&self) -> &dyn UserRepository {
        self
    }

    fn transactions(&self) -> &dyn TransactionRepository {
        self
    }

    async fn begin(&self) -> DbResult<Box<dyn UnitOfWork>> {
        Ok(Box::new(MemoryUnitOfWork::new(self.shared.clone())))
    }

    async fn health_check(&self) -> bool {
        self.shared.tables().is_ok()
    }
}

// =============================================================================
// Unit of Work
// =============================================================================

/// Staged writes plus the inventory rows this unit of work holds.
pub struct MemoryUnitOfWork {
    shared: Arc<Shared>,
    held: HashMap<i64, OwnedMutexGuard<()>>,
    inventory_updates: BTreeMap<i64, InventoryUpdate>,
    transactions: BTreeMap<i64, Transaction>,
    /// (transaction id, line no) → item
    items: BTreeMap<(i64, i32), TransactionItem>,
    adjustments: Vec<StockAdjustment>,
}

impl MemoryUnitOfWork {
    fn new(shared: Arc<Shared>) -> Self {
        MemoryUnitOfWork {
            shared,
            held: HashMap::new(),
            inventory_updates: BTreeMap::new(),
            transactions: BTreeMap::new(),
            items: BTreeMap::new(),
            adjustments: Vec::new(),
        }
    }

    async fn hold(&mut self, product_id: i64) -> DbResult<()> {
        if self.held.contains_key(&product_id) {
            return Ok(());
        }

        let lock = self.shared.row_lock(product_id)?;
        let guard = tokio::time::timeout(self.shared.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                DbError::Deadlock(format!(
                    "timed out waiting for inventory row of product {product_id}"
                ))
            })?;

        self.held.insert(product_id, guard);
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_customer(&mut self, id: i64) -> DbResult<Option<Customer>> {
        let tables = self.shared.tables()?;
        Ok(tables
            .customers
            .get(&id)
            .filter(|c| c.deleted_at.is_none())
            .cloned())
    }

    async fn find_product(&mut self, id: i64) -> DbResult<Option<Product>> {
        let tables = self.shared.tables()?;
        Ok(tables.products.get(&id).filter(|p| p.is_live()).cloned())
    }

    async fn find_inventory_for_update(&mut self, product_id: i64) -> DbResult<Option<Inventory>> {
        debug!(product_id, "Locking inventory row");
        self.hold(product_id).await?;

        let mut inventory = {
            let tables = self.shared.tables()?;
            match tables
                .inventories
                .get(&product_id)
                .filter(|i| i.deleted_at.is_none())
            {
                Some(inventory) => inventory.clone(),
                None => return Ok(None),
            }
        };

        if let Some(update) = self.inventory_updates.get(&product_id) {
            inventory.quantity = update.quantity;
            inventory.status = update.status;
            inventory.last_stock_update = update.last_stock_update;
            inventory.updated_at = update.last_stock_update;
        }
        Ok(Some(inventory))
    }

    async fn update_inventory(&mut self, update: &InventoryUpdate) -> DbResult<()> {
        {
            let tables = self.shared.tables()?;
            if !tables
                .inventories
                .get(&update.product_id)
                .is_some_and(|i| i.deleted_at.is_none())
            {
                return Err(DbError::not_found("Inventory", update.product_id));
            }
        }

        if update.quantity < 0 {
            return Err(DbError::CheckViolation {
                message: format!(
                    "inventories.quantity must be non-negative (product {})",
                    update.product_id
                ),
            });
        }

        self.hold(update.product_id).await?;
        self.inventory_updates
            .insert(update.product_id, update.clone());
        Ok(())
    }

    async fn insert_transaction(&mut self, tx: &NewTransaction) -> DbResult<Transaction> {
        if tx.total_amount.is_negative() {
            return Err(DbError::CheckViolation {
                message: "transactions.total_amount_cents must be non-negative".to_string(),
            });
        }

        let id = {
            let mut tables = self.shared.tables()?;
            if !tables.customers.contains_key(&tx.customer_id) {
                return Err(DbError::ForeignKeyViolation {
                    message: format!("customer {} does not exist", tx.customer_id),
                });
            }
            next(&mut tables.sequences.transaction)
        };

        let created = Transaction {
            id,
            customer_id: tx.customer_id,
            user_id: tx.user_id,
            total_amount: tx.total_amount,
            items: Vec::new(),
            created_at: tx.created_at,
            updated_at: tx.created_at,
        };
        self.transactions.insert(id, created.clone());
        Ok(created)
    }

    async fn insert_transaction_item(
        &mut self,
        item: &NewTransactionItem,
    ) -> DbResult<TransactionItem> {
        if item.quantity < 1 || item.price.is_negative() {
            return Err(DbError::CheckViolation {
                message: "transaction_items quantity must be >= 1 and price >= 0".to_string(),
            });
        }
        if !self.transactions.contains_key(&item.transaction_id) {
            return Err(DbError::ForeignKeyViolation {
                message: format!("transaction {} does not exist", item.transaction_id),
            });
        }
        if self
            .items
            .contains_key(&(item.transaction_id, item.line_no))
        {
            return Err(DbError::duplicate("line_no", item.line_no.to_string()));
        }

        let id = {
            let mut tables = self.shared.tables()?;
            if !tables.products.contains_key(&item.product_id) {
                return Err(DbError::ForeignKeyViolation {
                    message: format!("product {} does not exist", item.product_id),
                });
            }
            next(&mut tables.sequences.item)
        };

        let created = TransactionItem {
            id,
            transaction_id: item.transaction_id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
            created_at: item.created_at,
        };
        self.items
            .insert((item.transaction_id, item.line_no), created.clone());
        Ok(created)
    }

    async fn insert_stock_adjustment(
        &mut self,
        adjustment: &NewStockAdjustment,
    ) -> DbResult<StockAdjustment> {
        let id = {
            let mut tables = self.shared.tables()?;
            next(&mut tables.sequences.adjustment)
        };

        let created = StockAdjustment {
            id,
            product_id: adjustment.product_id,
            delta: adjustment.delta,
            quantity_after: adjustment.quantity_after,
            reason: adjustment.reason.clone(),
            user_id: adjustment.user_id,
            created_at: adjustment.created_at,
        };
        self.adjustments.push(created.clone());
        Ok(created)
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        let MemoryUnitOfWork {
            shared,
            held,
            inventory_updates,
            mut transactions,
            items,
            adjustments,
        } = *self;

        {
            let mut tables = shared.tables()?;

            for (product_id, update) in inventory_updates {
                if let Some(inventory) = tables.inventories.get_mut(&product_id) {
                    inventory.quantity = update.quantity;
                    inventory.status = update.status;
                    inventory.last_stock_update = update.last_stock_update;
                    inventory.updated_at = update.last_stock_update;
                }
            }

            // BTreeMap order is (transaction id, line no), i.e. request order.
            for ((transaction_id, _), item) in items {
                if let Some(tx) = transactions.get_mut(&transaction_id) {
                    tx.items.push(item);
                }
            }
            tables.transactions.extend(transactions);
            tables.adjustments.extend(adjustments);
        }

        debug!(rows_held = held.len(), "Unit of work committed");
        drop(held);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        debug!(rows_held = self.held.len(), "Unit of work rolled back");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uow::with_transaction;
    use samagri_core::Money;

    fn new_product(sku: &str) -> NewProduct {
        NewProduct {
            name: format!("Product {sku}"),
            description: None,
            price: Money::from_cents(500),
            sku: sku.to_string(),
            category: Some("grocery".to_string()),
            image_url: None,
            location: Some("A1".to_string()),
        }
    }

    fn update(product_id: i64, quantity: i64) -> InventoryUpdate {
        InventoryUpdate {
            product_id,
            quantity,
            status: InventoryStatus::InStock,
            last_stock_update: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_product_create_makes_empty_inventory() {
        let store = MemoryStore::new();
        let product = store.products().create(&new_product("DAL-1KG")).await.unwrap();

        let inventory = store
            .inventories()
            .find_by_product(product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inventory.quantity, 0);
        assert_eq!(inventory.status, InventoryStatus::OutOfStock);
        assert_eq!(inventory.location, "A1");
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_unique_violation() {
        let store = MemoryStore::new();
        store.products().create(&new_product("RICE-5KG")).await.unwrap();

        let err = store
            .products()
            .create(&new_product("RICE-5KG"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "sku"));
    }

    #[tokio::test]
    async fn test_soft_deleted_product_is_invisible() {
        let store = MemoryStore::new();
        let product = store.products().create(&new_product("OIL-1L")).await.unwrap();

        store.products().soft_delete(product.id).await.unwrap();

        assert!(store.products().find_by_id(product.id).await.unwrap().is_none());
        assert!(matches!(
            store.products().soft_delete(product.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_staged_writes_invisible_until_commit() {
        let store = MemoryStore::new();
        let product = store.products().create(&new_product("SALT-1KG")).await.unwrap();

        let mut uow = store.begin().await.unwrap();
        uow.find_inventory_for_update(product.id).await.unwrap();
        uow.update_inventory(&update(product.id, 40)).await.unwrap();

        // The unit of work sees its own write.
        let own = uow.find_inventory_for_update(product.id).await.unwrap().unwrap();
        assert_eq!(own.quantity, 40);

        let outside = store.inventories().find_by_product(product.id).await.unwrap().unwrap();
        assert_eq!(outside.quantity, 0);

        uow.commit().await.unwrap();
        let after = store.inventories().find_by_product(product.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 40);
    }

    #[tokio::test]
    async fn test_rollback_discards_everything() {
        let store = MemoryStore::new();
        let product = store.products().create(&new_product("TEA-250G")).await.unwrap();

        let result: Result<(), DbError> = with_transaction(&store, move |uow| {
            Box::pin(async move {
                uow.find_inventory_for_update(product.id).await?;
                uow.update_inventory(&update(product.id, 12)).await?;
                Err(DbError::Internal("abort".to_string()))
            })
        })
        .await;

        assert!(result.is_err());
        let inventory = store.inventories().find_by_product(product.id).await.unwrap().unwrap();
        assert_eq!(inventory.quantity, 0);
    }

    #[tokio::test]
    async fn test_negative_quantity_is_check_violation() {
        let store = MemoryStore::new();
        let product = store.products().create(&new_product("SUGAR-1KG")).await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let err = uow.update_inventory(&update(product.id, -1)).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_missing_customer_is_foreign_key_violation() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();

        let err = uow
            .insert_transaction(&NewTransaction {
                customer_id: 404,
                user_id: 1,
                total_amount: Money::zero(),
                created_at: Utc::now(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_row_hold_times_out_as_deadlock() {
        let store = MemoryStore::with_lock_timeout(Duration::from_millis(50));
        let product = store.products().create(&new_product("GHEE-500G")).await.unwrap();

        let mut first = store.begin().await.unwrap();
        first.find_inventory_for_update(product.id).await.unwrap();

        let mut second = store.begin().await.unwrap();
        let err = second
            .find_inventory_for_update(product.id)
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        first.rollback().await.unwrap();
        assert!(second.find_inventory_for_update(product.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_hold_is_reentrant_within_one_unit_of_work() {
        let store = MemoryStore::with_lock_timeout(Duration::from_millis(50));
        let product = store.products().create(&new_product("ATTA-10KG")).await.unwrap();

        let mut uow = store.begin().await.unwrap();
        uow.find_inventory_for_update(product.id).await.unwrap();
        assert!(uow.find_inventory_for_update(product.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_transactions_listed_newest_first_with_items_in_line_order() {
        let store = MemoryStore::new();
        let a = store.products().create(&new_product("A")).await.unwrap();
        let b = store.products().create(&new_product("B")).await.unwrap();
        let customer = store
            .customers()
            .create(&NewCustomer {
                first_name: "Asha".to_string(),
                last_name: "Rai".to_string(),
                email: "asha@example.com".to_string(),
                phone: None,
                address: None,
                birth_date: None,
            })
            .await
            .unwrap();

        for _ in 0..2 {
            let mut uow = store.begin().await.unwrap();
            let now = Utc::now();
            let tx = uow
                .insert_transaction(&NewTransaction {
                    customer_id: customer.id,
                    user_id: 1,
                    total_amount: Money::from_cents(1000),
                    created_at: now,
                })
                .await
                .unwrap();
            for (line_no, product_id) in [(2, a.id), (1, b.id)] {
                uow.insert_transaction_item(&NewTransactionItem {
                    transaction_id: tx.id,
                    line_no,
                    product_id,
                    quantity: 1,
                    price: Money::from_cents(500),
                    created_at: now,
                })
                .await
                .unwrap();
            }
            uow.commit().await.unwrap();
        }

        let page = store
            .transactions()
            .list(&TransactionFilter::default(), Paging { page: 1, page_size: 20 })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items[0].id > page.items[1].id);
        let products: Vec<i64> = page.items[0].items.iter().map(|i| i.product_id).collect();
        assert_eq!(products, vec![b.id, a.id]);
    }
}
