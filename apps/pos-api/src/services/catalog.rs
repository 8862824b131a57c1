//! # Catalog Service
//!
//! Products, customers and staff accounts: the reference data a sale
//! points at. Plain repository calls, no unit of work; product
//! registration is made atomic with its inventory row by the store.
//!
//! ```text
//! create_product ──► validate ──► products().create ──► Product + Inventory(0, out_of_stock)
//! delete_product ──► products().soft_delete            (history keeps the row)
//! create_user    ──► validate ──► argon2id hash ──► users().create
//! ```

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use samagri_core::api::{CustomerFilter, Page, PageRequest, ProductFilter, UserFilter};
use samagri_core::validation::{
    validate_email, validate_id, validate_new_customer, validate_new_product, validate_page,
    validate_password, validate_required,
};
use samagri_core::{
    CoreError, CoreResult, Customer, NewCustomer, NewProduct, NewUser, Product, User, UserRole,
};
use samagri_db::{DbError, Gateway};

use crate::auth::hash_password;

/// Input for creating a staff account. The password is hashed before it
/// reaches the store.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRegistration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

#[derive(Clone)]
pub struct CatalogService {
    gateway: Arc<dyn Gateway>,
}

impl CatalogService {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        CatalogService { gateway }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Registers a product with an empty inventory row.
    pub async fn create_product(&self, product: &NewProduct) -> CoreResult<Product> {
        validate_new_product(product)?;

        let mut product = product.clone();
        product.sku = product.sku.trim().to_string();
        product.name = product.name.trim().to_string();

        let created = self.gateway.products().create(&product).await?;
        info!(product_id = created.id, sku = %created.sku, "Product registered");
        Ok(created)
    }

    pub async fn get_product(&self, id: i64) -> CoreResult<Product> {
        validate_id("id", id)?;

        self.gateway
            .products()
            .find_by_id(id)
            .await?
            .ok_or(CoreError::ProductNotFound(id))
    }

    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> CoreResult<Page<Product>> {
        let paging = validate_page(page)?;
        Ok(self.gateway.products().list(filter, paging).await?)
    }

    /// Soft delete. Past sales keep pointing at the row.
    pub async fn delete_product(&self, id: i64) -> CoreResult<()> {
        validate_id("id", id)?;

        match self.gateway.products().soft_delete(id).await {
            Ok(()) => {
                info!(product_id = id, "Product deleted");
                Ok(())
            }
            Err(DbError::NotFound { .. }) => Err(CoreError::ProductNotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    pub async fn create_customer(&self, customer: &NewCustomer) -> CoreResult<Customer> {
        validate_new_customer(customer)?;

        let mut customer = customer.clone();
        customer.email = customer.email.trim().to_lowercase();

        let created = self.gateway.customers().create(&customer).await?;
        info!(customer_id = created.id, "Customer registered");
        Ok(created)
    }

    pub async fn get_customer(&self, id: i64) -> CoreResult<Customer> {
        validate_id("id", id)?;

        self.gateway
            .customers()
            .find_by_id(id)
            .await?
            .ok_or(CoreError::CustomerNotFound(id))
    }

    /// Emails are stored lowercased, so the filter is matched the same way.
    pub async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> CoreResult<Page<Customer>> {
        let paging = validate_page(page)?;
        let filter = CustomerFilter {
            email: filter.email.as_deref().map(|email| email.trim().to_lowercase()),
        };
        Ok(self.gateway.customers().list(&filter, paging).await?)
    }

    pub async fn delete_customer(&self, id: i64) -> CoreResult<()> {
        validate_id("id", id)?;

        match self.gateway.customers().soft_delete(id).await {
            Ok(()) => {
                info!(customer_id = id, "Customer deleted");
                Ok(())
            }
            Err(DbError::NotFound { .. }) => Err(CoreError::CustomerNotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn create_user(&self, registration: &UserRegistration) -> CoreResult<User> {
        validate_email(&registration.email)?;
        validate_password(&registration.password)?;
        validate_required("first_name", &registration.first_name, 100)?;
        validate_required("last_name", &registration.last_name, 100)?;

        let password_hash = hash_password(&registration.password)
            .map_err(|e| CoreError::internal(e.message))?;

        let user = self
            .gateway
            .users()
            .create(&NewUser {
                email: registration.email.trim().to_lowercase(),
                password_hash,
                first_name: registration.first_name.trim().to_string(),
                last_name: registration.last_name.trim().to_string(),
                role: registration.role,
            })
            .await?;

        info!(user_id = user.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn list_users(&self, filter: &UserFilter, page: PageRequest) -> CoreResult<Page<User>> {
        let paging = validate_page(page)?;
        Ok(self.gateway.users().list(filter, paging).await?)
    }

    /// Deactivates the account; its tokens stop authenticating.
    pub async fn delete_user(&self, id: i64) -> CoreResult<()> {
        validate_id("id", id)?;

        match self.gateway.users().soft_delete(id).await {
            Ok(()) => {
                info!(user_id = id, "User deleted");
                Ok(())
            }
            Err(DbError::NotFound { .. }) => Err(CoreError::not_found("User", id)),
            Err(err) => Err(err.into()),
        }
    }
}
