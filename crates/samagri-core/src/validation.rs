//! # Validation Module
//!
//! Input validation for the Apana Samagri POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP adapter                                                  │
//! │  └── Type validation (JSON / query deserialization)                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services                                                      │
//! │  └── THIS MODULE: field ranges, formats, required values                │
//! │      (runs before any unit of work is opened)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (PostgreSQL)                                         │
//! │  ├── CHECK constraints (quantity ≥ 0, status, role)                     │
//! │  └── UNIQUE constraints (sku, email, inventories.product_id)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::api::{PageRequest, Paging, TransactionRequest};
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewCustomer, NewProduct};
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum password length for user accounts.
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use samagri_core::validation::validate_sku;
///
/// assert!(validate_sku("DAL-1KG").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid_format(
            "sku",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Validates a required, bounded text field such as a name.
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// A structural check: one `@`, a non-empty local part, and a domain with
/// a dot that neither starts nor ends the domain. No whitespace.
///
/// ```rust
/// use samagri_core::validation::validate_email;
///
/// assert!(validate_email("ram@samagri.np").is_ok());
/// assert!(validate_email("ram@localhost").is_err());
/// assert!(validate_email("not an email").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }
    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let invalid = || ValidationError::invalid_format("email", "not a valid email address");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }
    if domain.contains("..") {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a plaintext password before hashing.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale line quantity.
///
/// ## Rules
/// - Must be at least 1
///
/// ```rust
/// use samagri_core::validation::validate_quantity;
///
/// assert!(validate_quantity(5).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(-1).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price (must not be negative).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Validates an entity id supplied by a client.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id < 1 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates a sale request before any unit of work is opened.
///
/// ## Rules
/// - `customer_id` is a positive id
/// - `items` is non-empty
/// - every item has a positive `product_id`, quantity ≥ 1 and price ≥ 0
pub fn validate_transaction_request(req: &TransactionRequest) -> ValidationResult<()> {
    validate_id("customer_id", req.customer_id)?;

    if req.items.is_empty() {
        return Err(ValidationError::required("items"));
    }

    for item in &req.items {
        validate_id("product_id", item.product_id)?;
        validate_quantity(item.quantity)?;
        validate_price(item.price)?;
    }

    Ok(())
}

pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_required("name", &product.name, 200)?;
    validate_sku(&product.sku)?;
    validate_price(product.price)?;
    Ok(())
}

pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    validate_required("first_name", &customer.first_name, 100)?;
    validate_required("last_name", &customer.last_name, 100)?;
    validate_email(&customer.email)?;
    Ok(())
}

/// Validates a stock adjustment.
pub fn validate_adjustment(delta: i64, reason: &str) -> ValidationResult<()> {
    if delta == 0 {
        return Err(ValidationError::invalid_format("delta", "must not be zero"));
    }
    validate_required("reason", reason, 500)
}

/// Turns raw paging parameters into a validated window.
///
/// ## Rules
/// - Missing values default to page 1 and DEFAULT_PAGE_SIZE
/// - `page` and `page_size` below 1 are rejected
/// - `page_size` above MAX_PAGE_SIZE is clamped
/// - a `page` whose offset does not fit in an `i64` is out of range
///
/// ```rust
/// use samagri_core::api::PageRequest;
/// use samagri_core::validation::validate_page;
///
/// let paging = validate_page(PageRequest::default()).unwrap();
/// assert_eq!((paging.page, paging.page_size), (1, 20));
///
/// let paging = validate_page(PageRequest::new(2, 500)).unwrap();
/// assert_eq!(paging.page_size, 100);
/// ```
pub fn validate_page(req: PageRequest) -> ValidationResult<Paging> {
    let page = req.page.unwrap_or(1);
    let page_size = req.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    if page < 1 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }
    if page_size < 1 {
        return Err(ValidationError::MustBePositive {
            field: "page_size".to_string(),
        });
    }

    let page_size = page_size.min(MAX_PAGE_SIZE);
    if (page - 1).checked_mul(page_size).is_none() {
        return Err(ValidationError::OutOfRange {
            field: "page".to_string(),
            min: 1,
            max: i64::MAX / page_size + 1,
        });
    }

    Ok(Paging { page, page_size })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TransactionItemRequest;

    fn item(product_id: i64, quantity: i64, cents: i64) -> TransactionItemRequest {
        TransactionItemRequest {
            product_id,
            quantity,
            price: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("CHAMAL-5KG").is_ok());
        assert!(validate_sku("rice_basmati").is_ok());
        assert!(validate_sku("  ").is_err());
        assert!(validate_sku("has space").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("sita@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("sita@example..com").is_err());
        assert!(validate_email("sita@.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_transaction_request() {
        let ok = TransactionRequest {
            customer_id: 7,
            items: vec![item(1, 2, 250)],
        };
        assert!(validate_transaction_request(&ok).is_ok());

        let empty = TransactionRequest {
            customer_id: 7,
            items: vec![],
        };
        assert!(matches!(
            validate_transaction_request(&empty),
            Err(ValidationError::Required { .. })
        ));

        let zero_qty = TransactionRequest {
            customer_id: 7,
            items: vec![item(1, 0, 250)],
        };
        assert!(validate_transaction_request(&zero_qty).is_err());

        let negative_price = TransactionRequest {
            customer_id: 7,
            items: vec![item(1, 1, -1)],
        };
        assert!(matches!(
            validate_transaction_request(&negative_price),
            Err(ValidationError::Negative { .. })
        ));

        let no_customer = TransactionRequest {
            customer_id: 0,
            items: vec![item(1, 1, 100)],
        };
        assert!(validate_transaction_request(&no_customer).is_err());
    }

    #[test]
    fn test_bulk_quantities_are_allowed() {
        let req = TransactionRequest {
            customer_id: 7,
            items: (1..=250).map(|id| item(id, 10_000, 100)).collect(),
        };
        assert!(validate_transaction_request(&req).is_ok());
        assert!(validate_quantity(i64::MAX).is_ok());
    }

    #[test]
    fn test_free_items_are_allowed() {
        let req = TransactionRequest {
            customer_id: 7,
            items: vec![item(1, 1, 0)],
        };
        assert!(validate_transaction_request(&req).is_ok());
    }

    #[test]
    fn test_validate_page() {
        assert!(validate_page(PageRequest::new(0, 10)).is_err());
        assert!(validate_page(PageRequest::new(1, 0)).is_err());
        let paging = validate_page(PageRequest {
            page: Some(3),
            page_size: None,
        })
        .unwrap();
        assert_eq!(paging, Paging { page: 3, page_size: 20 });
    }

    #[test]
    fn test_validate_page_rejects_unrepresentable_offset() {
        let err = validate_page(PageRequest {
            page: Some(i64::MAX),
            page_size: None,
        })
        .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "page"));

        let last = i64::MAX / MAX_PAGE_SIZE + 1;
        let paging = validate_page(PageRequest::new(last, MAX_PAGE_SIZE)).unwrap();
        assert_eq!(paging.offset(), (last - 1) * MAX_PAGE_SIZE);
        assert!(validate_page(PageRequest::new(last + 1, MAX_PAGE_SIZE)).is_err());
    }

    #[test]
    fn test_validate_adjustment() {
        assert!(validate_adjustment(5, "delivery").is_ok());
        assert!(validate_adjustment(0, "nothing").is_err());
        assert!(validate_adjustment(-2, "  ").is_err());
    }
}
