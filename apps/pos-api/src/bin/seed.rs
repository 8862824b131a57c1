//! Development seed tool.
//!
//! Migrates the configured PostgreSQL database, then creates an admin and
//! a cashier, a walk-in customer and a few stocked products. Prints a
//! bearer token for each user. Safe to run twice: rows that already exist
//! are reused.

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{info, warn};

use samagri_api::auth::verify_password;
use samagri_api::services::UserRegistration;
use samagri_api::{init_tracing, AppConfig, AppState, DbDriver};
use samagri_core::api::StockAdjustmentRequest;
use samagri_core::{CoreError, Money, NewCustomer, NewProduct, User, UserRole};
use samagri_db::Database;

/// (name, sku, price in cents, category, opening stock)
const PRODUCTS: &[(&str, &str, i64, &str, i64)] = &[
    ("Basmati Rice 5kg", "RICE-BAS-5KG", 95_000, "grocery", 40),
    ("Masoor Dal 1kg", "DAL-MAS-1KG", 18_000, "grocery", 60),
    ("Mustard Oil 1L", "OIL-MUS-1L", 32_500, "grocery", 8),
    ("Wai Wai Noodles", "NOODLE-WAIWAI", 2_500, "snacks", 200),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(config.env).context("Failed to install tracing subscriber")?;

    if config.db_driver != DbDriver::Postgres {
        bail!("seed writes to PostgreSQL; unset DB_DRIVER or set it to 'postgres'");
    }

    let db = Database::new(config.db_config()?)
        .await
        .context("Failed to connect to PostgreSQL")?;
    let state = AppState::new(Arc::new(db), config);

    let admin = ensure_user(
        &state,
        ("admin@samagri.np", "admin-pass-123"),
        ("Store", "Admin"),
        UserRole::Admin,
    )
    .await?;
    let cashier = ensure_user(
        &state,
        ("cashier@samagri.np", "cashier-pass-123"),
        ("Front", "Till"),
        UserRole::Cashier,
    )
    .await?;

    let walk_in = NewCustomer {
        first_name: "Walk-in".to_string(),
        last_name: "Customer".to_string(),
        email: "walk-in@samagri.np".to_string(),
        phone: None,
        address: None,
        birth_date: None,
    };
    match state.catalog.create_customer(&walk_in).await {
        Ok(customer) => info!(customer_id = customer.id, "Walk-in customer created"),
        Err(CoreError::Conflict { .. }) => info!("Walk-in customer already present"),
        Err(err) => return Err(err).context("Failed to create walk-in customer"),
    }

    for &(name, sku, cents, category, stock) in PRODUCTS {
        let product = NewProduct {
            name: name.to_string(),
            description: None,
            price: Money::from_cents(cents),
            sku: sku.to_string(),
            category: Some(category.to_string()),
            image_url: None,
            location: None,
        };

        let created = match state.catalog.create_product(&product).await {
            Ok(created) => created,
            Err(CoreError::Conflict { .. }) => {
                info!(sku, "Product already present");
                continue;
            }
            Err(err) => return Err(err).with_context(|| format!("Failed to create {sku}")),
        };

        let adjustment = StockAdjustmentRequest {
            delta: stock,
            reason: "Opening stock".to_string(),
        };
        let inventory = state
            .inventory
            .adjust(created.id, &adjustment, Some(admin.id))
            .await
            .with_context(|| format!("Failed to stock {sku}"))?;
        info!(sku, quantity = inventory.quantity, status = %inventory.status, "Product stocked");
    }

    for user in [&admin, &cashier] {
        let token = state.jwt.issue(user).map_err(|e| anyhow::anyhow!(e.message))?;
        println!("{} ({}): {}", user.email, user.role, token);
    }

    Ok(())
}

/// Creates the user, or returns the live one already holding `email`.
/// Warns when an existing account no longer accepts the seeded password.
async fn ensure_user(
    state: &AppState,
    (email, password): (&str, &str),
    (first_name, last_name): (&str, &str),
    role: UserRole,
) -> anyhow::Result<User> {
    let registration = UserRegistration {
        email: email.to_string(),
        password: password.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        role,
    };

    match state.catalog.create_user(&registration).await {
        Ok(user) => {
            info!(user_id = user.id, %role, "User created");
            Ok(user)
        }
        Err(CoreError::Conflict { .. }) => {
            let user = state
                .gateway
                .users()
                .find_by_email(email)
                .await?
                .with_context(|| format!("{email} exists but is deactivated"))?;
            if !verify_password(password, &user.password_hash) {
                warn!(email, "Existing user has a different password");
            }
            Ok(user)
        }
        Err(err) => Err(err).with_context(|| format!("Failed to create {email}")),
    }
}
