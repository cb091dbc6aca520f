//! # Party Repository
//!
//! Stores and the people referenced by order documents: suppliers,
//! customers, users.
//!
//! These records are external collaborators to the transaction engine. It
//! never mutates them; it only needs the find half of the find/save
//! contract to validate that an order's references exist. The insert half
//! is here for bootstrap, seeding, and tests.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{Customer, Store, Supplier, User};

/// Repository for store, supplier, customer, and user lookups.
#[derive(Debug, Clone)]
pub struct PartyRepository {
    pool: SqlitePool,
}

impl PartyRepository {
    /// Creates a new PartyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PartyRepository { pool }
    }

    // ===== Finds (existence checks for the orchestrator) =====

    /// Gets a store by ID. The tenant boundary check for every use case.
    pub async fn find_store(&self, id: &str) -> DbResult<Option<Store>> {
        let store = sqlx::query_as::<_, Store>(
            "SELECT id, name, tax_id, address, is_active, created_at, updated_at \
             FROM stores WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(store)
    }

    /// Gets a supplier by ID within a store.
    pub async fn find_supplier(&self, store_id: &str, id: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            "SELECT id, store_id, name, tax_id, email, phone, is_active, created_at, updated_at \
             FROM suppliers WHERE store_id = ?1 AND id = ?2",
        )
        .bind(store_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Gets a customer by ID within a store.
    pub async fn find_customer(&self, store_id: &str, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, store_id, name, tax_id, email, phone, is_active, created_at, updated_at \
             FROM customers WHERE store_id = ?1 AND id = ?2",
        )
        .bind(store_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a user by ID within a store.
    pub async fn find_user(&self, store_id: &str, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, store_id, username, full_name, is_active, created_at, updated_at \
             FROM users WHERE store_id = ?1 AND id = ?2",
        )
        .bind(store_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    // ===== Inserts (bootstrap / seeding / tests) =====

    /// Inserts a store.
    pub async fn insert_store(&self, conn: &mut SqliteConnection, store: &Store) -> DbResult<()> {
        debug!(id = %store.id, name = %store.name, "Inserting store");

        sqlx::query(
            "INSERT INTO stores (id, name, tax_id, address, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&store.id)
        .bind(&store.name)
        .bind(&store.tax_id)
        .bind(&store.address)
        .bind(store.is_active)
        .bind(store.created_at)
        .bind(store.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a supplier.
    pub async fn insert_supplier(
        &self,
        conn: &mut SqliteConnection,
        supplier: &Supplier,
    ) -> DbResult<()> {
        debug!(id = %supplier.id, "Inserting supplier");

        sqlx::query(
            "INSERT INTO suppliers \
             (id, store_id, name, tax_id, email, phone, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&supplier.id)
        .bind(&supplier.store_id)
        .bind(&supplier.name)
        .bind(&supplier.tax_id)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(supplier.is_active)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a customer.
    pub async fn insert_customer(
        &self,
        conn: &mut SqliteConnection,
        customer: &Customer,
    ) -> DbResult<()> {
        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers \
             (id, store_id, name, tax_id, email, phone, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&customer.id)
        .bind(&customer.store_id)
        .bind(&customer.name)
        .bind(&customer.tax_id)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a user.
    pub async fn insert_user(&self, conn: &mut SqliteConnection, user: &User) -> DbResult<()> {
        debug!(id = %user.id, username = %user.username, "Inserting user");

        sqlx::query(
            "INSERT INTO users \
             (id, store_id, username, full_name, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&user.id)
        .bind(&user.store_id)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
