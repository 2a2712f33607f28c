//! Shared test utilities for `EcoTrade`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test accounts and credits with sensible defaults.

use crate::{
    config::marketplace::{AdminConfig, RegistrationConfig},
    core::{
        account::{self, NewAccount},
        credit,
        identifier::DocumentKind,
        lifecycle::{AuditOutcome, NewCredit},
        session::Session,
    },
    entities::{self, Role},
    errors::Result,
};
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

/// Password used by every account the helpers register.
pub const TEST_PASSWORD: &str = "secret123";

/// A valid CPF.
pub const TEST_CPF: &str = "111.444.777-35";

/// A valid CNPJ.
pub const TEST_CNPJ: &str = "11.222.333/0001-81";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

async fn register(
    db: &DatabaseConnection,
    email: &str,
    name: &str,
    role: Role,
    document_kind: DocumentKind,
    document: &str,
) -> Result<entities::account::Model> {
    account::register_account(
        db,
        NewAccount {
            display_name: name.to_string(),
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            password_confirmation: TEST_PASSWORD.to_string(),
            role,
            document_kind,
            document: document.to_string(),
        },
        &RegistrationConfig::default(),
    )
    .await
}

/// Registers a producer with a valid CPF.
///
/// # Defaults
/// * `display_name`: "Test Producer"
/// * `password`: [`TEST_PASSWORD`]
pub async fn create_test_producer(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::account::Model> {
    register(
        db,
        email,
        "Test Producer",
        Role::Producer,
        DocumentKind::Individual,
        TEST_CPF,
    )
    .await
}

/// Registers a company with a valid CNPJ and the name "Test Company".
pub async fn create_test_company(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::account::Model> {
    create_custom_company(db, email, "Test Company").await
}

/// Registers a company with a custom display name.
pub async fn create_custom_company(
    db: &DatabaseConnection,
    email: &str,
    name: &str,
) -> Result<entities::account::Model> {
    register(
        db,
        email,
        name,
        Role::Company,
        DocumentKind::Organization,
        TEST_CNPJ,
    )
    .await
}

/// Seeds the default administrator and returns its session.
pub async fn create_test_admin(db: &DatabaseConnection) -> Result<Session> {
    let config = AdminConfig::default();
    if let Some(admin) = account::seed_admin(db, &config).await? {
        return Ok(Session::from(admin));
    }
    let admin = account::authenticate(db, &config.email, &config.password).await?;
    Ok(Session::from(admin))
}

/// A session that exists only in memory. Good for checks that fail before any I/O.
#[must_use]
pub fn test_session(role: Role) -> Session {
    Session {
        account_id: Uuid::new_v4().to_string(),
        display_name: format!("Test {role}"),
        email: format!("{role}@example.com"),
        role,
        document_kind: DocumentKind::Individual,
        document: TEST_CPF.to_string(),
    }
}

/// Credit input generated a month ago.
#[must_use]
pub fn test_new_credit(quantity_tons: f64, unit_price: f64) -> NewCredit {
    NewCredit {
        quantity_tons,
        origin: "Reflorestamento Mata Atlântica".to_string(),
        generated_at: (Utc::now() - Duration::days(30)).date_naive(),
        unit_price,
    }
}

/// Sets up a database with one producer and one pending credit.
/// Returns (db, credit) for audit tests.
pub async fn setup_with_pending_credit(
    quantity_tons: f64,
    unit_price: f64,
) -> Result<(DatabaseConnection, entities::credit::Model)> {
    let db = setup_test_db().await?;
    let producer = Session::from(create_test_producer(&db, "producer@example.com").await?);
    let credit =
        credit::submit_credit(&db, &producer, test_new_credit(quantity_tons, unit_price)).await?;
    Ok((db, credit))
}

/// Sets up a database with one approved credit ready for trading.
/// Returns (db, credit) for trade tests.
pub async fn setup_with_approved_credit(
    quantity_tons: f64,
    unit_price: f64,
) -> Result<(DatabaseConnection, entities::credit::Model)> {
    let (db, pending) = setup_with_pending_credit(quantity_tons, unit_price).await?;
    let admin = create_test_admin(&db).await?;
    let credit =
        credit::audit_credit(&db, &admin, &pending.id, AuditOutcome::Approve, None).await?;
    Ok((db, credit))
}
