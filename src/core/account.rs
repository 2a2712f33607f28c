//! Account business logic - registration, authentication and lookups.
//!
//! Registration validates the password pair, the tax document for the chosen
//! kind and email uniqueness before anything is written. Documents are stored in
//! canonical punctuated form. Passwords are kept as a salted SHA-256 hash.

use crate::{
    config::marketplace::{AdminConfig, RegistrationConfig},
    core::identifier::DocumentKind,
    entities::{Account, Role, account},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

/// Registration form input.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Name shown on credits and trades
    pub display_name: String,
    /// Login email
    pub email: String,
    /// Chosen password
    pub password: String,
    /// Password typed a second time
    pub password_confirmation: String,
    /// Producer or company
    pub role: Role,
    /// CPF or CNPJ
    pub document_kind: DocumentKind,
    /// Document digits, punctuation allowed
    pub document: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn new_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Returns true if `password` matches the account's stored hash.
#[must_use]
pub fn verify_password(account: &account::Model, password: &str) -> bool {
    hash_password(&account.password_salt, password) == account.password_hash
}

/// Checks a registration form without touching the database.
///
/// The password pair and its length are checked before the document.
pub fn validate_registration(input: &NewAccount, policy: &RegistrationConfig) -> Result<()> {
    if input.display_name.trim().is_empty() {
        return Err(Error::MissingField { field: "name" });
    }
    if input.email.trim().is_empty() {
        return Err(Error::MissingField { field: "email" });
    }
    if input.role == Role::Admin {
        return Err(Error::Forbidden {
            role: input.role,
            action: "self-register",
        });
    }
    if input.password != input.password_confirmation {
        return Err(Error::PasswordMismatch);
    }
    if input.password.chars().count() < policy.min_password_length {
        return Err(Error::PasswordTooShort {
            min: policy.min_password_length,
        });
    }
    if !input.document_kind.is_valid(&input.document) {
        return Err(Error::InvalidDocument {
            kind: input.document_kind,
            value: input.document.clone(),
        });
    }
    Ok(())
}

/// Registers a new producer or company account.
///
/// # Errors
/// Returns a validation error from [`validate_registration`], `EmailTaken` if the
/// email is already registered, or a database error.
pub async fn register_account(
    db: &DatabaseConnection,
    input: NewAccount,
    policy: &RegistrationConfig,
) -> Result<account::Model> {
    validate_registration(&input, policy)?;

    let email = normalize_email(&input.email);
    if get_account_by_email(db, &email).await?.is_some() {
        return Err(Error::EmailTaken { email });
    }

    let salt = new_salt();
    let model = account::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        display_name: Set(input.display_name.trim().to_string()),
        email: Set(email.clone()),
        password_hash: Set(hash_password(&salt, &input.password)),
        password_salt: Set(salt),
        role: Set(input.role),
        document_kind: Set(input.document_kind),
        document: Set(input.document_kind.format(&input.document)),
        created_at: Set(Utc::now()),
    };

    let account = insert_account(db, model, email).await?;
    info!(account_id = %account.id, role = %account.role, "Registered account");
    Ok(account)
}

/// Inserts a new account row.
///
/// The unique index on `email` backs up the lookup done before the insert: a
/// registration that lost the race surfaces as `EmailTaken`, not a raw database error.
async fn insert_account(
    db: &DatabaseConnection,
    model: account::ActiveModel,
    email: String,
) -> Result<account::Model> {
    model.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            warn!(%email, "Email registered concurrently");
            Error::EmailTaken { email }
        }
        _ => e.into(),
    })
}

/// Checks an email/password pair.
///
/// # Errors
/// `AccountNotFound` for an unknown email, `InvalidPassword` for a wrong password.
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<account::Model> {
    let email = normalize_email(email);
    let account = get_account_by_email(db, &email)
        .await?
        .ok_or_else(|| Error::AccountNotFound {
            email: email.clone(),
        })?;

    if !verify_password(&account, password) {
        warn!(account_id = %account.id, "Rejected login with wrong password");
        return Err(Error::InvalidPassword);
    }
    Ok(account)
}

/// Inserts the configured administrator unless an account with that email exists.
///
/// The admin document is stored verbatim; it is not a registered CPF/CNPJ.
/// Returns the new account, or `None` if it was already present.
pub async fn seed_admin(
    db: &DatabaseConnection,
    admin: &AdminConfig,
) -> Result<Option<account::Model>> {
    let email = normalize_email(&admin.email);
    if get_account_by_email(db, &email).await?.is_some() {
        return Ok(None);
    }

    let salt = new_salt();
    let model = account::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        display_name: Set(admin.name.clone()),
        email: Set(email),
        password_hash: Set(hash_password(&salt, &admin.password)),
        password_salt: Set(salt),
        role: Set(Role::Admin),
        document_kind: Set(DocumentKind::Individual),
        document: Set(admin.document.clone()),
        created_at: Set(Utc::now()),
    };

    let account = model.insert(db).await?;
    info!(account_id = %account.id, email = %account.email, "Seeded administrator");
    Ok(Some(account))
}

/// Finds an account by email (case-insensitive).
pub async fn get_account_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<account::Model>> {
    Account::find()
        .filter(account::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an account by id.
pub async fn get_account_by_id(
    db: &DatabaseConnection,
    account_id: &str,
) -> Result<Option<account::Model>> {
    Account::find_by_id(account_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every account, newest first.
pub async fn list_accounts(db: &DatabaseConnection) -> Result<Vec<account::Model>> {
    Account::find()
        .order_by_desc(account::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}
