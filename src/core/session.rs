//! Session handling.
//!
//! A [`Session`] is the acting identity passed explicitly into every operation
//! that needs one. Between CLI invocations the active account id is persisted
//! in the `system_state` table under `current_account`; [`current_session`]
//! turns it back into a `Session`.

use crate::{
    core::{
        access::{self, Capability},
        account,
        identifier::DocumentKind,
    },
    entities::{Role, SystemState, account as account_entity, system_state},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::{debug, info};

const CURRENT_ACCOUNT_KEY: &str = "current_account";

/// The logged-in account, without credential material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Account id
    pub account_id: String,
    /// Display name
    pub display_name: String,
    /// Login email
    pub email: String,
    /// Marketplace role
    pub role: Role,
    /// CPF or CNPJ
    pub document_kind: DocumentKind,
    /// Punctuated document
    pub document: String,
}

impl Session {
    /// Fails with `Error::Forbidden` unless this session's role holds `capability`.
    pub fn require(&self, capability: Capability) -> Result<()> {
        access::require(self.role, capability)
    }
}

impl From<account_entity::Model> for Session {
    fn from(account: account_entity::Model) -> Self {
        Self {
            account_id: account.id,
            display_name: account.display_name,
            email: account.email,
            role: account.role,
            document_kind: account.document_kind,
            document: account.document,
        }
    }
}

/// Authenticates and records the account as the active session.
///
/// # Errors
/// Returns `AccountNotFound` / `InvalidPassword` from authentication, or a
/// database error if the session cannot be stored.
pub async fn login(db: &DatabaseConnection, email: &str, password: &str) -> Result<Session> {
    let account = account::authenticate(db, email, password).await?;
    set_current_account(db, &account.id).await?;
    info!(account_id = %account.id, role = %account.role, "Logged in");
    Ok(Session::from(account))
}

/// Clears the active session, if any.
pub async fn logout(db: &DatabaseConnection) -> Result<()> {
    let removed = SystemState::delete_many()
        .filter(system_state::Column::Key.eq(CURRENT_ACCOUNT_KEY))
        .exec(db)
        .await?;
    if removed.rows_affected > 0 {
        info!("Logged out");
    }
    Ok(())
}

/// Restores the active session.
///
/// Returns `None` when nobody is logged in or the stored account no longer exists.
pub async fn current_session(db: &DatabaseConnection) -> Result<Option<Session>> {
    let Some(state) = SystemState::find()
        .filter(system_state::Column::Key.eq(CURRENT_ACCOUNT_KEY))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let account = account::get_account_by_id(db, &state.value).await?;
    if account.is_none() {
        debug!(account_id = %state.value, "Stored session refers to a missing account");
    }
    Ok(account.map(Session::from))
}

async fn set_current_account<C>(db: &C, account_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now();

    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(CURRENT_ACCOUNT_KEY))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(account_id.to_string());
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_state = system_state::ActiveModel {
            key: Set(CURRENT_ACCOUNT_KEY.to_string()),
            value: Set(account_id.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(db).await?;
    }

    Ok(())
}
