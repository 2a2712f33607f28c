//! Credit business logic - Persisted submission, audit and listing of credits.
//!
//! The lifecycle decisions live in [`crate::core::lifecycle`]; this module loads
//! and stores the records around them. Every update to an existing credit is a
//! compare-and-update on its `version` column so that two writers working from
//! the same snapshot cannot both succeed.

use crate::{
    core::{
        access::Capability,
        lifecycle::{self, AuditOutcome, NewCredit},
        session::Session,
    },
    entities::{Credit, CreditStatus, credit},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, warn};

fn insert_model(record: &credit::Model) -> credit::ActiveModel {
    credit::ActiveModel {
        id: Set(record.id.clone()),
        owner_account_id: Set(record.owner_account_id.clone()),
        owner_display_name: Set(record.owner_display_name.clone()),
        quantity_tons: Set(record.quantity_tons),
        origin: Set(record.origin.clone()),
        generated_at: Set(record.generated_at),
        registered_at: Set(record.registered_at),
        status: Set(record.status),
        unit_price: Set(record.unit_price),
        audit_comment: Set(record.audit_comment.clone()),
        version: Set(record.version),
    }
}

/// Submits a new credit for audit on behalf of a producer.
///
/// # Errors
/// Returns the validation errors of [`lifecycle::submit_credit`] or a database error.
pub async fn submit_credit(
    db: &DatabaseConnection,
    owner: &Session,
    input: NewCredit,
) -> Result<credit::Model> {
    let record = lifecycle::submit_credit(owner, input, Utc::now())?;
    let saved = insert_model(&record).insert(db).await?;
    info!(
        credit_id = %saved.id,
        owner = %saved.owner_account_id,
        quantity_tons = saved.quantity_tons,
        "Credit submitted for audit"
    );
    Ok(saved)
}

/// Records an administrator's decision on a pending credit.
///
/// # Errors
/// `Forbidden` unless `auditor` is an admin, `CreditNotFound`, `AlreadyAudited`
/// if the credit was already decided, or `StaleRecord` if it changed concurrently.
pub async fn audit_credit(
    db: &DatabaseConnection,
    auditor: &Session,
    credit_id: &str,
    outcome: AuditOutcome,
    comment: Option<String>,
) -> Result<credit::Model> {
    auditor.require(Capability::AuditCredit)?;

    let txn = db.begin().await?;
    let record = Credit::find_by_id(credit_id.to_string())
        .one(&txn)
        .await?
        .ok_or_else(|| Error::CreditNotFound {
            id: credit_id.to_string(),
        })?;

    let updated = lifecycle::audit_credit(&record, outcome, comment)?;
    save_versioned(&txn, &updated, record.version).await?;
    txn.commit().await?;

    info!(
        credit_id = %updated.id,
        auditor = %auditor.account_id,
        status = %updated.status,
        "Credit audited"
    );
    Ok(updated)
}

/// Writes the mutable fields of `updated` if the stored version is still
/// `expected_version`.
///
/// # Errors
/// `StaleRecord` when no row matched the id and version.
pub async fn save_versioned<C>(db: &C, updated: &credit::Model, expected_version: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Credit::update_many()
        .set(credit::ActiveModel {
            quantity_tons: Set(updated.quantity_tons),
            status: Set(updated.status),
            audit_comment: Set(updated.audit_comment.clone()),
            version: Set(updated.version),
            ..Default::default()
        })
        .filter(credit::Column::Id.eq(updated.id.as_str()))
        .filter(credit::Column::Version.eq(expected_version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!(credit_id = %updated.id, expected_version, "Lost update race on credit");
        return Err(Error::StaleRecord {
            id: updated.id.clone(),
            expected_version,
        });
    }
    Ok(())
}

/// Finds a credit by id.
pub async fn get_credit_by_id(
    db: &DatabaseConnection,
    credit_id: &str,
) -> Result<Option<credit::Model>> {
    Credit::find_by_id(credit_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists a producer's credits, newest first.
pub async fn get_credits_by_owner(
    db: &DatabaseConnection,
    owner_account_id: &str,
) -> Result<Vec<credit::Model>> {
    Credit::find()
        .filter(credit::Column::OwnerAccountId.eq(owner_account_id))
        .order_by_desc(credit::Column::RegisteredAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists credits in one status, newest first.
pub async fn get_credits_by_status(
    db: &DatabaseConnection,
    status: CreditStatus,
) -> Result<Vec<credit::Model>> {
    Credit::find()
        .filter(credit::Column::Status.eq(status))
        .order_by_desc(credit::Column::RegisteredAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists credits open for purchase.
pub async fn get_approved_credits(db: &DatabaseConnection) -> Result<Vec<credit::Model>> {
    get_credits_by_status(db, CreditStatus::Approved).await
}

/// Lists credits waiting for audit.
pub async fn get_pending_credits(db: &DatabaseConnection) -> Result<Vec<credit::Model>> {
    get_credits_by_status(db, CreditStatus::Pending).await
}

/// Lists every credit, newest first.
pub async fn get_all_credits(db: &DatabaseConnection) -> Result<Vec<credit::Model>> {
    Credit::find()
        .order_by_desc(credit::Column::RegisteredAt)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::Role;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_submit_credit_validation_before_io() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let producer = test_session(Role::Producer);

        let mut input = test_new_credit(10.0, 50.0);
        input.quantity_tons = -5.0;
        let result = submit_credit(&db, &producer, input).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: -5.0 }
        ));

        let mut input = test_new_credit(10.0, 50.0);
        input.generated_at = Utc::now()
            .date_naive()
            .succ_opt()
            .unwrap();
        let result = submit_credit(&db, &producer, input).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::FutureGenerationDate { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_audit_requires_admin() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let producer = test_session(Role::Producer);

        let result = audit_credit(&db, &producer, "any", AuditOutcome::Approve, None).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_submit_credit_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let producer = create_test_producer(&db, "ana@example.com").await?;
        let session = Session::from(producer.clone());

        let credit = submit_credit(&db, &session, test_new_credit(10.0, 50.0)).await?;
        assert_eq!(credit.status, CreditStatus::Pending);
        assert_eq!(credit.owner_account_id, producer.id);

        let stored = get_credit_by_id(&db, &credit.id).await?.unwrap();
        assert_eq!(stored, credit);

        Ok(())
    }

    #[tokio::test]
    async fn test_audit_credit_integration() -> Result<()> {
        let (db, credit) = setup_with_pending_credit(100.0, 50.0).await?;
        let admin = create_test_admin(&db).await?;

        let approved = audit_credit(
            &db,
            &admin,
            &credit.id,
            AuditOutcome::Approve,
            Some("Documentation verified".to_string()),
        )
        .await?;
        assert_eq!(approved.status, CreditStatus::Approved);
        assert_eq!(approved.version, 1);

        let stored = get_credit_by_id(&db, &credit.id).await?.unwrap();
        assert_eq!(stored.status, CreditStatus::Approved);
        assert_eq!(stored.audit_comment.as_deref(), Some("Documentation verified"));

        Ok(())
    }

    #[tokio::test]
    async fn test_double_audit_is_rejected() -> Result<()> {
        let (db, credit) = setup_with_pending_credit(100.0, 50.0).await?;
        let admin = create_test_admin(&db).await?;

        audit_credit(&db, &admin, &credit.id, AuditOutcome::Approve, None).await?;
        let result = audit_credit(&db, &admin, &credit.id, AuditOutcome::Reject, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::AlreadyAudited {
                status: CreditStatus::Approved,
                ..
            }
        ));

        // The first decision stands
        let stored = get_credit_by_id(&db, &credit.id).await?.unwrap();
        assert_eq!(stored.status, CreditStatus::Approved);

        Ok(())
    }

    #[tokio::test]
    async fn test_audit_missing_credit() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db).await?;

        let result = audit_credit(&db, &admin, "missing", AuditOutcome::Approve, None).await;
        assert!(matches!(result.unwrap_err(), Error::CreditNotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_save_versioned_rejects_stale_write() -> Result<()> {
        let (db, credit) = setup_with_pending_credit(100.0, 50.0).await?;

        // Two writers decide from the same snapshot
        let approve = lifecycle::audit_credit(&credit, AuditOutcome::Approve, None)?;
        let reject = lifecycle::audit_credit(&credit, AuditOutcome::Reject, None)?;

        save_versioned(&db, &approve, credit.version).await?;
        let result = save_versioned(&db, &reject, credit.version).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::StaleRecord {
                expected_version: 0,
                ..
            }
        ));

        let stored = get_credit_by_id(&db, &credit.id).await?.unwrap();
        assert_eq!(stored.status, CreditStatus::Approved);
        assert_eq!(stored.version, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_credit_listings() -> Result<()> {
        let db = setup_test_db().await?;
        let producer = Session::from(create_test_producer(&db, "ana@example.com").await?);
        let other = Session::from(create_test_producer(&db, "bia@example.com").await?);
        let admin = create_test_admin(&db).await?;

        let first = submit_credit(&db, &producer, test_new_credit(10.0, 50.0)).await?;
        let second = submit_credit(&db, &producer, test_new_credit(20.0, 40.0)).await?;
        let third = submit_credit(&db, &other, test_new_credit(5.0, 60.0)).await?;
        audit_credit(&db, &admin, &first.id, AuditOutcome::Approve, None).await?;

        let mine = get_credits_by_owner(&db, &producer.account_id).await?;
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, second.id);
        assert_eq!(mine[1].id, first.id);

        let approved = get_approved_credits(&db).await?;
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, first.id);

        let pending = get_pending_credits(&db).await?;
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, third.id);

        assert_eq!(get_all_credits(&db).await?.len(), 3);

        Ok(())
    }
}
