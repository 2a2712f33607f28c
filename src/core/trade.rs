//! Trade business logic - Purchases and the public trade ledger.
//!
//! A purchase reads the credit, lets [`lifecycle::execute_trade`] decide the
//! outcome, then writes the updated credit and the new trade in one database
//! transaction. The credit write is version-checked, so a purchase computed from
//! a snapshot that another buyer already changed fails with `StaleRecord` and
//! leaves no trade behind.

use crate::{
    core::{
        access::Capability,
        credit::{get_credit_by_id, save_versioned},
        lifecycle::{self, TradeExecution},
        session::Session,
    },
    entities::{Trade, trade},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

fn insert_model(record: &trade::Model) -> trade::ActiveModel {
    trade::ActiveModel {
        id: Set(record.id.clone()),
        credit_id: Set(record.credit_id.clone()),
        seller_account_id: Set(record.seller_account_id.clone()),
        seller_display_name: Set(record.seller_display_name.clone()),
        buyer_account_id: Set(record.buyer_account_id.clone()),
        buyer_display_name: Set(record.buyer_display_name.clone()),
        quantity_tons: Set(record.quantity_tons),
        total_price: Set(record.total_price),
        executed_at: Set(record.executed_at),
    }
}

/// Buys `quantity_tons` from an approved credit.
///
/// # Errors
/// `Forbidden` unless `buyer` is a company, `CreditNotFound`, the trade errors of
/// [`lifecycle::execute_trade`], or `StaleRecord` on a concurrent purchase.
pub async fn purchase_credit(
    db: &DatabaseConnection,
    buyer: &Session,
    credit_id: &str,
    quantity_tons: f64,
) -> Result<TradeExecution> {
    buyer.require(Capability::PurchaseCredit)?;

    let record = get_credit_by_id(db, credit_id)
        .await?
        .ok_or_else(|| Error::CreditNotFound {
            id: credit_id.to_string(),
        })?;

    let execution = lifecycle::execute_trade(&record, buyer, quantity_tons, Utc::now())?;
    commit_trade(db, &execution, record.version).await?;
    Ok(execution)
}

/// Persists a trade decision made against credit version `expected_version`.
///
/// Either both the credit update and the trade insert land, or neither does.
pub async fn commit_trade(
    db: &DatabaseConnection,
    execution: &TradeExecution,
    expected_version: i32,
) -> Result<()> {
    let txn = db.begin().await?;
    save_versioned(&txn, &execution.credit, expected_version).await?;
    insert_model(&execution.trade).insert(&txn).await?;
    txn.commit().await?;

    info!(
        trade_id = %execution.trade.id,
        credit_id = %execution.trade.credit_id,
        buyer = %execution.trade.buyer_account_id,
        quantity_tons = execution.trade.quantity_tons,
        total_price = execution.trade.total_price,
        credit_status = %execution.credit.status,
        "Trade executed"
    );
    Ok(())
}

/// Lists every trade, newest first.
pub async fn get_all_trades(db: &DatabaseConnection) -> Result<Vec<trade::Model>> {
    Trade::find()
        .order_by_desc(trade::Column::ExecutedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists trades where the account was seller or buyer, newest first.
pub async fn get_trades_for_account(
    db: &DatabaseConnection,
    account_id: &str,
) -> Result<Vec<trade::Model>> {
    Trade::find()
        .filter(
            Condition::any()
                .add(trade::Column::SellerAccountId.eq(account_id))
                .add(trade::Column::BuyerAccountId.eq(account_id)),
        )
        .order_by_desc(trade::Column::ExecutedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists trades drawn from one credit, newest first.
pub async fn get_trades_for_credit(
    db: &DatabaseConnection,
    credit_id: &str,
) -> Result<Vec<trade::Model>> {
    Trade::find()
        .filter(trade::Column::CreditId.eq(credit_id))
        .order_by_desc(trade::Column::ExecutedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns true if `trade` matches a case-insensitive search term on seller
/// name, buyer name or trade id.
#[must_use]
pub fn trade_matches(trade: &trade::Model, term: &str) -> bool {
    let term = term.to_lowercase();
    [
        &trade.seller_display_name,
        &trade.buyer_display_name,
        &trade.id,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&term))
}

/// Public trade history filtered by `term`, newest first. An empty term matches all.
pub async fn search_trades(db: &DatabaseConnection, term: &str) -> Result<Vec<trade::Model>> {
    let trades = get_all_trades(db).await?;
    let term = term.trim();
    if term.is_empty() {
        return Ok(trades);
    }
    Ok(trades
        .into_iter()
        .filter(|t| trade_matches(t, term))
        .collect())
}
