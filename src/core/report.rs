//! Dashboard summaries and display formatting.
//!
//! This module computes the figures shown on each role's dashboard and on the
//! public trade history. Aggregation is split into pure `summarize_*` functions
//! over record slices and async `*_summary` wrappers that load the records.
//! All values stay full precision; the `format_*` helpers round to two
//! decimals for presentation only.

use crate::{
    core::{access::Capability, account, credit, session::Session, trade},
    entities::{CreditStatus, credit as credit_entity, trade as trade_entity},
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Figures for a producer's dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProducerSummary {
    /// Tons still offered in approved credits
    pub available_tons: f64,
    /// Tons recorded on credits that sold out
    pub sold_tons: f64,
    /// Credits waiting for audit
    pub pending_count: usize,
    /// Income from trades where the producer sold
    pub revenue: f64,
}

/// Figures for a company's dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanySummary {
    /// Tons bought; equals the company's carbon offset
    pub purchased_tons: f64,
    /// Total paid across purchases
    pub total_spent: f64,
    /// Number of purchases
    pub purchase_count: usize,
}

/// Figures for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminSummary {
    /// Credits waiting for audit
    pub pending_count: usize,
    /// Credits open for trading
    pub approved_count: usize,
    /// Sum of `quantity_tons` over every credit
    pub total_volume: f64,
    /// Trades executed on the platform
    pub trade_count: usize,
    /// Registered accounts
    pub account_count: usize,
}

/// Figures for the public trade history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSummary {
    /// Trades executed
    pub trade_count: usize,
    /// Tons traded
    pub total_volume: f64,
    /// BRL traded
    pub total_value: f64,
    /// `total_value / total_volume`, or 0 with no volume
    pub average_price: f64,
}

/// Aggregates a producer's own credits and trades.
#[must_use]
pub fn summarize_producer(
    account_id: &str,
    credits: &[credit_entity::Model],
    trades: &[trade_entity::Model],
) -> ProducerSummary {
    let mut summary = ProducerSummary::default();
    for c in credits.iter().filter(|c| c.owner_account_id == account_id) {
        match c.status {
            CreditStatus::Approved => summary.available_tons += c.quantity_tons,
            CreditStatus::Sold => summary.sold_tons += c.quantity_tons,
            CreditStatus::Pending => summary.pending_count += 1,
            CreditStatus::Rejected => {}
        }
    }
    summary.revenue = trades
        .iter()
        .filter(|t| t.seller_account_id == account_id)
        .map(|t| t.total_price)
        .sum();
    summary
}

/// Aggregates a company's purchases.
#[must_use]
pub fn summarize_company(account_id: &str, trades: &[trade_entity::Model]) -> CompanySummary {
    trades
        .iter()
        .filter(|t| t.buyer_account_id == account_id)
        .fold(CompanySummary::default(), |mut acc, t| {
            acc.purchased_tons += t.quantity_tons;
            acc.total_spent += t.total_price;
            acc.purchase_count += 1;
            acc
        })
}

/// Aggregates the whole platform for administrators.
#[must_use]
pub fn summarize_admin(
    credits: &[credit_entity::Model],
    trade_count: usize,
    account_count: usize,
) -> AdminSummary {
    AdminSummary {
        pending_count: credits
            .iter()
            .filter(|c| c.status == CreditStatus::Pending)
            .count(),
        approved_count: credits
            .iter()
            .filter(|c| c.status == CreditStatus::Approved)
            .count(),
        total_volume: credits.iter().map(|c| c.quantity_tons).sum(),
        trade_count,
        account_count,
    }
}

/// Aggregates the public trade history.
#[must_use]
pub fn summarize_market(trades: &[trade_entity::Model]) -> MarketSummary {
    let total_volume: f64 = trades.iter().map(|t| t.quantity_tons).sum();
    let total_value: f64 = trades.iter().map(|t| t.total_price).sum();
    let average_price = if total_volume > 0.0 {
        total_value / total_volume
    } else {
        0.0
    };
    MarketSummary {
        trade_count: trades.len(),
        total_volume,
        total_value,
        average_price,
    }
}

/// Loads the producer dashboard for the session's account.
pub async fn producer_summary(
    db: &DatabaseConnection,
    session: &Session,
) -> Result<ProducerSummary> {
    session.require(Capability::ProducerDashboard)?;
    let credits = credit::get_credits_by_owner(db, &session.account_id).await?;
    let trades = trade::get_trades_for_account(db, &session.account_id).await?;
    Ok(summarize_producer(&session.account_id, &credits, &trades))
}

/// Loads the company dashboard for the session's account.
pub async fn company_summary(db: &DatabaseConnection, session: &Session) -> Result<CompanySummary> {
    session.require(Capability::CompanyDashboard)?;
    let trades = trade::get_trades_for_account(db, &session.account_id).await?;
    Ok(summarize_company(&session.account_id, &trades))
}

/// Loads the admin dashboard.
pub async fn admin_summary(db: &DatabaseConnection, session: &Session) -> Result<AdminSummary> {
    session.require(Capability::AdminDashboard)?;
    let credits = credit::get_all_credits(db).await?;
    let trades = trade::get_all_trades(db).await?;
    let accounts = account::list_accounts(db).await?;
    Ok(summarize_admin(&credits, trades.len(), accounts.len()))
}

/// Loads the public market summary. No session needed.
pub async fn market_summary(db: &DatabaseConnection) -> Result<MarketSummary> {
    let trades = trade::get_all_trades(db).await?;
    Ok(summarize_market(&trades))
}

/// Formats tons with two decimals, e.g. `"12.50 t"`.
#[must_use]
pub fn format_tons(tons: f64) -> String {
    format!("{tons:.2} t")
}

/// Formats a BRL amount with two decimals, e.g. `"R$ 12.50"`.
#[must_use]
pub fn format_brl(amount: f64) -> String {
    format!("R$ {amount:.2}")
}

/// Price per ton actually paid in a trade.
#[must_use]
pub fn unit_price_of(trade: &trade_entity::Model) -> f64 {
    if trade.quantity_tons > 0.0 {
        trade.total_price / trade.quantity_tons
    } else {
        0.0
    }
}

/// One-line summary of a trade for listings.
#[must_use]
pub fn format_trade_summary(trade: &trade_entity::Model) -> String {
    format!(
        "{} | {} → {} | {} @ {}/t = {}",
        trade.executed_at.format("%Y-%m-%d %H:%M"),
        trade.seller_display_name,
        trade.buyer_display_name,
        format_tons(trade.quantity_tons),
        format_brl(unit_price_of(trade)),
        format_brl(trade.total_price),
    )
}

/// One-line summary of a credit for listings.
#[must_use]
pub fn format_credit_summary(credit: &credit_entity::Model) -> String {
    let mut line = format!(
        "{} | {} | {} | {} @ {}/t | {} | generated {}",
        credit.id,
        credit.status,
        credit.owner_display_name,
        format_tons(credit.quantity_tons),
        format_brl(credit.unit_price),
        credit.origin,
        credit.generated_at.format("%d/%m/%Y"),
    );
    if let Some(comment) = &credit.audit_comment {
        line.push_str(&format!(" | audit: {comment}"));
    }
    line
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::lifecycle::AuditOutcome;
    use crate::entities::Role;
    use crate::errors::Error;
    use crate::test_utils::*;
    use chrono::{TimeZone, Utc};

    fn trade(seller: &str, buyer: &str, quantity_tons: f64, total_price: f64) -> trade_entity::Model {
        trade_entity::Model {
            id: format!("{seller}-{buyer}-{quantity_tons}"),
            credit_id: "credit".to_string(),
            seller_account_id: seller.to_string(),
            seller_display_name: seller.to_string(),
            buyer_account_id: buyer.to_string(),
            buyer_display_name: buyer.to_string(),
            quantity_tons,
            total_price,
            executed_at: Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_summarize_market() {
        let trades = vec![trade("p", "c", 10.0, 500.0), trade("p", "d", 30.0, 1100.0)];
        let summary = summarize_market(&trades);
        assert_eq!(summary.trade_count, 2);
        assert_eq!(summary.total_volume, 40.0);
        assert_eq!(summary.total_value, 1600.0);
        assert_eq!(summary.average_price, 40.0);
    }

    #[test]
    fn test_summarize_market_empty() {
        let summary = summarize_market(&[]);
        assert_eq!(summary, MarketSummary::default());
    }

    #[test]
    fn test_summarize_company_counts_only_purchases() {
        let trades = vec![
            trade("p", "c", 10.0, 500.0),
            trade("p", "c", 2.5, 125.0),
            trade("p", "other", 99.0, 1.0),
        ];
        let summary = summarize_company("c", &trades);
        assert_eq!(summary.purchased_tons, 12.5);
        assert_eq!(summary.total_spent, 625.0);
        assert_eq!(summary.purchase_count, 2);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_tons(12.5), "12.50 t");
        assert_eq!(format_brl(1234.567), "R$ 1234.57");
        assert_eq!(format_brl(0.0), "R$ 0.00");

        let t = trade("Fazenda", "Acme", 4.0, 210.0);
        assert_eq!(unit_price_of(&t), 52.5);
        assert_eq!(
            format_trade_summary(&t),
            "2024-06-15 09:30 | Fazenda → Acme | 4.00 t @ R$ 52.50/t = R$ 210.00"
        );
    }

    #[tokio::test]
    async fn test_dashboards_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let producer = Session::from(create_test_producer(&db, "ana@example.com").await?);
        let company = Session::from(create_test_company(&db, "corp@example.com").await?);
        let admin = create_test_admin(&db).await?;

        let sold_out = credit::submit_credit(&db, &producer, test_new_credit(10.0, 50.0)).await?;
        let partial = credit::submit_credit(&db, &producer, test_new_credit(100.0, 20.0)).await?;
        let rejected = credit::submit_credit(&db, &producer, test_new_credit(7.0, 30.0)).await?;
        credit::submit_credit(&db, &producer, test_new_credit(3.0, 30.0)).await?;

        for id in [&sold_out.id, &partial.id] {
            credit::audit_credit(&db, &admin, id, AuditOutcome::Approve, None).await?;
        }
        credit::audit_credit(&db, &admin, &rejected.id, AuditOutcome::Reject, None).await?;

        trade::purchase_credit(&db, &company, &sold_out.id, 10.0).await?;
        trade::purchase_credit(&db, &company, &partial.id, 25.0).await?;

        let p = producer_summary(&db, &producer).await?;
        assert_eq!(p.available_tons, 75.0);
        assert_eq!(p.sold_tons, 10.0);
        assert_eq!(p.pending_count, 1);
        assert_eq!(p.revenue, 1000.0);

        let c = company_summary(&db, &company).await?;
        assert_eq!(c.purchased_tons, 35.0);
        assert_eq!(c.total_spent, 1000.0);
        assert_eq!(c.purchase_count, 2);

        let a = admin_summary(&db, &admin).await?;
        assert_eq!(a.pending_count, 1);
        assert_eq!(a.approved_count, 1);
        assert_eq!(a.total_volume, 10.0 + 75.0 + 7.0 + 3.0);
        assert_eq!(a.trade_count, 2);
        assert_eq!(a.account_count, 3);

        let m = market_summary(&db).await?;
        assert_eq!(m.total_volume, 35.0);
        assert_eq!(m.total_value, 1000.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_dashboards_are_role_gated() -> Result<()> {
        let db = setup_test_db().await?;
        let company = test_session(Role::Company);

        let result = producer_summary(&db, &company).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));
        let result = admin_summary(&db, &company).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));

        Ok(())
    }
}
