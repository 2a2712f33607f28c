//! Credit lifecycle rules.
//!
//! Pure functions deciding how a credit moves between states and how a trade
//! splits it. Nothing here touches storage: callers pass the acting session and
//! the current time, and receive the records to persist.
//!
//! ```text
//!   Pending → Approved → Sold
//!      ↓
//!   Rejected
//!
//!   Terminal states: Rejected, Sold
//! ```
//!
//! A partial trade leaves the credit `Approved` with fewer tons; a trade for all
//! remaining tons moves it to `Sold`.

use crate::{
    core::{access::Capability, session::Session},
    entities::{CreditStatus, credit, trade},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;
use uuid::Uuid;

impl CreditStatus {
    /// Returns true if no transition leaves this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Sold)
    }

    /// Returns the set of states reachable from this state.
    #[must_use]
    pub const fn valid_transitions(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Sold],
            Self::Rejected | Self::Sold => &[],
        }
    }

    /// Check if transitioning to `next` is valid.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.valid_transitions().contains(&next)
    }
}

/// Decision an auditor makes on a pending credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    /// Open the credit for trading
    Approve,
    /// Refuse the credit
    Reject,
}

impl AuditOutcome {
    /// Status the credit takes after this decision.
    #[must_use]
    pub const fn status(self) -> CreditStatus {
        match self {
            Self::Approve => CreditStatus::Approved,
            Self::Reject => CreditStatus::Rejected,
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => f.write_str("approve"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// Producer input for a new credit.
#[derive(Debug, Clone)]
pub struct NewCredit {
    /// Tons of CO2 offset
    pub quantity_tons: f64,
    /// Where the offset was generated
    pub origin: String,
    /// Date the offset was generated
    pub generated_at: NaiveDate,
    /// Asking price per ton in BRL
    pub unit_price: f64,
}

/// Result of a trade: the ledger entry and the credit as it stands afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeExecution {
    /// New immutable trade record
    pub trade: trade::Model,
    /// Credit with reduced quantity or `Sold` status
    pub credit: credit::Model,
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Checks the numeric and date preconditions of a submission.
pub fn validate_submission(input: &NewCredit, today: NaiveDate) -> Result<()> {
    if !is_positive(input.quantity_tons) {
        return Err(Error::InvalidQuantity {
            quantity: input.quantity_tons,
        });
    }
    if !is_positive(input.unit_price) {
        return Err(Error::InvalidPrice {
            price: input.unit_price,
        });
    }
    if input.generated_at > today {
        return Err(Error::FutureGenerationDate {
            date: input.generated_at,
        });
    }
    if input.origin.trim().is_empty() {
        return Err(Error::MissingField { field: "origin" });
    }
    Ok(())
}

/// Builds a new `Pending` credit owned by `owner`.
///
/// # Errors
/// `Forbidden` unless `owner` is a producer; `InvalidQuantity`, `InvalidPrice`,
/// `FutureGenerationDate` or `MissingField` when the input is out of range.
pub fn submit_credit(
    owner: &Session,
    input: NewCredit,
    now: DateTime<Utc>,
) -> Result<credit::Model> {
    owner.require(Capability::SubmitCredit)?;
    validate_submission(&input, now.date_naive())?;

    Ok(credit::Model {
        id: Uuid::new_v4().to_string(),
        owner_account_id: owner.account_id.clone(),
        owner_display_name: owner.display_name.clone(),
        quantity_tons: input.quantity_tons,
        origin: input.origin.trim().to_string(),
        generated_at: input.generated_at,
        registered_at: now,
        status: CreditStatus::Pending,
        unit_price: input.unit_price,
        audit_comment: None,
        version: 0,
    })
}

/// Applies an audit decision to a pending credit.
///
/// Blank comments are stored as `None`. Re-auditing is refused: a credit that
/// already has a decision keeps it.
///
/// # Errors
/// `AlreadyAudited` if the credit is not `Pending`.
pub fn audit_credit(
    record: &credit::Model,
    outcome: AuditOutcome,
    comment: Option<String>,
) -> Result<credit::Model> {
    let next = outcome.status();
    if !record.status.can_transition_to(next) {
        return Err(Error::AlreadyAudited {
            id: record.id.clone(),
            status: record.status,
        });
    }

    let mut updated = record.clone();
    updated.status = next;
    updated.audit_comment = comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    updated.version += 1;
    Ok(updated)
}

/// Executes a purchase of `requested` tons from an approved credit.
///
/// Buying everything that is left marks the credit `Sold` and leaves its
/// quantity as the last amount sold; buying less keeps it `Approved` with the
/// remainder.
///
/// # Errors
/// `Forbidden` unless `buyer` is a company; `InvalidQuantity` for a non-finite
/// or non-positive request; `ExceedsAvailable` when more than the remaining tons
/// are requested; `NotTradable` if the credit is not `Approved`.
#[allow(clippy::float_cmp)]
pub fn execute_trade(
    record: &credit::Model,
    buyer: &Session,
    requested: f64,
    now: DateTime<Utc>,
) -> Result<TradeExecution> {
    buyer.require(Capability::PurchaseCredit)?;

    if record.status != CreditStatus::Approved {
        error!(
            credit_id = %record.id,
            status = %record.status,
            "Trade attempted on a credit that is not approved"
        );
        return Err(Error::NotTradable {
            id: record.id.clone(),
            status: record.status,
        });
    }
    if !is_positive(requested) {
        return Err(Error::InvalidQuantity {
            quantity: requested,
        });
    }
    if requested > record.quantity_tons {
        return Err(Error::ExceedsAvailable {
            requested,
            available: record.quantity_tons,
        });
    }

    let trade = trade::Model {
        id: Uuid::new_v4().to_string(),
        credit_id: record.id.clone(),
        seller_account_id: record.owner_account_id.clone(),
        seller_display_name: record.owner_display_name.clone(),
        buyer_account_id: buyer.account_id.clone(),
        buyer_display_name: buyer.display_name.clone(),
        quantity_tons: requested,
        total_price: requested * record.unit_price,
        executed_at: now,
    };

    let mut credit = record.clone();
    if requested == record.quantity_tons {
        credit.status = CreditStatus::Sold;
    } else {
        credit.quantity_tons = record.quantity_tons - requested;
    }
    credit.version += 1;

    Ok(TradeExecution { trade, credit })
}
