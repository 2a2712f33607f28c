//! Credit entity - A lot of carbon-offset inventory with an approval lifecycle.
//!
//! Credits start `pending`, are approved or rejected once by an administrator,
//! and approved credits are sold down by trades. `quantity_tons` holds what is
//! still available; partial sales reduce it while the credit stays approved.
//! `version` is bumped by every persisted mutation and guards concurrent writers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a credit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum CreditStatus {
    /// Submitted, waiting for audit
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved by audit and open for trading
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected by audit - terminal
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Fully sold - terminal
    #[sea_orm(string_value = "sold")]
    Sold,
}

impl CreditStatus {
    /// Lowercase name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Sold => "sold",
        }
    }
}

impl fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credit database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credits")]
pub struct Model {
    /// UUID of the credit
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Producer account that submitted the credit
    pub owner_account_id: String,
    /// Producer display name at submission time
    pub owner_display_name: String,
    /// Tons still available
    pub quantity_tons: f64,
    /// Where the offset was generated (e.g., a forest reserve)
    pub origin: String,
    /// Date the offset was generated
    pub generated_at: Date,
    /// When the credit was submitted
    pub registered_at: DateTimeUtc,
    /// Lifecycle status
    pub status: CreditStatus,
    /// Price per ton in BRL
    pub unit_price: f64,
    /// Optional note left by the auditor
    pub audit_comment: Option<String>,
    /// Optimistic concurrency counter
    pub version: i32,
}

/// Defines relationships between Credit and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each credit belongs to one producer account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::OwnerAccountId",
        to = "super::account::Column::Id"
    )]
    Owner,
    /// One credit has many trades
    #[sea_orm(has_many = "super::trade::Entity")]
    Trades,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::trade::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trades.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
