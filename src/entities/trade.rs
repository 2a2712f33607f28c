//! Trade entity - Immutable ledger entry for one executed purchase.
//!
//! Each trade records the credit it drew from, both parties (by id and by the
//! display name they had at the time), the quantity bought and the total price.
//! Trades are only ever inserted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Trade database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trades")]
pub struct Model {
    /// UUID of the trade
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Credit the tons were bought from
    pub credit_id: String,
    /// Producer who owned the credit
    pub seller_account_id: String,
    /// Seller display name at trade time
    pub seller_display_name: String,
    /// Company that bought
    pub buyer_account_id: String,
    /// Buyer display name at trade time
    pub buyer_display_name: String,
    /// Tons bought
    pub quantity_tons: f64,
    /// `quantity_tons` times the credit's unit price
    pub total_price: f64,
    /// When the trade executed
    pub executed_at: DateTimeUtc,
}

/// Defines relationships between Trade and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each trade belongs to one credit
    #[sea_orm(
        belongs_to = "super::credit::Entity",
        from = "Column::CreditId",
        to = "super::credit::Column::Id"
    )]
    Credit,
}

impl Related<super::credit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Credit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
